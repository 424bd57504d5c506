//! Helpers shared by the collect and show commands.

use std::path::PathBuf;

use tracing::debug;

use crate::{config::resolve_database_path, storage::PlayerDatabase, Result};

/// Open the store at `--db`, `PL_COLLECTOR_DB` or the platform data directory.
pub fn open_database(explicit: Option<PathBuf>) -> Result<PlayerDatabase> {
    let path = resolve_database_path(explicit)?;
    debug!(path = %path.display(), "opening database");
    Ok(PlayerDatabase::open(&path)?)
}

/// File-name-safe form of a lookup key: `Brighton & Hove` → `brighton_hove`.
pub fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "all".to_string()
    } else {
        trimmed.to_string()
    }
}
