//! ID types for stored players.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage identity of a statistics row.
///
/// Assigned by the persistence layer when a `(player, club, season)` row is
/// first inserted and kept stable across upserts, so valuations can reference
/// it instead of a scraped name.
///
/// # Examples
///
/// ```rust
/// use pl_collector::PlayerKey;
///
/// let key = PlayerKey::new(42);
/// assert_eq!(key.as_i64(), 42);
/// assert_eq!(key.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerKey(pub i64);

impl PlayerKey {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
