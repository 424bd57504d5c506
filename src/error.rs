//! Error types for the Premier League collector

use std::fmt;

use thiserror::Error;


pub type Result<T> = std::result::Result<T, CollectorError>;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("System time error: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),

    #[error("Failed to parse number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid season '{input}' (expected e.g. 2024-2025)")]
    InvalidSeason { input: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl From<anyhow::Error> for CollectorError {
    fn from(err: anyhow::Error) -> Self {
        CollectorError::Storage {
            message: format!("{err:#}"),
        }
    }
}

/// Classification of a failed HTTP round trip.
///
/// `RateLimited`, `ServerError` and `NetworkError` are retryable. Once the
/// retry budget is spent, the client reports `Fatal`, as it does for any
/// response that retrying cannot fix (other 4xx, undecodable bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    RateLimited,
    ServerError,
    NetworkError,
    Fatal,
}

impl FetchErrorKind {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchErrorKind::Fatal)
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorKind::RateLimited => "rate limited",
            FetchErrorKind::ServerError => "server error",
            FetchErrorKind::NetworkError => "network error",
            FetchErrorKind::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Failure of one `fetch` call, after any retries.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} fetching {url} after {attempts} attempt(s): {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub attempts: u32,
    /// Last HTTP status observed, if any response arrived.
    pub status: Option<u16>,
    /// Last retryable kind seen before the budget ran out.
    pub last_retryable: Option<FetchErrorKind>,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Could not locate the {expected} table")]
    MissingTable { expected: String },

    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Commit failed for {batch}: {message}")]
    CommitFailed { batch: String, message: String },
}
