//! Core utilities for the collector
//!
//! This module consolidates the source-agnostic plumbing used across the
//! application:
//! - `cache`: file helpers and the in-memory LRU cache
//! - `http`: the resilient fetch client
//! - `text`: name and club normalization shared by parsers and the reconciler

pub mod cache;
pub mod http;
pub mod text;

// Re-export commonly used items for convenience
pub use cache::{try_read_to_string, write_string, MemoryCache};
pub use http::{AttemptOutcome, FetchAttempt, FetchClient, HtmlDocument};
