//! Storage layer for collected player data
//!
//! SQLite through `rusqlite`, organized into:
//! - `models`: row types handed to and from the database
//! - `schema`: connection setup and table definitions
//! - `queries`: upserts and the read contract

pub mod models;
pub mod queries;
pub mod schema;


pub use models::*;
pub use schema::PlayerDatabase;
