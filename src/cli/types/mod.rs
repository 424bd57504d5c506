//! Type-safe wrappers for season and player identifiers.

pub mod ids;
pub mod time;

pub use ids::PlayerKey;
pub use time::Season;
