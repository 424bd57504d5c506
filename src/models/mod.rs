//! Domain records produced by the source parsers.
//!
//! These types carry no persistence or HTTP concerns; the storage layer maps
//! them to rows and the collector moves them between stages.

pub mod player;
pub mod valuation;

pub use player::{Metric, PlayerStatRecord, StatMetrics};
pub use valuation::{MarketValue, ValuationCandidate, ValuationLookupResult};
