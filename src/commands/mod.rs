//! Command implementations for the collector CLI

pub mod collect;
pub mod common;
pub mod show;
