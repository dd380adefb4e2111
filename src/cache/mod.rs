//! Cache module for storing enriched suggestions in memory
//!
//! This module provides the [`SuggestionCache`] interface the request path and
//! the maintenance task share, an in-memory implementation with per-entry
//! expiry, and the periodic size check that flushes the cache when it grows
//! past its budget.

mod maintenance;
mod store;

pub use maintenance::{run_maintenance, MaintenanceConfig, MaintenanceHandle, MaintenanceOutcome};
pub use store::{CacheStats, MemoryCache, SuggestionCache};
