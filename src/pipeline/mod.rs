//! Per-record lookup stage.
//!
//! Resolves each record's centroid, merges postal cities for its ZIP and
//! writes the resulting hierarchy back onto the record.

mod stage;
mod stats;

pub use stage::AdminLookup;
pub use stats::{LookupStats, StatsSnapshot};
