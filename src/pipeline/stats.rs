//! Counters for a lookup run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters, updated concurrently by in-flight records
#[derive(Debug, Default)]
pub struct LookupStats {
    processed: AtomicU64,
    failed: AtomicU64,
    augmented: AtomicU64,
    inserted: AtomicU64,
    suppressed: AtomicU64,
}

impl LookupStats {
    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_merge(&self, inserted: usize, suppressed: usize) {
        if inserted > 0 {
            self.augmented.fetch_add(1, Ordering::Relaxed);
        }
        self.inserted.fetch_add(inserted as u64, Ordering::Relaxed);
        self.suppressed.fetch_add(suppressed as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            augmented: self.augmented.load(Ordering::Relaxed),
            inserted: self.inserted.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LookupStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Records enriched successfully
    pub processed: u64,
    /// Records whose resolver lookup failed or timed out
    pub failed: u64,
    /// Records that gained at least one postal city
    pub augmented: u64,
    /// Postal cities added to hierarchies
    pub inserted: u64,
    /// Postal cities dropped as duplicates
    pub suppressed: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} failed, {} augmented with postal cities ({} inserted, {} suppressed)",
            self.processed, self.failed, self.augmented, self.inserted, self.suppressed
        )
    }
}
