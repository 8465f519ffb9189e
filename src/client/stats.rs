//! Process-global read counters (spec §5, §9).
//!
//! The three counters are specified as process-global atomics; in a
//! language without ambient globals, inject a stats handle through the
//! client constructor instead — the same pattern the teacher uses for
//! its injected metrics/telemetry collaborators rather than reaching
//! for a `static`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::ReadOutcome;

/// Read-outcome counters, shared (via `Arc`) across every `read()`
/// call issued by one [`crate::client::ReadEngine`].
#[derive(Debug, Default)]
pub struct Stats {
    cache_hits: AtomicU64,
    cache_partial_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl Stats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, outcome: ReadOutcome) {
        match outcome {
            ReadOutcome::Hit => self.cache_hits.fetch_add(1, Ordering::Relaxed),
            ReadOutcome::PartialHit => self.cache_partial_hits.fetch_add(1, Ordering::Relaxed),
            ReadOutcome::Miss => self.cache_misses.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_partial_hits(&self) -> u64 {
        self.cache_partial_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// `hit + partial_hit + miss`, the total completed reads.
    pub fn total(&self) -> u64 {
        self.cache_hits() + self.cache_partial_hits() + self.cache_misses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_exactly_one_outcome_per_call() {
        let stats = Stats::new();
        stats.record(ReadOutcome::Hit);
        stats.record(ReadOutcome::PartialHit);
        stats.record(ReadOutcome::Miss);
        stats.record(ReadOutcome::Miss);

        assert_eq!(stats.cache_hits(), 1);
        assert_eq!(stats.cache_partial_hits(), 1);
        assert_eq!(stats.cache_misses(), 2);
        assert_eq!(stats.total(), 4);
    }
}
