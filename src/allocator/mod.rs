//! The proxy's adaptive cache-allocation engine (spec §4.1).
//!
//! [`Allocator`] tracks per-key popularity and periodically recomputes
//! a budget-constrained recipe `c: K -> [0, k+m]` via a max-priority
//! queue over marginal utility, mirroring the reader/writer split the
//! teacher uses for its model registries ([`crate::model`] in the
//! upstream crate this one was built from): popularity and recipe
//! reads take the fast, lock-free/read-locked path; reallocation
//! recomputes a full snapshot and swaps it in.

mod gain;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use dashmap::DashMap;

use crate::error::{PrefixCacheError, Result};
use crate::types::ErasureParams;
use gain::gain;

/// Allocator configuration (spec §6: `allocator.interval_ms`, `allocator.decay`).
#[derive(Debug, Clone, Copy)]
pub struct AllocatorConfig {
    /// Total cache-block budget B. `Σ c(K) <= budget` after every reallocation.
    pub budget: u32,
    /// Exponential decay α ∈ (0, 1] applied to popularity on each access:
    /// `w ← α·w + 1`. `1.0` (the default) is a plain running count.
    pub decay: f64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            budget: 0,
            decay: 1.0,
        }
    }
}

/// One entry in the allocation priority queue: the next unassigned
/// slot `slot` for `key`, with its marginal utility `u` already
/// computed (`w(key) * gain(slot)`).
#[derive(Debug, Clone)]
struct Candidate {
    u: f64,
    key: String,
    w: f64,
    slot: u16,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    /// Orders by utility ascending (so `BinaryHeap`, a max-heap, pops
    /// the largest `u` first); ties break on key, lexicographically
    /// smallest first, per spec §4.1 ("tie-break on u by key
    /// lexicographic order so allocation is deterministic for tests").
    fn cmp(&self, other: &Self) -> Ordering {
        self.u
            .total_cmp(&other.u)
            .then_with(|| other.key.cmp(&self.key))
    }
}

/// Proxy-side popularity tracker and budget-constrained recipe assigner.
pub struct Allocator {
    popularity: DashMap<String, f64>,
    recipes: RwLock<HashMap<String, u16>>,
    params: ErasureParams,
    config: AllocatorConfig,
}

impl Allocator {
    pub fn new(params: ErasureParams, config: AllocatorConfig) -> Self {
        Self {
            popularity: DashMap::new(),
            recipes: RwLock::new(HashMap::new()),
            params,
            config,
        }
    }

    /// Record an access to `key`, updating its popularity weight.
    /// O(1) expected, lock-free (backed by `DashMap`'s sharded locking).
    pub fn on_access(&self, key: &str) {
        let alpha = self.config.decay;
        self.popularity
            .entry(key.to_string())
            .and_modify(|w| *w = alpha * *w + 1.0)
            .or_insert(1.0);
    }

    /// Current assigned recipe for `key`, or 0 if never seen or not
    /// yet covered by a reallocation. Non-blocking (read lock only).
    pub fn recipe_of(&self, key: &str) -> u16 {
        self.recipes
            .read()
            .expect("recipe table lock poisoned")
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// `Σ c(K)` over all known keys as of the last reallocation. Used
    /// only to report the `prefixcache_cache_budget_assigned` gauge.
    pub fn total_assigned(&self) -> u64 {
        self.recipes
            .read()
            .expect("recipe table lock poisoned")
            .values()
            .map(|&c| c as u64)
            .sum()
    }

    /// Recompute `c(·)` for all known keys from current popularities,
    /// greedily filling the budget via a max-priority queue over
    /// marginal utility (spec §4.1). Expensive; intended to run off
    /// the request path on a fixed interval.
    pub fn reallocate(&self) -> Result<()> {
        if self.config.budget == 0 {
            *self.recipes.write().expect("recipe table lock poisoned") = HashMap::new();
            return Ok(());
        }

        let total_blocks = self.params.total_blocks();
        if total_blocks == 0 {
            return Err(PrefixCacheError::InvalidErasureParams {
                k: self.params.k(),
                m: self.params.m(),
            });
        }

        let mut heap = std::collections::BinaryHeap::new();
        for entry in self.popularity.iter() {
            let key = entry.key().clone();
            let w = *entry.value();
            heap.push(Candidate {
                u: w * gain(0, self.params),
                key,
                w,
                slot: 0,
            });
        }

        let mut assigned: HashMap<String, u16> = HashMap::new();
        let mut remaining = self.config.budget;
        while remaining > 0 {
            let Some(candidate) = heap.pop() else {
                break;
            };
            assigned.insert(candidate.key.clone(), candidate.slot + 1);
            remaining -= 1;

            let next_slot = candidate.slot + 1;
            if next_slot < total_blocks {
                heap.push(Candidate {
                    u: candidate.w * gain(next_slot, self.params),
                    key: candidate.key,
                    w: candidate.w,
                    slot: next_slot,
                });
            }
        }

        *self.recipes.write().expect("recipe table lock poisoned") = assigned;
        Ok(())
    }
}
