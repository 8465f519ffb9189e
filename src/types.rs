//! Core data types shared across the allocator, proxy, and read engine.
//!
//! See spec §3 (Data Model). Object keys are plain `String`s — the spec
//! treats K as an opaque, non-empty string, so no newtype wrapper is
//! introduced; the one place keys are transformed (derivation of a
//! per-block store key) is the free function [`block_key`] below,
//! which is the sole call site constructing a store key anywhere in
//! this crate.

use bytes::Bytes;

/// Erasure coding parameters, fixed process-wide and shared by proxy
/// and client. `k` is the number of data blocks needed to reconstruct
/// an object; `m` is the number of additional parity blocks. Any `k`
/// of the `k + m` blocks suffice to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErasureParams {
    k: u16,
    m: u16,
}

impl ErasureParams {
    /// Validate and construct erasure parameters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PrefixCacheError::InvalidErasureParams`] if
    /// `k >= 256` or `m > 256 - k`.
    pub fn new(k: u16, m: u16) -> crate::error::Result<Self> {
        if k >= 256 || m > 256u16.saturating_sub(k) {
            return Err(crate::error::PrefixCacheError::InvalidErasureParams { k, m });
        }
        Ok(Self { k, m })
    }

    /// Number of data blocks required to decode.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Number of parity blocks.
    pub fn m(&self) -> u16 {
        self.m
    }

    /// Total blocks per object (`k + m`).
    pub fn total_blocks(&self) -> u16 {
        self.k + self.m
    }
}

/// Derive the store key for block `index` of object `key`.
///
/// Concatenation with no delimiter, per spec §3/§6: `K ∥ decimal(i)`.
/// `K` must not end in a digit (a configuration invariant owned by the
/// deployer, not checked here). This is the only function in the crate
/// that constructs a cache/backend store key from an object key — the
/// repair path and the fetch path both call through here so a cache
/// write can never target the bare object key by accident (spec §9,
/// Open Question (b)).
pub fn block_key(key: &str, index: u16) -> String {
    let mut s = String::with_capacity(key.len() + 3);
    s.push_str(key);
    s.push_str(&index.to_string());
    s
}

/// Which store a block was ultimately read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOrigin {
    Cache,
    Backend,
}

/// A successfully-fetched block, transient for the duration of one read.
#[derive(Debug, Clone)]
pub struct BlockEnvelope {
    pub index: u16,
    pub bytes: Bytes,
    pub origin: BlockOrigin,
}

/// Outcome classification for one completed `read()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Hit,
    PartialHit,
    Miss,
}
