//! Cache and backend store traits.
//!
//! The cache store and the backend object store are both out-of-scope
//! collaborators (spec §2 Non-goals) — this crate only defines the
//! seams it reads and writes through, mirroring the provider-trait
//! split the teacher uses for capability-specific backends rather than
//! one god trait.

mod backend;
mod memory_cache;

pub use backend::{HttpBackendStore, MemoryBackendStore};
pub use memory_cache::MemoryCacheStore;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A cache of erasure-coded blocks, addressed by the block's derived
/// store key ([`crate::types::block_key`]). Implementations are
/// expected to be cheap to clone/share (e.g. an `Arc`-wrapped
/// concurrent map) and to evict independently of this crate — a
/// `get` miss is a normal, frequent outcome, not an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a cached block. Returns `Ok(None)` on a clean miss.
    async fn get(&self, store_key: &str) -> Result<Option<Bytes>>;

    /// Write (or overwrite) a cached block.
    async fn put(&self, store_key: &str, bytes: Bytes) -> Result<()>;

    /// Remove a cached block, if present. Used when the allocator
    /// shrinks a key's recipe and evicts the blocks past the new
    /// prefix count.
    async fn remove(&self, store_key: &str) -> Result<()>;
}

/// The durable, geo-distributed backend object store that always has
/// every block of every object (spec §3: the backend never loses
/// data; only the cache is a partial, evictable view).
#[async_trait]
pub trait BackendStore: Send + Sync {
    /// Fetch a block. A backend read failing is a transient condition
    /// from the read engine's point of view — one less source toward
    /// quorum, not necessarily a fatal error — so callers should wrap
    /// non-transient errors as [`crate::error::PrefixCacheError::TransientStore`].
    async fn get(&self, store_key: &str) -> Result<Bytes>;
}
