//! In-process cache store, the default [`super::CacheStore`].

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::Result;

/// Unbounded in-memory cache keyed by store key. Used by default and
/// in tests; production deployments are expected to swap in a real
/// distributed cache behind the same trait (spec §2 treats the cache
/// store's own design as out-of-scope).
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    blocks: DashMap<String, Bytes>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of cached blocks. Not part of the trait — used
    /// by tests and diagnostics only.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[async_trait]
impl super::CacheStore for MemoryCacheStore {
    async fn get(&self, store_key: &str) -> Result<Option<Bytes>> {
        Ok(self.blocks.get(store_key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, store_key: &str, bytes: Bytes) -> Result<()> {
        self.blocks.insert(store_key.to_string(), bytes);
        Ok(())
    }

    async fn remove(&self, store_key: &str) -> Result<()> {
        self.blocks.remove(store_key);
        Ok(())
    }
}
