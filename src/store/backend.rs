//! Backend object store implementations.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use reqwest::Client;

use crate::error::{PrefixCacheError, Result};

/// In-memory backend, for tests. Unlike the cache, a miss here is an
/// error — the backend is defined to always have every block (spec
/// §3), so an absent key during a test means the test forgot to seed
/// it, not a modeled failure.
#[derive(Debug, Default)]
pub struct MemoryBackendStore {
    blocks: DashMap<String, Bytes>,
}

impl MemoryBackendStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, store_key: impl Into<String>, bytes: Bytes) {
        self.blocks.insert(store_key.into(), bytes);
    }
}

#[async_trait]
impl super::BackendStore for MemoryBackendStore {
    async fn get(&self, store_key: &str) -> Result<Bytes> {
        self.blocks
            .get(store_key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PrefixCacheError::TransientStore {
                store: "memory-backend".to_string(),
                message: format!("no block seeded for {store_key}"),
            })
    }
}

/// HTTP-backed object store, fetching blocks from one of `s3.endpoints`
/// (spec §7 config). One `HttpBackendStore` addresses one region;
/// the read engine holds one instance per configured endpoint.
#[derive(Clone)]
pub struct HttpBackendStore {
    http: Client,
    base_url: String,
    bucket: String,
}

impl HttpBackendStore {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self::with_timeout(base_url, bucket, Duration::from_secs(10))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url: base_url.into(),
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl super::BackendStore for HttpBackendStore {
    async fn get(&self, store_key: &str) -> Result<Bytes> {
        let url = format!("{}/{}/{}", self.base_url, self.bucket, store_key);
        let response = self.http.get(&url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.bytes().await?)
    }
}
