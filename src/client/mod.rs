//! The client's parallel block-fetch and reconstruction engine
//! (spec §4.3): [`ReadEngine::read`].

pub mod rpc;
pub mod stats;

pub use rpc::{ProxyRpc, UdpProxyRpc};
pub use stats::Stats;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::codec::Codec;
use crate::store::{BackendStore, CacheStore};
use crate::telemetry;
use crate::types::{block_key, BlockEnvelope, BlockOrigin, ErasureParams, ReadOutcome};

/// Default T₁: recipe request timeout (spec §4.3 step 1).
pub const DEFAULT_RECIPE_TIMEOUT: Duration = Duration::from_millis(200);
/// Default T₂: per-block fetch timeout (spec §5 "Timeouts and cancellation").
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(2);
/// Default worker pool size P (spec §6 `executor.threads`).
pub const DEFAULT_POOL_SIZE: usize = 5;

fn origin_label(origin: BlockOrigin) -> &'static str {
    match origin {
        BlockOrigin::Cache => "cache",
        BlockOrigin::Backend => "backend",
    }
}

/// The client's read engine: races cache and backend reads to quorum,
/// decodes, and opportunistically repairs the cache.
///
/// Cheap to clone (everything inside is `Arc`-wrapped) — share one
/// instance across workload threads, each driving its own `read()`
/// but sharing the bounded worker pool (spec §5).
pub struct ReadEngine {
    codec: Arc<dyn Codec>,
    cache: Arc<dyn CacheStore>,
    backends: Vec<Arc<dyn BackendStore>>,
    proxy: Arc<dyn ProxyRpc>,
    params: ErasureParams,
    pool: Arc<Semaphore>,
    stats: Arc<Stats>,
    recipe_timeout: Duration,
    fetch_timeout: Duration,
}

impl ReadEngine {
    /// `stats` is injected rather than global (spec §9's note on
    /// ambient globals) so tests can assert on a fresh counter set.
    pub fn new(
        codec: Arc<dyn Codec>,
        cache: Arc<dyn CacheStore>,
        backends: Vec<Arc<dyn BackendStore>>,
        proxy: Arc<dyn ProxyRpc>,
        params: ErasureParams,
        pool_size: usize,
        stats: Arc<Stats>,
    ) -> Self {
        assert!(!backends.is_empty(), "at least one backend region is required");
        Self {
            codec,
            cache,
            backends,
            proxy,
            params,
            pool: Arc::new(Semaphore::new(pool_size.max(1))),
            stats,
            recipe_timeout: DEFAULT_RECIPE_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, recipe_timeout: Duration, fetch_timeout: Duration) -> Self {
        self.recipe_timeout = recipe_timeout;
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn stats(&self) -> &Arc<Stats> {
        &self.stats
    }

    /// `read(key) -> bytes | null`. All within-read errors are
    /// absorbed here (spec §7 propagation policy); a failed read is
    /// `None`, never an `Err`.
    pub async fn read(&self, key: &str) -> Option<Bytes> {
        let start = std::time::Instant::now();
        let c = self.request_recipe(key).await;
        let outcome_data = self.fetch_quorum(key, c).await;

        let result = match outcome_data {
            Some((blocks, from_cache, from_backend)) => {
                match self.codec.decode(&blocks, self.params) {
                    Ok(bytes) => {
                        self.schedule_repairs(key, c, from_cache, &blocks);
                        let outcome = if from_cache == self.params.k() as usize {
                            ReadOutcome::Hit
                        } else if from_cache > 0 && from_backend > 0 {
                            ReadOutcome::PartialHit
                        } else {
                            ReadOutcome::Miss
                        };
                        self.stats.record(outcome);
                        metrics::counter!(telemetry::READS_TOTAL, "outcome" => outcome_label(outcome))
                            .increment(1);
                        Some(Bytes::from(bytes))
                    }
                    Err(e) => {
                        error!(%key, error = %e, "decode failed with a full quorum of blocks");
                        self.stats.record(ReadOutcome::Miss);
                        metrics::counter!(telemetry::READS_TOTAL, "outcome" => "miss").increment(1);
                        None
                    }
                }
            }
            None => {
                self.stats.record(ReadOutcome::Miss);
                metrics::counter!(telemetry::READS_TOTAL, "outcome" => "miss").increment(1);
                None
            }
        };

        metrics::histogram!(telemetry::READ_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
        result
    }

    async fn request_recipe(&self, key: &str) -> u16 {
        match tokio::time::timeout(self.recipe_timeout, self.proxy.request_recipe(key)).await {
            Ok(Ok(c)) => c,
            Ok(Err(e)) => {
                warn!(%key, error = %e, "recipe request failed, proceeding with c=0");
                0
            }
            Err(_) => {
                warn!(%key, "recipe request timed out, proceeding with c=0");
                0
            }
        }
    }

    /// Launches k+m concurrent block-fetch tasks and collects results
    /// until quorum is reached (`s = k`) or lost (`f = m+1`), per spec
    /// §4.3 steps 2-3. Returns the successful blocks plus their
    /// cache/backend split, or `None` if quorum was impossible.
    async fn fetch_quorum(
        &self,
        key: &str,
        c: u16,
    ) -> Option<(Vec<(u16, Bytes)>, usize, usize)> {
        let k = self.params.k() as usize;
        let m = self.params.m() as usize;
        let total = self.params.total_blocks();

        let mut tasks = FuturesUnordered::new();
        for i in 0..total {
            let cache = Arc::clone(&self.cache);
            let backend = Arc::clone(&self.backends[i as usize % self.backends.len()]);
            let pool = Arc::clone(&self.pool);
            let key = key.to_string();
            let timeout = self.fetch_timeout;
            let use_cache = i < c;
            tasks.push(tokio::spawn(fetch_block(
                cache, backend, pool, key, i, use_cache, timeout,
            )));
        }

        let mut successes: Vec<BlockEnvelope> = Vec::with_capacity(k);
        let mut failures = 0usize;

        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(Ok(envelope)) => {
                    successes.push(envelope);
                    if successes.len() == k {
                        break;
                    }
                }
                _ => {
                    failures += 1;
                    if failures == m + 1 {
                        break;
                    }
                }
            }
        }

        // Best-effort cancellation of stragglers (spec §5).
        for remaining in tasks {
            remaining.abort();
        }

        if successes.len() < k {
            return None;
        }

        let from_cache = successes
            .iter()
            .filter(|b| b.origin == BlockOrigin::Cache)
            .count();
        let from_backend = successes.len() - from_cache;
        let blocks = successes
            .iter()
            .map(|b| (b.index, b.bytes.clone()))
            .collect();

        Some((blocks, from_cache, from_backend))
    }

    /// Background cache repair (spec §4.3 step 5): backend-origin
    /// blocks with index `< c`, walked from the tail, up to `missing`
    /// repairs. Never writes beyond the recipe prefix (spec §9 Open
    /// Question (a) resolution).
    fn schedule_repairs(&self, key: &str, c: u16, from_cache: usize, blocks: &[(u16, Bytes)]) {
        let missing = (c as usize).saturating_sub(from_cache);
        if missing == 0 {
            return;
        }

        let mut backend_blocks: Vec<&(u16, Bytes)> = blocks
            .iter()
            .filter(|(i, _)| *i < c)
            .collect();
        backend_blocks.sort_by(|a, b| b.0.cmp(&a.0));

        for (index, bytes) in backend_blocks.into_iter().take(missing) {
            let cache = Arc::clone(&self.cache);
            let store_key = block_key(key, *index);
            let bytes = bytes.clone();
            tokio::spawn(async move {
                if let Err(e) = cache.put(&store_key, bytes).await {
                    warn!(%store_key, error = %e, "background repair failed");
                } else {
                    metrics::counter!(telemetry::REPAIRS_TOTAL).increment(1);
                }
            });
        }
    }
}

fn outcome_label(outcome: ReadOutcome) -> &'static str {
    match outcome {
        ReadOutcome::Hit => "hit",
        ReadOutcome::PartialHit => "partial_hit",
        ReadOutcome::Miss => "miss",
    }
}

/// One block-fetch task body: cache-then-backend for `i < c`, backend
/// only otherwise (spec §4.3 step 2). Used only through `tokio::spawn`
/// from [`ReadEngine::fetch_quorum`]; `Err(())` is an opaque fetch
/// failure, classified by the caller as a quorum-impossibility vote.
async fn fetch_block(
    cache: Arc<dyn CacheStore>,
    backend: Arc<dyn BackendStore>,
    pool: Arc<Semaphore>,
    key: String,
    index: u16,
    use_cache: bool,
    timeout: Duration,
) -> std::result::Result<BlockEnvelope, ()> {
    let Ok(_permit) = pool.acquire_owned().await else {
        return Err(());
    };

    let store_key = block_key(&key, index);
    let attempt = async {
        if use_cache {
            if let Ok(Some(bytes)) = cache.get(&store_key).await {
                return Some(BlockEnvelope {
                    index,
                    bytes,
                    origin: BlockOrigin::Cache,
                });
            }
        }
        match backend.get(&store_key).await {
            Ok(bytes) => Some(BlockEnvelope {
                index,
                bytes,
                origin: BlockOrigin::Backend,
            }),
            Err(_) => None,
        }
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(Some(envelope)) => {
            metrics::counter!(
                telemetry::BLOCK_FETCHES_TOTAL,
                "origin" => origin_label(envelope.origin),
                "outcome" => "ok"
            )
            .increment(1);
            Ok(envelope)
        }
        _ => {
            metrics::counter!(
                telemetry::BLOCK_FETCHES_TOTAL,
                "origin" => if use_cache { "cache" } else { "backend" },
                "outcome" => "error"
            )
            .increment(1);
            Err(())
        }
    }
}
