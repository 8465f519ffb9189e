//! prefixcache — an adaptive proxy-cache for geo-distributed,
//! erasure-coded object reads.
//!
//! Each object is split via a systematic (k, m) erasure code into
//! k+m blocks spread one-per-region across k+m backend regions; any
//! k blocks suffice to reconstruct it. A process-wide [`proxy`]
//! decides, per key, how many of an object's blocks should currently
//! live in a nearby cache (the "recipe"); the [`client`] read engine
//! races cache and backend reads to quorum, decodes, and repairs the
//! cache opportunistically.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use prefixcache::allocator::{Allocator, AllocatorConfig};
//! use prefixcache::client::{ReadEngine, Stats, UdpProxyRpc};
//! use prefixcache::codec::CauchyReedSolomon;
//! use prefixcache::store::{HttpBackendStore, MemoryCacheStore};
//! use prefixcache::types::ErasureParams;
//!
//! # async fn run() -> prefixcache::Result<()> {
//! let params = ErasureParams::new(4, 2)?;
//! let backends = (0..6)
//!     .map(|i| Arc::new(HttpBackendStore::new(format!("http://region-{i}"), "objects")) as _)
//!     .collect();
//! let engine = ReadEngine::new(
//!     Arc::new(CauchyReedSolomon::new()),
//!     Arc::new(MemoryCacheStore::new()),
//!     backends,
//!     Arc::new(UdpProxyRpc::new("127.0.0.1:9742".parse().unwrap(), std::time::Duration::from_millis(200))),
//!     params,
//!     5,
//!     Stats::new(),
//! );
//! let _bytes = engine.read("my-object").await;
//! # Ok(())
//! # }
//! ```

pub mod allocator;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod proxy;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod version;

pub use error::{PrefixCacheError, Result};
pub use types::{block_key, BlockEnvelope, BlockOrigin, ErasureParams, ReadOutcome};
