//! Configuration loading (spec §6).
//!
//! TOML files, resolved the way the teacher resolves `ratd`'s config:
//! explicit `--config` path, then `~/.prefixcache/config.toml`, then
//! `/etc/prefixcache/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PrefixCacheError, Result};
use crate::types::ErasureParams;

/// Top-level configuration, one TOML section per dotted config key
/// namespace in spec §6.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub longhair: LonghairConfig,
    pub s3: S3Config,
    #[serde(default)]
    pub memcached: MemcachedConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub allocator: AllocatorTomlConfig,
}

/// `longhair.k` / `longhair.m` — named for the C Cauchy Reed-Solomon
/// library these erasure parameters are conventionally configured for.
#[derive(Debug, Clone, Deserialize)]
pub struct LonghairConfig {
    pub k: u16,
    pub m: u16,
}

impl LonghairConfig {
    pub fn erasure_params(&self) -> Result<ErasureParams> {
        ErasureParams::new(self.k, self.m)
    }
}

/// `s3.regions` / `s3.endpoints` / `s3.buckets` — comma-separated,
/// equal-length lists; element `i` defines backend region `i`.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub regions: String,
    pub endpoints: String,
    pub buckets: String,
}

impl S3Config {
    /// Split and validate the three lists are equal length, returning
    /// `(region, endpoint, bucket)` triples in region order.
    pub fn backends(&self) -> Result<Vec<(String, String, String)>> {
        let regions = split_list(&self.regions);
        let endpoints = split_list(&self.endpoints);
        let buckets = split_list(&self.buckets);
        if regions.len() != endpoints.len() || regions.len() != buckets.len() {
            return Err(PrefixCacheError::Config(format!(
                "s3.regions ({}), s3.endpoints ({}), and s3.buckets ({}) must be equal length",
                regions.len(),
                endpoints.len(),
                buckets.len()
            )));
        }
        Ok(regions
            .into_iter()
            .zip(endpoints)
            .zip(buckets)
            .map(|((r, e), b)| (r, e, b))
            .collect())
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `memcached.server` — host:port of the colocated cache store.
#[derive(Debug, Clone, Deserialize)]
pub struct MemcachedConfig {
    #[serde(default)]
    pub server: Option<String>,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        Self { server: None }
    }
}

/// `executor.threads` — worker pool size P.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

fn default_threads() -> usize {
    5
}

/// `proxy.host` / `proxy.port` — recipe server endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_host")]
    pub host: String,
    #[serde(default = "default_proxy_port")]
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_proxy_host(),
            port: default_proxy_port(),
        }
    }
}

fn default_proxy_host() -> String {
    "127.0.0.1".to_string()
}

fn default_proxy_port() -> u16 {
    9742
}

impl ProxyConfig {
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| PrefixCacheError::Config(format!("invalid proxy address: {e}")))
    }
}

/// `cache.capacity` — total cached-block budget B.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub capacity: u32,
}

/// `allocator.interval_ms` / `allocator.decay`.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocatorTomlConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_decay")]
    pub decay: f64,
}

impl Default for AllocatorTomlConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            decay: default_decay(),
        }
    }
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_decay() -> f64 {
    1.0
}

impl Config {
    /// Load configuration from the standard locations (spec §6).
    ///
    /// Resolution order: explicit path, `~/.prefixcache/config.toml`,
    /// `/etc/prefixcache/config.toml`.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path)
            .map_err(|e| PrefixCacheError::Config(format!("failed to read {path:?}: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PrefixCacheError::Config(format!("failed to parse {path:?}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(PrefixCacheError::Config(format!(
                "config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".prefixcache").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/prefixcache/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(PrefixCacheError::Config(
            "no config file found; create ~/.prefixcache/config.toml or /etc/prefixcache/config.toml"
                .to_string(),
        ))
    }

    /// Validate cross-field invariants that `serde` alone can't express.
    fn validate(&self) -> Result<()> {
        self.longhair.erasure_params()?;
        self.s3.backends()?;
        Ok(())
    }
}
