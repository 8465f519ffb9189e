//! client — prefixcache read-path demo client.
//!
//! Embeds a [`ReadEngine`], calling `init -> read* -> cleanup` the way
//! a workload driver would (spec §6 CLI surface).

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;

use prefixcache::client::{ReadEngine, Stats, UdpProxyRpc};
use prefixcache::codec::CauchyReedSolomon;
use prefixcache::config::Config;
use prefixcache::store::{BackendStore, HttpBackendStore, MemoryCacheStore};
use prefixcache::version::PKG_VERSION;

/// prefixcache CLI client.
#[derive(Parser)]
#[command(name = "client")]
#[command(version = PKG_VERSION)]
#[command(about = "prefixcache read-path client")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read an object by key, racing cache and backend reads to quorum.
    Read {
        /// Object key.
        key: String,
    },

    /// Report cumulative read-outcome counters for this process.
    ///
    /// Since each invocation is a fresh process, this is only
    /// meaningful after a `read` in the same invocation — provided as
    /// a demonstration of the injected [`Stats`] handle (spec §9).
    Stats {
        /// Keys to read before reporting.
        keys: Vec<String>,

        /// Emit the counters as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct StatsReport {
    cache_hits: u64,
    cache_partial_hits: u64,
    cache_misses: u64,
    total: u64,
}

fn build_engine(config: &Config) -> prefixcache::Result<ReadEngine> {
    let params = config.longhair.erasure_params()?;
    let backends: Vec<Arc<dyn BackendStore>> = config
        .s3
        .backends()?
        .into_iter()
        .map(|(_region, endpoint, bucket)| {
            Arc::new(HttpBackendStore::new(endpoint, bucket)) as Arc<dyn BackendStore>
        })
        .collect();

    let proxy_addr = config.proxy.socket_addr()?;
    let proxy = Arc::new(UdpProxyRpc::new(proxy_addr, Duration::from_millis(200)));

    Ok(ReadEngine::new(
        Arc::new(CauchyReedSolomon::new()),
        Arc::new(MemoryCacheStore::new()),
        backends,
        proxy,
        params,
        config.executor.threads,
        Stats::new(),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let engine = build_engine(&config)?;

    match args.command {
        Command::Read { key } => match engine.read(&key).await {
            Some(bytes) => {
                println!("{} bytes", bytes.len());
            }
            None => {
                eprintln!("read failed: quorum not reached for {key}");
                std::process::exit(1);
            }
        },
        Command::Stats { keys, json } => {
            for key in keys {
                engine.read(&key).await;
            }
            let stats = engine.stats();
            let report = StatsReport {
                cache_hits: stats.cache_hits(),
                cache_partial_hits: stats.cache_partial_hits(),
                cache_misses: stats.cache_misses(),
                total: stats.total(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("cache_hits: {}", report.cache_hits);
                println!("cache_partial_hits: {}", report.cache_partial_hits);
                println!("cache_misses: {}", report.cache_misses);
                println!("total: {}", report.total);
            }
        }
    }

    Ok(())
}
