//! proxy — prefixcache recipe server and allocator daemon.
//!
//! Starts the recipe server and the periodic reallocation loop over a
//! shared [`Allocator`].

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use prefixcache::allocator::{Allocator, AllocatorConfig};
use prefixcache::config::Config;
use prefixcache::proxy::{run_reallocation_loop, serve};
use prefixcache::version::PKG_VERSION;

/// prefixcache proxy — recipe server and cache-allocation daemon.
#[derive(Parser)]
#[command(name = "proxy")]
#[command(version = PKG_VERSION)]
#[command(about = "prefixcache recipe server and allocator daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
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

    let params = config.longhair.erasure_params()?;
    let addr = config.proxy.socket_addr()?;

    let allocator = Arc::new(Allocator::new(
        params,
        AllocatorConfig {
            budget: config.cache.capacity,
            decay: config.allocator.decay,
        },
    ));

    info!(
        version = PKG_VERSION,
        %addr,
        k = params.k(),
        m = params.m(),
        budget = config.cache.capacity,
        interval_ms = config.allocator.interval_ms,
        "proxy starting",
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let reallocation = tokio::spawn(run_reallocation_loop(
        Arc::clone(&allocator),
        Duration::from_millis(config.allocator.interval_ms),
        shutdown_rx.clone(),
    ));

    let server = tokio::spawn(serve(addr, allocator, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining connections");
    let _ = shutdown_tx.send(true);

    let _ = reallocation.await;
    server.await??;

    info!("proxy stopped");
    Ok(())
}
