//! The recipe server: a UDP request/response loop over [`Allocator`]
//! (spec §4.2), plus the background periodic reallocation task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

use crate::allocator::Allocator;
use crate::error::Result;
use crate::proxy::wire::Message;
use crate::telemetry;

/// Maximum datagram size accepted off the wire.
const MAX_DATAGRAM_LEN: usize = 4096;

/// Runs the recipe server until cancelled by `shutdown`.
///
/// One socket, processed on the calling task — spec §5 allocates "one
/// worker for recipe handling" to the proxy; requests are stateless
/// and cheap enough that no additional fan-out is warranted.
pub async fn serve(
    addr: SocketAddr,
    allocator: Arc<Allocator>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<()> {
    let socket = UdpSocket::bind(addr).await?;
    info!(%addr, "recipe server listening");

    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("recipe server shutting down");
                return Ok(());
            }
            result = socket.recv_from(&mut buf) => {
                let (len, peer) = match result {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "recipe server recv error");
                        continue;
                    }
                };
                handle_datagram(&socket, &allocator, &buf[..len], peer).await;
            }
        }
    }
}

async fn handle_datagram(socket: &UdpSocket, allocator: &Allocator, buf: &[u8], peer: SocketAddr) {
    let Some(Message::RecipeReq { key }) = Message::decode(buf) else {
        metrics::counter!(telemetry::RECIPE_REQUESTS_DROPPED_TOTAL).increment(1);
        debug!(%peer, "dropped malformed recipe request");
        return;
    };

    metrics::counter!(telemetry::RECIPE_REQUESTS_TOTAL).increment(1);
    allocator.on_access(&key);
    let cached_blocks = allocator.recipe_of(&key);

    let reply = Message::RecipeRep {
        key,
        cached_blocks,
    }
    .encode();

    if let Err(e) = socket.send_to(&reply, peer).await {
        warn!(%peer, error = %e, "failed to send recipe reply");
    }
}

/// Runs [`Allocator::reallocate`] on a fixed interval until cancelled.
pub async fn run_reallocation_loop(
    allocator: Arc<Allocator>,
    interval: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("reallocation loop shutting down");
                return;
            }
            _ = ticker.tick() => {
                let start = std::time::Instant::now();
                if let Err(e) = allocator.reallocate() {
                    error!(error = %e, "reallocation failed");
                }
                metrics::histogram!(telemetry::REALLOCATE_DURATION_SECONDS)
                    .record(start.elapsed().as_secs_f64());
                metrics::gauge!(telemetry::CACHE_BUDGET_ASSIGNED)
                    .set(allocator.total_assigned() as f64);
            }
        }
    }
}
