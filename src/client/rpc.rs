//! Proxy RPC adapter (spec §4.4): `requestRecipe(key) -> cachedBlocks`.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::{PrefixCacheError, Result};
use crate::proxy::wire::Message;

/// Requests the current recipe for a key from the proxy. On timeout,
/// spec §4.3 step 1 says the read proceeds with `c = 0`; callers
/// should map a `ProxyUnreachable` error to that fallback rather than
/// failing the read.
#[async_trait]
pub trait ProxyRpc: Send + Sync {
    async fn request_recipe(&self, key: &str) -> Result<u16>;
}

/// UDP-based [`ProxyRpc`], one outstanding request per call — no
/// session state, matching spec §4.2's "single datagram each
/// direction".
pub struct UdpProxyRpc {
    proxy_addr: SocketAddr,
    timeout: Duration,
}

impl UdpProxyRpc {
    /// `timeout` is T₁ from spec §4.3 (default 200ms).
    pub fn new(proxy_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            proxy_addr,
            timeout,
        }
    }
}

#[async_trait]
impl ProxyRpc for UdpProxyRpc {
    async fn request_recipe(&self, key: &str) -> Result<u16> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let request = Message::RecipeReq {
            key: key.to_string(),
        }
        .encode();

        socket.send_to(&request, self.proxy_addr).await?;

        let mut buf = vec![0u8; 4096];
        let recv = tokio::time::timeout(self.timeout, socket.recv_from(&mut buf)).await;

        let (len, _peer) = match recv {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(PrefixCacheError::from(e)),
            Err(_) => {
                debug!(%key, "recipe request timed out");
                return Err(PrefixCacheError::ProxyUnreachable(format!(
                    "timed out after {:?}",
                    self.timeout
                )));
            }
        };

        match Message::decode(&buf[..len]) {
            Some(Message::RecipeRep { cached_blocks, .. }) => Ok(cached_blocks),
            _ => Err(PrefixCacheError::ProxyUnreachable(
                "malformed recipe reply".to_string(),
            )),
        }
    }
}
