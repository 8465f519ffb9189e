//! prefixcache error types

/// prefixcache error types
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum PrefixCacheError {
    /// Bad configuration — init aborts.
    #[error("configuration error: {0}")]
    Config(String),

    /// A single backend or cache call failed. Counted as a fetch
    /// failure; the read continues with the remaining block tasks.
    #[error("transient store error ({store}): {message}")]
    TransientStore { store: String, message: String },

    /// Fewer than k blocks could be fetched. The read returns `None`.
    #[error("quorum lost: only {got} of {k} required blocks available")]
    QuorumLost { got: usize, k: u16 },

    /// The codec rejected a block set that contained k blocks. This is
    /// a logic bug, not an expected runtime condition — logged at
    /// error, read returns `None`.
    #[error("decode failed with {block_count} blocks: {message}")]
    DecodeFailed { block_count: usize, message: String },

    /// The recipe request to the proxy timed out. The read proceeds
    /// with `c = 0`.
    #[error("proxy unreachable: {0}")]
    ProxyUnreachable(String),

    /// A block fetch task was cancelled after quorum was reached.
    #[error("cancelled")]
    Cancelled,

    /// Erasure parameters (k, m) violate `0 <= k < 256, 0 <= m <= 256 - k`.
    #[error("invalid erasure parameters: k={k}, m={m}")]
    InvalidErasureParams { k: u16, m: u16 },

    /// I/O error from the cache/backend/wire layer.
    #[error("I/O error: {0}")]
    Io(String),
}

impl PrefixCacheError {
    /// Whether this error is transient — the read engine should treat
    /// it as one failed source among many rather than a fatal error.
    ///
    /// Used by the read engine to decide whether a failed block fetch
    /// simply counts against the quorum-impossible threshold, rather
    /// than aborting the whole read.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientStore { .. } | Self::ProxyUnreachable(_) | Self::Cancelled
        )
    }
}

impl From<std::io::Error> for PrefixCacheError {
    fn from(err: std::io::Error) -> Self {
        PrefixCacheError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for PrefixCacheError {
    fn from(err: reqwest::Error) -> Self {
        PrefixCacheError::TransientStore {
            store: "http-backend".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for prefixcache operations
pub type Result<T> = std::result::Result<T, PrefixCacheError>;
