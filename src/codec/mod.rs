//! Erasure coding: the `Codec` trait and its default implementation.
//!
//! Encode/decode are deliberately out of this crate's design scope
//! (spec §2 Non-goals names the codec a collaborator); the trait below
//! is the seam, and [`cauchy_rs::CauchyReedSolomon`] is the concrete
//! default that makes the rest of the crate buildable and testable
//! without an external codec crate.

mod cauchy_rs;
mod gf256;

pub use cauchy_rs::CauchyReedSolomon;

use bytes::Bytes;

use crate::error::Result;
use crate::types::ErasureParams;

/// Encodes an object into `k + m` blocks and decodes any `k` of them
/// back into the original bytes.
pub trait Codec: Send + Sync {
    /// Split and encode `data` into `params.total_blocks()` blocks.
    fn encode(&self, data: &[u8], params: ErasureParams) -> Result<Vec<Bytes>>;

    /// Reconstruct the original bytes from at least `params.k()`
    /// distinct `(index, bytes)` blocks.
    fn decode(&self, blocks: &[(u16, Bytes)], params: ErasureParams) -> Result<Vec<u8>>;
}

impl Codec for CauchyReedSolomon {
    fn encode(&self, data: &[u8], params: ErasureParams) -> Result<Vec<Bytes>> {
        CauchyReedSolomon::encode(self, data, params)
    }

    fn decode(&self, blocks: &[(u16, Bytes)], params: ErasureParams) -> Result<Vec<u8>> {
        CauchyReedSolomon::decode(self, blocks, params)
    }
}
