//! Systematic Cauchy Reed-Solomon erasure code over GF(256).
//!
//! The first `k` blocks of an encoded object are the data blocks
//! themselves (systematic); the remaining `m` blocks are parity,
//! computed from a Cauchy matrix. Any `k` of the `k + m` blocks suffice
//! to reconstruct the original data — the defining MDS property of a
//! Cauchy matrix is that every square submatrix is invertible, so the
//! decode-side linear system always has a unique solution regardless
//! of which `k` indices are provided.

use bytes::Bytes;

use super::gf256;
use crate::error::{PrefixCacheError, Result};
use crate::types::ErasureParams;

/// Length header prefixed to the payload before splitting into k
/// blocks, so decode knows how much padding to trim.
const HEADER_LEN: usize = 8;

/// Cauchy coefficient for parity row `i` (0-indexed among the m parity
/// rows) and data column `j` (0-indexed among the k data columns).
///
/// `x_i = k + i`, `y_j = j`; coefficient is `1 / (x_i XOR y_j)` in
/// GF(256). The data and parity index ranges never overlap and GF(256)
/// addition is XOR, so `x_i XOR y_j` is never zero and every row/column
/// is pairwise distinct — the standard Cauchy matrix construction.
fn cauchy_coeff(i: usize, j: usize, k: usize) -> u8 {
    let x = (k + i) as u8;
    let y = j as u8;
    gf256::inv(x ^ y)
}

/// Generator matrix row for block index `block_idx` (0..k+m), as the
/// `k` GF(256) coefficients combining the k data columns to produce
/// that block. Data rows (`block_idx < k`) are the identity row;
/// parity rows use [`cauchy_coeff`].
fn generator_row(block_idx: usize, k: usize) -> Vec<u8> {
    if block_idx < k {
        let mut row = vec![0u8; k];
        row[block_idx] = 1;
        row
    } else {
        let i = block_idx - k;
        (0..k).map(|j| cauchy_coeff(i, j, k)).collect()
    }
}

/// Invert a `k x k` matrix over GF(256) via Gauss-Jordan elimination.
///
/// Returns `None` if the matrix is singular. For a Cauchy-derived
/// submatrix this never happens; the `None` path exists only to turn
/// a would-be panic into the caller's `DecodeFailed` error.
fn invert(mut m: Vec<Vec<u8>>) -> Option<Vec<Vec<u8>>> {
    let n = m.len();
    let mut inv = vec![vec![0u8; n]; n];
    for (i, row) in inv.iter_mut().enumerate() {
        row[i] = 1;
    }

    for col in 0..n {
        // Find a pivot with a nonzero entry in this column.
        let pivot_row = (col..n).find(|&r| m[r][col] != 0)?;
        m.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot_inv = gf256::inv(m[col][col]);
        for v in m[col].iter_mut() {
            *v = gf256::mul(*v, pivot_inv);
        }
        for v in inv[col].iter_mut() {
            *v = gf256::mul(*v, pivot_inv);
        }

        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = m[r][col];
            if factor == 0 {
                continue;
            }
            for c in 0..n {
                m[r][c] ^= gf256::mul(factor, m[col][c]);
                inv[r][c] ^= gf256::mul(factor, inv[col][c]);
            }
        }
    }

    Some(inv)
}

/// Systematic Cauchy Reed-Solomon codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct CauchyReedSolomon;

impl CauchyReedSolomon {
    pub fn new() -> Self {
        Self
    }

    /// Split `data` into `k` equally-sized data blocks and compute `m`
    /// parity blocks. Returns `k + m` blocks, block `i` at index `i`.
    pub fn encode(&self, data: &[u8], params: ErasureParams) -> Result<Vec<Bytes>> {
        let k = params.k() as usize;
        let m = params.m() as usize;
        if k == 0 {
            return Err(PrefixCacheError::InvalidErasureParams {
                k: params.k(),
                m: params.m(),
            });
        }

        let mut payload = Vec::with_capacity(HEADER_LEN + data.len());
        payload.extend_from_slice(&(data.len() as u64).to_be_bytes());
        payload.extend_from_slice(data);

        let block_len = payload.len().div_ceil(k);
        payload.resize(block_len * k, 0);

        let data_blocks: Vec<&[u8]> = payload.chunks(block_len).collect();

        let mut blocks: Vec<Bytes> = data_blocks
            .iter()
            .map(|chunk| Bytes::copy_from_slice(chunk))
            .collect();

        for i in 0..m {
            let mut parity = vec![0u8; block_len];
            for (j, data_block) in data_blocks.iter().enumerate() {
                let coeff = cauchy_coeff(i, j, k);
                if coeff == 0 {
                    continue;
                }
                for (p, &d) in parity.iter_mut().zip(data_block.iter()) {
                    *p ^= gf256::mul(coeff, d);
                }
            }
            blocks.push(Bytes::from(parity));
        }

        Ok(blocks)
    }

    /// Reconstruct the original payload from at least `k` distinct
    /// `(index, bytes)` blocks. Fails if fewer than `k` blocks are
    /// given, or if the block set is otherwise inconsistent (mismatched
    /// lengths).
    pub fn decode(&self, blocks: &[(u16, Bytes)], params: ErasureParams) -> Result<Vec<u8>> {
        let k = params.k() as usize;
        if blocks.len() < k {
            return Err(PrefixCacheError::DecodeFailed {
                block_count: blocks.len(),
                message: format!("need at least {k} blocks, got {}", blocks.len()),
            });
        }

        let mut seen = std::collections::HashSet::new();
        let mut chosen: Vec<&(u16, Bytes)> = Vec::with_capacity(k);
        for entry in blocks {
            if seen.insert(entry.0) {
                chosen.push(entry);
                if chosen.len() == k {
                    break;
                }
            }
        }
        if chosen.len() < k {
            return Err(PrefixCacheError::DecodeFailed {
                block_count: blocks.len(),
                message: format!("need {k} distinct block indices, got {}", chosen.len()),
            });
        }

        let block_len = chosen[0].1.len();
        if chosen.iter().any(|(_, b)| b.len() != block_len) {
            return Err(PrefixCacheError::DecodeFailed {
                block_count: blocks.len(),
                message: "mismatched block lengths".to_string(),
            });
        }

        let rows: Vec<Vec<u8>> = chosen
            .iter()
            .map(|(idx, _)| generator_row(*idx as usize, k))
            .collect();
        let inverse = invert(rows).ok_or_else(|| PrefixCacheError::DecodeFailed {
            block_count: blocks.len(),
            message: "singular generator submatrix".to_string(),
        })?;

        let mut payload = vec![0u8; block_len * k];
        for (out_row, inv_row) in inverse.iter().enumerate() {
            let out_slice = &mut payload[out_row * block_len..(out_row + 1) * block_len];
            for (col, &coeff) in inv_row.iter().enumerate() {
                if coeff == 0 {
                    continue;
                }
                let src = &chosen[col].1;
                for (o, &s) in out_slice.iter_mut().zip(src.iter()) {
                    *o ^= gf256::mul(coeff, s);
                }
            }
        }

        if payload.len() < HEADER_LEN {
            return Err(PrefixCacheError::DecodeFailed {
                block_count: blocks.len(),
                message: "payload shorter than length header".to_string(),
            });
        }
        let len = u64::from_be_bytes(payload[..HEADER_LEN].try_into().unwrap()) as usize;
        let body = &payload[HEADER_LEN..];
        if len > body.len() {
            return Err(PrefixCacheError::DecodeFailed {
                block_count: blocks.len(),
                message: "length header exceeds decoded payload".to_string(),
            });
        }
        Ok(body[..len].to_vec())
    }
}
