//! The gain curve `g(i)`, modeling diminishing returns of caching one
//! more block of an object already reconstructible from k blocks.

use crate::types::ErasureParams;

/// Marginal latency benefit of holding cache slot `i` (0-indexed) for
/// an object under `params`.
///
/// `g(i) = max(0, k - i) / k` for `i < k + m`; undefined (returns 0.0)
/// for `i >= k + m` since there is no (k+m)-th slot to assign.
pub fn gain(i: u16, params: ErasureParams) -> f64 {
    let k = params.k();
    if k == 0 || i >= params.total_blocks() {
        return 0.0;
    }
    let remaining = k.saturating_sub(i) as f64;
    remaining / k as f64
}
