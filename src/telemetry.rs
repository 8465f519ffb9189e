//! Telemetry metric name constants.
//!
//! Centralised metric names for prefixcache operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `prefixcache_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `origin` — block origin: "cache" | "backend"
//! - `region` — backend region index (as a string)
//! - `outcome` — "hit" | "partial_hit" | "miss"

/// Total reads completed by the client read engine.
///
/// Labels: `outcome` ("hit" | "partial_hit" | "miss").
pub const READS_TOTAL: &str = "prefixcache_reads_total";

/// Read duration in seconds, from recipe request to decoded bytes.
pub const READ_DURATION_SECONDS: &str = "prefixcache_read_duration_seconds";

/// Total block fetches issued, one per (key, index) task.
///
/// Labels: `origin` ("cache" | "backend"), `outcome` ("ok" | "error").
pub const BLOCK_FETCHES_TOTAL: &str = "prefixcache_block_fetches_total";

/// Total background repair writes submitted.
pub const REPAIRS_TOTAL: &str = "prefixcache_repairs_total";

/// Total recipe requests handled by the proxy.
pub const RECIPE_REQUESTS_TOTAL: &str = "prefixcache_recipe_requests_total";

/// Total malformed/oversize recipe requests dropped.
pub const RECIPE_REQUESTS_DROPPED_TOTAL: &str = "prefixcache_recipe_requests_dropped_total";

/// Allocator reallocation pass duration in seconds.
pub const REALLOCATE_DURATION_SECONDS: &str = "prefixcache_reallocate_duration_seconds";

/// Total cache budget currently assigned (gauge), sampled after each
/// reallocation.
pub const CACHE_BUDGET_ASSIGNED: &str = "prefixcache_cache_budget_assigned";
