//! Telemetry metric name constants.
//!
//! Centralised metric names for hermod operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `hermod_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `method` — RPC method name (e.g. "Talk", "TalkBidirectional")
//! - `operation` — name given to a retried operation

/// Total RPCs received by the server.
///
/// Labels: `method`.
pub const REQUESTS_TOTAL: &str = "hermod_requests_total";

/// Total retry attempts made by the backoff loop (not counting the
/// initial attempt).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "hermod_retries_total";

/// Client-observed call duration in seconds.
///
/// Labels: `method`.
pub const CALL_DURATION_SECONDS: &str = "hermod_call_duration_seconds";
