//! Firestore metrics.
//!
//! - Request counters by operation and status
//! - Latency histograms
//! - Retry counters
//! - Job claim outcomes

use metrics::{counter, histogram};

/// Metric name constants.
pub mod names {
    /// Total Firestore requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "reelcut_firestore_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "reelcut_firestore_retries_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "reelcut_firestore_latency_seconds";

    /// Job claim attempts by outcome (`claimed`, `conflict`, `abandoned`).
    pub const CLAIMS_TOTAL: &str = "reelcut_job_claims_total";
}

/// Record metrics for a completed Firestore request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record the outcome of one claim attempt.
pub fn record_claim(outcome: &'static str) {
    counter!(names::CLAIMS_TOTAL, "outcome" => outcome).increment(1);
}
