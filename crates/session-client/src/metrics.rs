//! Session metrics
//!
//! - `session_requests_total` (counter): label `outcome`
//! - `session_refresh_total` (counter): label `result`
//! - `session_invalidations_total` (counter)
//!
//! Calls are no-ops until the host installs a recorder.

/// Record the classified outcome of one exchange.
pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("session_requests_total", "outcome" => outcome).increment(1);
}

/// Record the result of one refresh exchange.
pub fn record_refresh(result: &'static str) {
    metrics::counter!("session_refresh_total", "result" => result).increment(1);
}

/// Record a session invalidation that cleared credentials.
pub fn record_invalidation() {
    metrics::counter!("session_invalidations_total").increment(1);
}
