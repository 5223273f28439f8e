//! Error types for request construction and transport exchanges

use std::time::Duration;

/// Failure of a single transport exchange: no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport failure: {0}")]
    Other(String),
}

/// A request that cannot be dispatched as described. Raised before any
/// network activity happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid url: {0}")]
    Url(String),

    #[error("invalid header: {0}")]
    Header(String),

    #[error("invalid body: {0}")]
    Body(String),
}
