//! Transport abstraction for the session layer
//!
//! Defines the `Transport` trait that decouples request orchestration from the
//! HTTP client. `HttpTransport` sends requests with reqwest; tests and hosts
//! with their own networking can supply any other implementation.

pub mod descriptor;
pub mod error;
pub mod http;
pub mod response;

pub use descriptor::RequestDescriptor;
pub use error::{TransportError, ValidationError};
pub use http::{DEFAULT_TIMEOUT, HttpTransport};
pub use response::Response;

pub use reqwest::header;
pub use reqwest::{Method, StatusCode, Url};

use std::future::Future;
use std::pin::Pin;

/// Raw result of one exchange: an HTTP response of any status, or a failure
/// before a response arrived.
pub type TransportResult = std::result::Result<Response, TransportError>;

/// Future returned by `Transport::send`.
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = TransportResult> + Send + 'a>>;

/// Sends a fully prepared request and returns the buffered response.
///
/// Implementations must not retry, must not interpret status codes, and must
/// bound each call by their own timeout. Uses `Pin<Box<dyn Future>>` return
/// types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "http")
    fn id(&self) -> &str;

    /// Perform one exchange for `request` exactly as described.
    fn send<'a>(&'a self, request: &'a RequestDescriptor) -> SendFuture<'a>;
}
