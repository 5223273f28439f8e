//! Session-authenticated request layer
//!
//! Issues API requests with the stored bearer token and recovers from access
//! token expiry transparently. Builds on `session-auth` (credentials, refresh
//! exchange) and `transport` (the HTTP seam).
//!
//! Request lifecycle:
//! 1. `SessionClient::execute()` attaches the stored token (`RequestPipeline`)
//! 2. The raw result is classified (`classify`)
//! 3. A first-attempt 401 joins the single in-flight refresh (`RefreshCoordinator`)
//! 4. On success the request is replayed once with the new token
//! 5. On failure the session is invalidated once (`SessionInvalidator`) and the
//!    caller receives `AuthRejected`

pub mod api;
pub mod classify;
pub mod client;
pub mod error;
pub mod invalidate;
pub mod metrics;
pub mod pipeline;
pub mod refresh;

#[cfg(test)]
mod test_support;

pub use api::AuthApi;
pub use classify::{Outcome, classify};
pub use client::SessionClient;
pub use error::{Error, ErrorKind, Result};
pub use invalidate::{SessionEvent, SessionInvalidator};
pub use pipeline::RequestPipeline;
pub use refresh::{RefreshCoordinator, RefreshResult};
