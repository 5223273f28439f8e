//! reqwest-backed transport with a fixed per-call timeout.

use std::time::Duration;

use tracing::debug;

use crate::{RequestDescriptor, Response, SendFuture, Transport, TransportError};

/// Timeout applied to every call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends descriptors through a shared `reqwest::Client`.
///
/// The timeout aborts only the call it belongs to; the client and any shared
/// session state are untouched.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), DEFAULT_TIMEOUT)
    }
}

impl Transport for HttpTransport {
    fn id(&self) -> &str {
        "http"
    }

    fn send<'a>(&'a self, request: &'a RequestDescriptor) -> SendFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method().clone(), request.url().clone())
                .headers(request.headers().clone())
                .timeout(self.timeout);
            if let Some(body) = request.body() {
                builder = builder.body(body.clone());
            }

            let upstream = builder.send().await.map_err(|e| self.map_error(e))?;
            let status = upstream.status();
            let headers = upstream.headers().clone();
            let body = upstream.bytes().await.map_err(|e| self.map_error(e))?;

            debug!(
                request_id = %request.id(),
                status = status.as_u16(),
                bytes = body.len(),
                "exchange completed"
            );
            Ok(Response::new(status, headers, body))
        })
    }
}
