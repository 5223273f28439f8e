//! Scripted in-memory backend for protocol tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use session_auth::endpoints::REFRESH_PATH;
use session_auth::{CredentialStore, Endpoints};
use transport::{
    RequestDescriptor, Response, SendFuture, StatusCode, Transport, TransportResult,
};

use crate::client::SessionClient;

pub const BASE: &str = "http://api.test/api";

type Handler = Box<dyn Fn(&RequestDescriptor) -> TransportResult + Send + Sync>;

/// Transport answering through a handler closure and recording every request
/// it receives. Refresh requests can be delayed to hold the exchange open.
pub struct FakeBackend {
    handler: Handler,
    refresh_delay: Option<Duration>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl FakeBackend {
    pub fn new(
        handler: impl Fn(&RequestDescriptor) -> TransportResult + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            refresh_delay: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_refresh_delay(
        handler: impl Fn(&RequestDescriptor) -> TransportResult + Send + Sync + 'static,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            refresh_delay: Some(delay),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RequestDescriptor> {
        self.requests()
            .into_iter()
            .filter(|r| r.path().ends_with(path))
            .collect()
    }

    pub fn refresh_calls(&self) -> usize {
        self.requests_to(REFRESH_PATH).len()
    }
}

impl Transport for FakeBackend {
    fn id(&self) -> &str {
        "fake"
    }

    fn send<'a>(&'a self, request: &'a RequestDescriptor) -> SendFuture<'a> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.refresh_delay
                && request.path().ends_with(REFRESH_PATH)
            {
                tokio::time::sleep(delay).await;
            }
            (self.handler)(request)
        })
    }
}

/// Successful envelope carrying `data`.
pub fn ok(data: serde_json::Value) -> TransportResult {
    Ok(Response::json(
        StatusCode::OK,
        &serde_json::json!({"success": true, "message": "ok", "data": data}),
    ))
}

/// Failed envelope with `message`.
pub fn fail(status: StatusCode, message: &str) -> TransportResult {
    Ok(Response::json(
        status,
        &serde_json::json!({"success": false, "message": message}),
    ))
}

/// Client over `backend` with default endpoints.
pub fn client(backend: Arc<FakeBackend>, store: Arc<CredentialStore>) -> SessionClient {
    SessionClient::new(BASE, Endpoints::default(), backend, store).unwrap()
}
