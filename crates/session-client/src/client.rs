//! Caller-facing session client
//!
//! Wires the pipeline, classifier, refresh coordinator, and invalidator
//! together. A request that draws a 401 on its first attempt is refreshed and
//! replayed at most once; callers only ever see the terminal outcome.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use session_auth::{CredentialStore, Endpoints, envelope};
use tokio::sync::broadcast;
use tracing::{debug, instrument};
use transport::{Method, RequestDescriptor, Response, Transport};

use crate::classify::Outcome;
use crate::error::{Error, ErrorKind, Result};
use crate::invalidate::{SessionEvent, SessionInvalidator};
use crate::pipeline::RequestPipeline;
use crate::refresh::RefreshCoordinator;

pub struct SessionClient {
    base_url: String,
    endpoints: Endpoints,
    store: Arc<CredentialStore>,
    pipeline: RequestPipeline,
    invalidator: SessionInvalidator,
    coordinator: RefreshCoordinator,
}

impl SessionClient {
    /// Build a client for the API rooted at `base_url`.
    pub fn new(
        base_url: &str,
        endpoints: Endpoints,
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
    ) -> Result<Self> {
        RequestDescriptor::get(base_url)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let invalidator = SessionInvalidator::new(store.clone());
        let coordinator = RefreshCoordinator::new(
            transport.clone(),
            store.clone(),
            invalidator.clone(),
            join(&base_url, &endpoints.refresh),
        );
        let pipeline = RequestPipeline::new(transport, store.clone());

        Ok(Self {
            base_url,
            endpoints,
            store,
            pipeline,
            invalidator,
            coordinator,
        })
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        join(&self.base_url, path)
    }

    pub fn request(&self, method: Method, path: &str) -> Result<RequestDescriptor> {
        Ok(RequestDescriptor::new(method, &self.url(path))?)
    }

    pub fn get(&self, path: &str) -> Result<RequestDescriptor> {
        self.request(Method::GET, path)
    }

    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<RequestDescriptor> {
        Ok(self.request(Method::POST, path)?.with_json(body)?)
    }

    /// Dispatch with the stored credentials, refreshing and replaying once on
    /// an expired access token. Never returns `Outcome::Unauthorized`.
    #[instrument(
        skip_all,
        fields(request_id = %descriptor.id(), method = %descriptor.method(), path = descriptor.path())
    )]
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Outcome {
        let (outcome, attached) = self.pipeline.dispatch_tracked(descriptor).await;
        let outcome = match outcome {
            Outcome::Unauthorized(response) => {
                debug!(
                    status = response.status().as_u16(),
                    kind = ErrorKind::AuthExpired.label(),
                    "access token expired, refreshing"
                );
                self.coordinator
                    .refresh_and_retry(&self.pipeline, descriptor, attached.as_ref())
                    .await
            }
            other => other,
        };
        crate::metrics::record_outcome(outcome.label());
        debug!(outcome = outcome.label(), "request finished");
        outcome
    }

    /// Execute and map the terminal outcome onto `Error`.
    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<Response> {
        self.execute(descriptor).await.into_result()
    }

    /// Execute and decode the envelope `data` of a successful response.
    pub async fn fetch<T: DeserializeOwned>(&self, descriptor: &RequestDescriptor) -> Result<T> {
        let response = self.send(descriptor).await?;
        decode_envelope(&response)
    }

    /// Dispatch without credentials and without refresh. A 401 is terminal.
    #[instrument(
        skip_all,
        fields(request_id = %descriptor.id(), method = %descriptor.method(), path = descriptor.path())
    )]
    pub async fn send_public(&self, descriptor: &RequestDescriptor) -> Result<Response> {
        let outcome = self.pipeline.dispatch_anonymous(descriptor).await;
        crate::metrics::record_outcome(outcome.label());
        outcome.into_result()
    }

    /// Dispatch with the stored credentials but never refresh. A 401 is
    /// terminal and leaves the session untouched.
    #[instrument(
        skip_all,
        fields(request_id = %descriptor.id(), method = %descriptor.method(), path = descriptor.path())
    )]
    pub async fn send_without_refresh(&self, descriptor: &RequestDescriptor) -> Result<Response> {
        let outcome = self.pipeline.dispatch(descriptor).await;
        crate::metrics::record_outcome(outcome.label());
        outcome.into_result()
    }

    pub async fn fetch_public<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<T> {
        let response = self.send_public(descriptor).await?;
        decode_envelope(&response)
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Receiver for session-ended events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.invalidator.subscribe()
    }

    /// Number of refresh exchanges performed so far.
    pub fn exchanges(&self) -> u64 {
        self.coordinator.exchanges()
    }
}

fn join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn decode_envelope<T: DeserializeOwned>(response: &Response) -> Result<T> {
    envelope::decode(response.body()).map_err(|e| match e {
        session_auth::Error::Unsuccessful(message) => Error::Client {
            status: response.status().as_u16(),
            message,
        },
        other => Error::Decode(other.to_string()),
    })
}
