//! Request pipeline: attach the current bearer token and dispatch.
//!
//! The pipeline never retries; refresh and replay are orchestrated by the
//! session client on top of it.

use std::sync::Arc;

use common::Secret;
use session_auth::CredentialStore;
use tracing::{debug, warn};
use transport::{RequestDescriptor, Transport};

use crate::classify::{Outcome, classify};

pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
}

impl RequestPipeline {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<CredentialStore>) -> Self {
        Self { transport, store }
    }

    /// Dispatch with the stored access token, or unauthenticated when the
    /// store is empty.
    pub async fn dispatch(&self, descriptor: &RequestDescriptor) -> Outcome {
        self.dispatch_tracked(descriptor).await.0
    }

    /// Like `dispatch`, also returning the token that was attached.
    pub(crate) async fn dispatch_tracked(
        &self,
        descriptor: &RequestDescriptor,
    ) -> (Outcome, Option<Secret<String>>) {
        let token = self.store.access_token().await;
        let outcome = self.send(descriptor, token.as_ref()).await;
        (outcome, token)
    }

    /// Dispatch with an explicit token, bypassing the store.
    pub async fn dispatch_with_token(
        &self,
        descriptor: &RequestDescriptor,
        token: &Secret<String>,
    ) -> Outcome {
        self.send(descriptor, Some(token)).await
    }

    /// Dispatch without any credential, whatever the store holds.
    pub async fn dispatch_anonymous(&self, descriptor: &RequestDescriptor) -> Outcome {
        self.send(descriptor, None).await
    }

    async fn send(&self, descriptor: &RequestDescriptor, token: Option<&Secret<String>>) -> Outcome {
        let authorized;
        let outgoing = match token {
            Some(token) => match descriptor.with_bearer(token.expose()) {
                Ok(d) => {
                    authorized = d;
                    &authorized
                }
                Err(e) => {
                    warn!(request_id = %descriptor.id(), error = %e, "stored access token unusable");
                    return Outcome::AuthRejected(e.to_string());
                }
            },
            None => descriptor,
        };

        debug!(
            request_id = %descriptor.id(),
            transport = self.transport.id(),
            authenticated = token.is_some(),
            retried = descriptor.retried(),
            "dispatching request"
        );
        let raw = self.transport.send(outgoing).await;
        classify(raw, descriptor)
    }
}
