//! Single-flight token refresh
//!
//! At most one refresh exchange is in flight per coordinator. The first caller
//! that needs a refresh spawns the exchange as its own task and publishes a
//! shared handle to its result; every caller arriving while it runs attaches
//! to that handle instead of starting another exchange.
//!
//! Because the exchange runs on a spawned task, dropping any caller (including
//! the one that started it) only removes that caller from the waiter set. The
//! in-flight marker is cleared by a guard owned by the task itself, before the
//! result is delivered, so it cannot outlive the exchange.
//!
//! Refresh lifecycle:
//! 1. Request draws a 401 → `refresh_and_retry()`
//! 2. Join the in-flight exchange, or spawn one
//! 3. Exchange succeeds → store rotated → waiters replay once with the new token
//! 4. Exchange fails → session invalidated once → waiters resolve `AuthRejected`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::Secret;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use session_auth::{CredentialStore, Credentials};
use tracing::{debug, info, warn};
use transport::{RequestDescriptor, Transport};

use crate::classify::Outcome;
use crate::invalidate::SessionInvalidator;
use crate::pipeline::RequestPipeline;

/// Result of one refresh exchange, shared by every attached caller.
#[derive(Debug, Clone)]
pub enum RefreshResult {
    Refreshed(Secret<String>),
    Failed(String),
}

type InFlight = Shared<BoxFuture<'static, RefreshResult>>;

const NO_REFRESH_TOKEN: &str = "no refresh token available";

/// Why an exchange did not produce a usable token.
enum RefreshFailure {
    /// Network error or backend rejection; the session cannot be recovered.
    Exchange(String),
    /// The store changed while the exchange ran (logout or new login).
    Superseded,
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    invalidator: SessionInvalidator,
    refresh_url: String,
    in_flight: Mutex<Option<InFlight>>,
    exchanges: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        invalidator: SessionInvalidator,
        refresh_url: String,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                invalidator,
                refresh_url,
                in_flight: Mutex::new(None),
                exchanges: AtomicU64::new(0),
            }),
        }
    }

    /// Number of refresh exchanges performed so far.
    pub fn exchanges(&self) -> u64 {
        self.inner.exchanges.load(Ordering::Relaxed)
    }

    /// Whether an exchange is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_in_flight().is_some()
    }

    /// Refresh, then replay `descriptor` once with the new token.
    ///
    /// `rejected` is the token the 401 was drawn with. A descriptor that was
    /// already replayed is never refreshed again.
    pub async fn refresh_and_retry(
        &self,
        pipeline: &RequestPipeline,
        descriptor: &RequestDescriptor,
        rejected: Option<&Secret<String>>,
    ) -> Outcome {
        if descriptor.retried() {
            return Outcome::AuthRejected("request was already replayed after a refresh".into());
        }

        match self.refresh(rejected).await {
            RefreshResult::Refreshed(token) => {
                let replay = descriptor.replay();
                debug!(request_id = %replay.id(), "replaying request with refreshed token");
                pipeline.dispatch_with_token(&replay, &token).await
            }
            RefreshResult::Failed(reason) => Outcome::AuthRejected(reason),
        }
    }

    /// Obtain a fresh access token, joining an in-flight exchange if any.
    ///
    /// When the stored token already differs from `rejected`, another
    /// exchange completed after the 401 was drawn and the stored token is
    /// returned without a new exchange.
    pub async fn refresh(&self, rejected: Option<&Secret<String>>) -> RefreshResult {
        if let Some(current) = self.inner.store.access_token().await
            && rejected != Some(&current)
            && !self.is_refreshing()
        {
            debug!("access token already replaced, skipping exchange");
            return RefreshResult::Refreshed(current);
        }

        self.join_or_start(rejected.cloned()).await
    }

    fn join_or_start(&self, rejected: Option<Secret<String>>) -> InFlight {
        let mut slot = self.inner.lock_in_flight();
        if let Some(pending) = slot.as_ref() {
            debug!("joining in-flight token refresh");
            return pending.clone();
        }

        let inner = self.inner.clone();
        let task = tokio::spawn(inner.run(rejected));
        let pending: InFlight = async move {
            task.await.unwrap_or_else(|e| {
                RefreshResult::Failed(format!("token refresh task ended abnormally: {e}"))
            })
        }
        .boxed()
        .shared();
        *slot = Some(pending.clone());
        pending
    }
}

impl Inner {
    fn lock_in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(self: Arc<Self>, rejected: Option<Secret<String>>) -> RefreshResult {
        let _marker = InFlightMarker(&self);

        let Some(credentials) = self.store.get().await else {
            debug!("no stored credentials, nothing to refresh");
            return RefreshResult::Failed(NO_REFRESH_TOKEN.into());
        };
        // The previous exchange may have rotated the store between the
        // caller's check and this task taking the slot.
        if rejected.as_ref() != Some(&credentials.access_token) {
            debug!("access token replaced before exchange, reusing it");
            return RefreshResult::Refreshed(credentials.access_token);
        }

        self.exchanges.fetch_add(1, Ordering::Relaxed);
        info!("starting token refresh");

        match self.exchange(credentials).await {
            Ok(token) => {
                crate::metrics::record_refresh("refreshed");
                info!("token refresh succeeded");
                RefreshResult::Refreshed(token)
            }
            Err(RefreshFailure::Superseded) => {
                crate::metrics::record_refresh("superseded");
                info!("session changed during token refresh, discarding result");
                RefreshResult::Failed("session changed during token refresh".into())
            }
            Err(RefreshFailure::Exchange(reason)) => {
                crate::metrics::record_refresh("failed");
                warn!(error = %reason, "token refresh failed");
                self.invalidator.invalidate(&reason).await;
                RefreshResult::Failed(reason)
            }
        }
    }

    async fn exchange(&self, credentials: Credentials) -> Result<Secret<String>, RefreshFailure> {
        let refreshed = session_auth::refresh_access_token(
            self.transport.as_ref(),
            &self.refresh_url,
            credentials.refresh_token.expose(),
        )
        .await
        .map_err(|e| {
            RefreshFailure::Exchange(match e {
                session_auth::Error::Rejected { message, .. }
                | session_auth::Error::Unsuccessful(message) => message,
                other => other.to_string(),
            })
        })?;

        let access = refreshed.access_token.clone();
        let rotated = self
            .store
            .rotate(
                &credentials.refresh_token,
                refreshed.access_token,
                refreshed.refresh_token,
            )
            .await;
        if !rotated {
            return Err(RefreshFailure::Superseded);
        }
        Ok(access)
    }
}

/// Clears the in-flight slot when the exchange task finishes or unwinds.
struct InFlightMarker<'a>(&'a Inner);

impl Drop for InFlightMarker<'_> {
    fn drop(&mut self) {
        self.0.lock_in_flight().take();
    }
}
