//! Credential store for the active session
//!
//! Holds at most one access/refresh token pair. A tokio Mutex serializes every
//! read and write, so no caller can observe a half-written pair. Each change
//! is written through to a `KeyValueStore` backend; the in-memory value is
//! authoritative and a failed write is logged rather than propagated.
//!
//! Lifecycle: populated on login or successful refresh, cleared on logout or
//! unrecoverable refresh failure, absent before login.

use std::sync::Arc;

use common::Secret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::endpoints::CREDENTIALS_KEY;
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, MemoryKeyValueStore};

/// Access/refresh token pair for one session.
///
/// Serialized with the backend's camelCase field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Bearer token attached to every authenticated request
    pub access_token: Secret<String>,
    /// Longer-lived token exchanged for a new access token
    pub refresh_token: Secret<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: Secret::new(refresh_token.into()),
        }
    }
}

/// Thread-safe holder of the current credentials.
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    state: Mutex<Option<Credentials>>,
}

impl CredentialStore {
    /// Restore credentials previously persisted in `backend`.
    ///
    /// An empty backend yields an unauthenticated store. A stored value that
    /// cannot be parsed is an error.
    pub async fn load(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let state = match backend.get(CREDENTIALS_KEY).await? {
            Some(raw) => {
                let credentials: Credentials = serde_json::from_str(&raw).map_err(|e| {
                    Error::CredentialParse(format!("parsing stored credentials: {e}"))
                })?;
                info!("restored persisted credentials");
                Some(credentials)
            }
            None => {
                info!("no persisted credentials, starting unauthenticated");
                None
            }
        };

        Ok(Self {
            backend,
            state: Mutex::new(state),
        })
    }

    /// Unauthenticated store backed by process memory only.
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryKeyValueStore::default()),
            state: Mutex::new(None),
        }
    }

    /// Snapshot of the current credentials.
    pub async fn get(&self) -> Option<Credentials> {
        self.state.lock().await.clone()
    }

    /// Current access token, if any.
    pub async fn access_token(&self) -> Option<Secret<String>> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Replace the credentials and persist them.
    pub async fn set(&self, credentials: Credentials) {
        let mut state = self.state.lock().await;
        *state = Some(credentials);
        debug!("credentials set");
        self.persist(state.as_ref()).await;
    }

    /// Remove the credentials, returning the previous pair.
    ///
    /// Only one of several concurrent callers receives `Some`.
    pub async fn clear(&self) -> Option<Credentials> {
        let mut state = self.state.lock().await;
        let previous = state.take();
        if previous.is_some() {
            debug!("credentials cleared");
            self.persist(None).await;
        }
        previous
    }

    /// Install a refreshed access token if the session is still the one that
    /// was refreshed.
    ///
    /// The swap only happens while the stored refresh token equals
    /// `expected_refresh`; a logout or a new login in the meantime wins.
    /// `refresh` rotates the refresh token when the backend issued a new one.
    pub async fn rotate(
        &self,
        expected_refresh: &Secret<String>,
        access: Secret<String>,
        refresh: Option<Secret<String>>,
    ) -> bool {
        let mut state = self.state.lock().await;
        match state.as_mut() {
            Some(current) if current.refresh_token == *expected_refresh => {
                current.access_token = access;
                if let Some(refresh) = refresh {
                    current.refresh_token = refresh;
                }
                debug!("access token rotated");
                self.persist(state.as_ref()).await;
                true
            }
            _ => {
                debug!("credentials changed during refresh, not rotating");
                false
            }
        }
    }

    async fn persist(&self, credentials: Option<&Credentials>) {
        let result = match credentials {
            Some(credentials) => match serde_json::to_string(credentials) {
                Ok(json) => self.backend.set(CREDENTIALS_KEY, json).await,
                Err(e) => Err(Error::CredentialParse(format!(
                    "serializing credentials: {e}"
                ))),
            },
            None => self.backend.remove(CREDENTIALS_KEY).await,
        };

        if let Err(e) = result {
            warn!(error = %e, "failed to persist credentials, keeping in-memory state");
            metrics::counter!("session_store_persist_failures_total").increment(1);
        }
    }
}
