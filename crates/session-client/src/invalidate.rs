//! Session invalidation and the session-ended signal
//!
//! Clearing and signalling are tied to the store's atomic `clear()`: only the
//! caller that actually removed credentials emits `SessionEvent::Ended`, so
//! any number of concurrent triggers collapse into one clear and one signal.

use std::sync::Arc;

use session_auth::CredentialStore;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Buffered events per subscriber before lagging receivers drop old events.
const EVENT_CAPACITY: usize = 16;

/// Signal emitted to the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were cleared because the session could not be recovered.
    Ended { reason: String },
}

#[derive(Clone)]
pub struct SessionInvalidator {
    store: Arc<CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionInvalidator {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, events }
    }

    /// Receiver for session events. Subscribe before issuing requests to see
    /// every event.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Clear credentials and emit `Ended`.
    ///
    /// Returns whether this call ended the session. A store that is already
    /// empty means the session ended earlier (or never began); nothing is
    /// emitted in that case.
    pub async fn invalidate(&self, reason: &str) -> bool {
        if self.store.clear().await.is_none() {
            debug!(reason, "session already cleared, not signalling");
            return false;
        }

        warn!(reason, "session invalidated, credentials cleared");
        crate::metrics::record_invalidation();
        let event = SessionEvent::Ended {
            reason: reason.to_string(),
        };
        if self.events.send(event).is_err() {
            debug!("no session listeners subscribed");
        }
        true
    }
}
