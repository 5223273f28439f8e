//! Response classification
//!
//! Maps a completed exchange (response or transport failure) onto the small
//! outcome taxonomy that drives refresh and retry. Pure: no I/O, no state.

use session_auth::envelope;
use transport::{RequestDescriptor, Response, StatusCode, TransportError, TransportResult};

use crate::error::{Error, ErrorKind, Result};

/// Message used when a replayed request is rejected without an envelope.
const REPLAY_REJECTED: &str = "access token rejected after refresh";

/// Classified result of one exchange.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(Response),
    /// 401 on a first attempt; eligible for refresh.
    Unauthorized(Response),
    ServerError(Response),
    ClientError(Response),
    /// Terminal authentication failure: 401 on a replay, or a failed refresh.
    AuthRejected(String),
    TransportError(TransportError),
}

impl Outcome {
    /// Failure kind, or `None` for success.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Unauthorized(_) => Some(ErrorKind::AuthExpired),
            Outcome::ServerError(_) => Some(ErrorKind::Server),
            Outcome::ClientError(_) => Some(ErrorKind::Client),
            Outcome::AuthRejected(_) => Some(ErrorKind::AuthRejected),
            Outcome::TransportError(_) => Some(ErrorKind::Transport),
        }
    }

    /// Metric/log label.
    pub fn label(&self) -> &'static str {
        self.kind().map_or("success", |kind| kind.label())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Convert into the caller-facing result, surfacing the envelope message
    /// of failed responses.
    pub fn into_result(self) -> Result<Response> {
        match self {
            Outcome::Success(response) => Ok(response),
            Outcome::Unauthorized(response) => {
                Err(Error::AuthRejected(envelope::describe_failure(&response)))
            }
            Outcome::ServerError(response) => Err(Error::Server {
                status: response.status().as_u16(),
                message: envelope::describe_failure(&response),
            }),
            Outcome::ClientError(response) => Err(Error::Client {
                status: response.status().as_u16(),
                message: envelope::describe_failure(&response),
            }),
            Outcome::AuthRejected(message) => Err(Error::AuthRejected(message)),
            Outcome::TransportError(e) => Err(Error::Transport(e)),
        }
    }
}

/// Classify `raw`, the result of sending `descriptor`.
///
/// Rules, in order: transport failure; 401 on a first attempt; 401 on a
/// replay; 5xx; other 4xx; everything else is success.
pub fn classify(raw: TransportResult, descriptor: &RequestDescriptor) -> Outcome {
    let response = match raw {
        Ok(response) => response,
        Err(e) => return Outcome::TransportError(e),
    };

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        if descriptor.retried() {
            let message = envelope::failure_message(response.body())
                .unwrap_or_else(|| REPLAY_REJECTED.to_string());
            return Outcome::AuthRejected(message);
        }
        return Outcome::Unauthorized(response);
    }
    if status.is_server_error() {
        return Outcome::ServerError(response);
    }
    if status.is_client_error() {
        return Outcome::ClientError(response);
    }
    Outcome::Success(response)
}
