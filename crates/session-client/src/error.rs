//! Caller-facing error taxonomy

use transport::{TransportError, ValidationError};

/// Kind of failure, used for logs and metric labels.
///
/// `AuthExpired` is recovered internally by the refresh coordinator and never
/// reaches a caller as an `Error`; it only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    AuthExpired,
    AuthRejected,
    Server,
    Client,
    Validation,
    Decode,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport_error",
            ErrorKind::AuthExpired => "auth_expired",
            ErrorKind::AuthRejected => "auth_rejected",
            ErrorKind::Server => "server_error",
            ErrorKind::Client => "client_error",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Decode => "decode_error",
        }
    }
}

/// Terminal failure of a request issued through the session client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("request rejected ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::AuthRejected(_) => ErrorKind::AuthRejected,
            Error::Server { .. } => ErrorKind::Server,
            Error::Client { .. } => ErrorKind::Client,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// Result alias for session client operations.
pub type Result<T> = std::result::Result<T, Error>;
