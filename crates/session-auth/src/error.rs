//! Error types for credential storage and auth endpoint exchanges

use transport::{TransportError, ValidationError};

/// Errors from credential storage and auth endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("auth endpoint rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("request unsuccessful: {0}")]
    Unsuccessful(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
