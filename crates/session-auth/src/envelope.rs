//! Uniform backend response envelope
//!
//! Every backend response has the shape
//! `{ "success": bool, "message": string, "data"?: T, "errors"?: [...] }`.
//! On failure `message` is the human-readable error shown to callers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use transport::Response;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
}

impl<T> Envelope<T> {
    /// `data` of a successful envelope.
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(Error::Unsuccessful(self.message));
        }
        self.data
            .ok_or_else(|| Error::InvalidResponse("envelope carries no data".into()))
    }
}

/// Decode a response body as an envelope and return its `data`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_slice(body)
        .map_err(|e| Error::InvalidResponse(format!("malformed envelope: {e}")))?;
    envelope.into_data()
}

/// The envelope `message` of a failed response, if the body carries one.
pub fn failure_message(body: &[u8]) -> Option<String> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_slice(body).ok()?;
    let message = envelope.message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Best human-readable description of a non-success response: the envelope
/// message, else the status reason phrase.
pub fn describe_failure(response: &Response) -> String {
    failure_message(response.body()).unwrap_or_else(|| {
        let status = response.status();
        match status.canonical_reason() {
            Some(reason) => format!("{} {reason}", status.as_u16()),
            None => format!("HTTP {}", status.as_u16()),
        }
    })
}
