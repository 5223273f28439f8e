//! Completed HTTP exchange as seen by the session layer

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

/// Fully buffered HTTP response.
///
/// Bodies are buffered so a response can be classified, logged, and handed
/// back to the caller without re-reading the network stream.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Build a JSON response. Used by in-process transports and tests.
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self::new(status, headers, value.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_response_sets_content_type() {
        let response = Response::json(StatusCode::OK, &serde_json::json!({"success": true}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(response.text(), r#"{"success":true}"#);
    }

    #[test]
    fn decode_reads_json_body() {
        let response = Response::json(
            StatusCode::CREATED,
            &serde_json::json!({"message": "created"}),
        );
        let value: serde_json::Value = response.decode().unwrap();
        assert_eq!(value["message"], "created");
    }

    #[test]
    fn decode_rejects_non_json_body() {
        let response = Response::new(StatusCode::BAD_GATEWAY, HeaderMap::new(), "<html>");
        assert!(response.decode::<serde_json::Value>().is_err());
        assert_eq!(response.text(), "<html>");
    }
}
