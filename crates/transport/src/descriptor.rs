//! Immutable description of one outbound request
//!
//! A descriptor is built once per logical call. Attaching a bearer token or
//! marking a replay produces a new value, so concurrent tasks holding the
//! same descriptor never observe each other's changes.

use std::str::FromStr;

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    id: Uuid,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    retried: bool,
}

impl RequestDescriptor {
    /// Create a descriptor for an absolute http(s) URL.
    pub fn new(method: Method, url: &str) -> Result<Self, ValidationError> {
        let parsed = Url::parse(url).map_err(|e| ValidationError::Url(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::Url(format!(
                "{url}: scheme must be http or https"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            method,
            url: parsed,
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        })
    }

    pub fn get(url: &str) -> Result<Self, ValidationError> {
        Self::new(Method::GET, url)
    }

    pub fn post(url: &str) -> Result<Self, ValidationError> {
        Self::new(Method::POST, url)
    }

    /// Add or replace a header. `Authorization` is reserved for the session
    /// layer and is rejected here.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ValidationError> {
        let name = HeaderName::from_str(name)
            .map_err(|e| ValidationError::Header(format!("{name}: {e}")))?;
        if name == AUTHORIZATION {
            return Err(ValidationError::Header(
                "authorization is managed by the session layer".into(),
            ));
        }
        let value = HeaderValue::from_str(value)
            .map_err(|e| ValidationError::Header(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Serialize `body` as the JSON request body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ValidationError> {
        let bytes = serde_json::to_vec(body).map_err(|e| ValidationError::Body(e.to_string()))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Copy of this descriptor carrying `Authorization: Bearer <token>`.
    pub fn with_bearer(&self, token: &str) -> Result<Self, ValidationError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ValidationError::Header("bearer token is not a valid header value".into()))?;
        value.set_sensitive(true);
        let mut next = self.clone();
        next.headers.insert(AUTHORIZATION, value);
        Ok(next)
    }

    /// Copy of this descriptor marked as the single replay after a refresh.
    pub fn replay(&self) -> Self {
        let mut next = self.clone();
        next.retried = true;
        next
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn retried(&self) -> bool {
        self.retried
    }

    /// Token carried in the `Authorization: Bearer` header, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}
