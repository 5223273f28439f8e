//! Refresh token exchange
//!
//! POSTs `{ "refreshToken": ... }` to the refresh endpoint and extracts
//! `data.accessToken` (plus a rotated `data.refreshToken` when the backend
//! issues one). The exchange goes straight to the transport: it never carries
//! a bearer token and never triggers another refresh.

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::debug;
use transport::{RequestDescriptor, Transport};

use crate::envelope;
use crate::error::{Error, Result};

/// Body of the refresh request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// `data` of a successful refresh envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: Secret<String>,
    #[serde(default)]
    pub refresh_token: Option<Secret<String>>,
}

/// Exchange `refresh` for a new access token at `url`.
///
/// Any non-2xx status is `Rejected`, carrying the envelope message.
pub async fn refresh_access_token(
    transport: &dyn Transport,
    url: &str,
    refresh: &str,
) -> Result<RefreshedToken> {
    let request = RequestDescriptor::post(url)?.with_json(&RefreshRequest {
        refresh_token: refresh,
    })?;

    let response = transport.send(&request).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Rejected {
            status: status.as_u16(),
            message: envelope::describe_failure(&response),
        });
    }

    let token: RefreshedToken = envelope::decode(response.body())?;
    if token.access_token.expose().is_empty() {
        return Err(Error::InvalidResponse("empty access token".into()));
    }
    debug!(
        rotated_refresh = token.refresh_token.is_some(),
        "refresh exchange succeeded"
    );
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use transport::{Response, SendFuture, StatusCode, TransportError, TransportResult};

    /// Transport answering every request with one canned result.
    struct CannedTransport {
        reply: TransportResult,
        seen: Mutex<Vec<RequestDescriptor>>,
    }

    impl CannedTransport {
        fn new(reply: TransportResult) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for CannedTransport {
        fn id(&self) -> &str {
            "canned"
        }

        fn send<'a>(&'a self, request: &'a RequestDescriptor) -> SendFuture<'a> {
            self.seen.lock().unwrap().push(request.clone());
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    const URL: &str = "http://api.test/api/auth/refresh-token";

    #[tokio::test]
    async fn posts_refresh_token_and_extracts_access_token() {
        let transport = CannedTransport::new(Ok(Response::json(
            StatusCode::OK,
            &serde_json::json!({"success": true, "message": "refreshed", "data": {"accessToken": "A2"}}),
        )));

        let token = refresh_access_token(&transport, URL, "R1").await.unwrap();
        assert_eq!(token.access_token.expose(), "A2");
        assert!(token.refresh_token.is_none());

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method(), transport::Method::POST);
        assert_eq!(seen[0].path(), "/api/auth/refresh-token");
        assert!(seen[0].bearer_token().is_none());
        let body: serde_json::Value =
            serde_json::from_slice(seen[0].body().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"refreshToken": "R1"}));
    }

    #[tokio::test]
    async fn picks_up_rotated_refresh_token() {
        let transport = CannedTransport::new(Ok(Response::json(
            StatusCode::OK,
            &serde_json::json!({"success": true, "message": "ok", "data": {"accessToken": "A2", "refreshToken": "R2"}}),
        )));

        let token = refresh_access_token(&transport, URL, "R1").await.unwrap();
        assert_eq!(token.refresh_token.unwrap().expose(), "R2");
    }

    #[tokio::test]
    async fn rejected_refresh_carries_status_and_message() {
        let transport = CannedTransport::new(Ok(Response::json(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({"success": false, "message": "Invalid refresh token"}),
        )));

        let err = refresh_access_token(&transport, URL, "R1").await.unwrap_err();
        match err {
            Error::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid refresh token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsuccessful_envelope_with_200_is_an_error() {
        let transport = CannedTransport::new(Ok(Response::json(
            StatusCode::OK,
            &serde_json::json!({"success": false, "message": "Token revoked"}),
        )));

        let err = refresh_access_token(&transport, URL, "R1").await.unwrap_err();
        assert!(matches!(err, Error::Unsuccessful(ref m) if m == "Token revoked"));
    }

    #[tokio::test]
    async fn empty_access_token_is_invalid() {
        let transport = CannedTransport::new(Ok(Response::json(
            StatusCode::OK,
            &serde_json::json!({"success": true, "message": "ok", "data": {"accessToken": ""}}),
        )));

        let err = refresh_access_token(&transport, URL, "R1").await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let transport =
            CannedTransport::new(Err(TransportError::Connect("connection refused".into())));

        let err = refresh_access_token(&transport, URL, "R1").await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Connect(_))));
    }

    #[tokio::test]
    async fn invalid_url_fails_before_dispatch() {
        let transport = CannedTransport::new(Err(TransportError::Other("unreachable".into())));

        let err = refresh_access_token(&transport, "not a url", "R1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(transport.seen.lock().unwrap().is_empty());
    }
}
