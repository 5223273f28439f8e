//! Auth endpoints: register, login, logout, current user
//!
//! Register and login are public calls: they carry no bearer token and a 401
//! from them (wrong password) is terminal, never a refresh trigger. Logout is
//! user-initiated teardown and ends the session without the session-ended
//! signal.

use std::sync::Arc;

use session_auth::{AuthData, LoginRequest, RegisterRequest, User};
use tracing::{info, warn};

use crate::client::SessionClient;
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct AuthApi {
    client: Arc<SessionClient>,
}

impl AuthApi {
    pub fn new(client: Arc<SessionClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<SessionClient> {
        &self.client
    }

    /// Create an account. Tokens are stored when the backend issues them.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let descriptor = self
            .client
            .post_json(&self.client.endpoints().register, request)?;
        let data: AuthData = self.client.fetch_public(&descriptor).await?;

        if let Some(credentials) = data.credentials() {
            self.client.store().set(credentials).await;
        }
        let user = data
            .user
            .ok_or_else(|| Error::Decode("register response carries no user".into()))?;
        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Log in and store the issued token pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let descriptor = self.client.post_json(
            &self.client.endpoints().login,
            &LoginRequest { email, password },
        )?;
        let data: AuthData = self.client.fetch_public(&descriptor).await?;

        let credentials = data
            .credentials()
            .ok_or_else(|| Error::Decode("login response carries no token pair".into()))?;
        self.client.store().set(credentials).await;

        let user = match data.user {
            Some(user) => user,
            None => self.current_user().await?,
        };
        info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    /// Tell the backend, then clear local credentials whatever it answered.
    ///
    /// The logout call never refreshes, so an expired access token cannot
    /// turn a user's own logout into a session-ended signal.
    pub async fn logout(&self) {
        if !self.client.store().is_authenticated().await {
            return;
        }

        let result = match self.client.request(
            transport::Method::POST,
            &self.client.endpoints().logout,
        ) {
            Ok(descriptor) => self
                .client
                .send_without_refresh(&descriptor)
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(error = %e, "logout request failed, clearing local session anyway");
        }

        self.client.store().clear().await;
        info!("logged out");
    }

    pub async fn current_user(&self) -> Result<User> {
        let descriptor = self.client.get(&self.client.endpoints().me)?;
        self.client.fetch(&descriptor).await
    }
}
