//! Auth endpoint paths and storage keys
//!
//! Paths are relative to the API base URL. All five endpoints answer with the
//! uniform envelope described in `envelope`.

use serde::Deserialize;

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const CURRENT_USER_PATH: &str = "/auth/me";
pub const REFRESH_PATH: &str = "/auth/refresh-token";

/// Key under which the credential pair is persisted in the key-value backend.
/// Both tokens live under one key so a pair is always written atomically.
pub const CREDENTIALS_KEY: &str = "credentials";

/// Auth endpoint table, overridable per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub register: String,
    pub login: String,
    pub logout: String,
    pub me: String,
    pub refresh: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            register: REGISTER_PATH.into(),
            login: LOGIN_PATH.into(),
            logout: LOGOUT_PATH.into(),
            me: CURRENT_USER_PATH.into(),
            refresh: REFRESH_PATH.into(),
        }
    }
}
