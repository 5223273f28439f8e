//! Session credential and auth endpoint library
//!
//! Provides the credential store, its persistence backends, the backend
//! response envelope, auth endpoint payloads, and the refresh token exchange.
//! This crate has no knowledge of request retry; it can be tested and used
//! independently of the session client.
//!
//! Credential flow:
//! 1. Host opens a backend (`storage::FileKeyValueStore::open()`)
//! 2. `credentials::CredentialStore::load()` restores a persisted pair
//! 3. Login stores a fresh pair via `CredentialStore::set()`
//! 4. On expiry `token::refresh_access_token()` exchanges the refresh token
//! 5. The new access token is installed via `CredentialStore::rotate()`
//! 6. Logout or invalidation removes the pair via `CredentialStore::clear()`

pub mod account;
pub mod credentials;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod storage;
pub mod token;

pub use account::{AuthData, LoginRequest, RegisterRequest, User};
pub use credentials::{CredentialStore, Credentials};
pub use endpoints::{CREDENTIALS_KEY, Endpoints};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageFuture};
pub use token::{RefreshedToken, refresh_access_token};
