//! Common types shared by the session workspace crates

mod secret;
mod error;

pub use secret::Secret;
pub use error::{Error, Result};
