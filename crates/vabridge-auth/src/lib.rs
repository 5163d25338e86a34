//! # vabridge-auth
//!
//! Session authentication against the video-analytics appliance.
//!
//! - [`Authenticator::authenticate`] trades identity/secret for a [`Credential`]
//! - [`Authenticator::probe`] proves a credential is still accepted (keepalive)
//!
//! Neither call retries. Retry and restart policy belongs to the session
//! orchestrator.
//!
//! [`Credential`]: vabridge_core::Credential

#![deny(unsafe_code)]

pub mod errors;
pub mod http;

use async_trait::async_trait;
use vabridge_core::Credential;

pub use errors::AuthError;
pub use http::{AuthConfig, HttpAuthenticator};

/// Obtains and validates session credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Log in and return a fresh credential.
    async fn authenticate(&self, identity: &str, secret: &str) -> Result<Credential, AuthError>;

    /// Check that `credential` is still valid.
    async fn probe(&self, credential: &Credential) -> Result<(), AuthError>;
}
