//! HTTP implementation of [`Authenticator`].
//!
//! ```text
//! POST {base}/users/login   {"id": ..., "pw": ...}   -> {"api-key": "..."}
//! POST {base}/keepalive     { }  (header api-key)    -> 2xx while valid
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use vabridge_core::Credential;
use vabridge_settings::ApplianceSettings;

use crate::Authenticator;
use crate::errors::AuthError;

/// Name of the credential field in the login response and keepalive header.
pub const API_KEY: &str = "api-key";

/// Endpoints and transport options for [`HttpAuthenticator`].
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// `http(s)://host:port`.
    pub base_url: String,
    /// Login path.
    pub login_path: String,
    /// Keepalive path.
    pub keepalive_path: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Skip certificate validation.
    pub accept_invalid_certs: bool,
}

impl AuthConfig {
    /// Build from appliance settings.
    pub fn from_settings(settings: &ApplianceSettings) -> Self {
        Self {
            base_url: settings.http_base(),
            login_path: settings.login_path.clone(),
            keepalive_path: settings.keepalive_path.clone(),
            timeout: settings.request_timeout(),
            accept_invalid_certs: settings.accept_invalid_certs,
        }
    }

    fn login_url(&self) -> String {
        format!("{}{}", self.base_url, self.login_path)
    }

    fn keepalive_url(&self) -> String {
        format!("{}{}", self.base_url, self.keepalive_path)
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    id: &'a str,
    pw: &'a str,
}

/// Talks to the appliance's login and keepalive endpoints.
pub struct HttpAuthenticator {
    config: AuthConfig,
    client: reqwest::Client,
}

impl HttpAuthenticator {
    /// Create an authenticator with its own connection pool.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { config, client })
    }

    /// Endpoint configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    #[tracing::instrument(skip_all, fields(identity = %identity))]
    async fn authenticate(&self, identity: &str, secret: &str) -> Result<Credential, AuthError> {
        let resp = self
            .client
            .post(self.config.login_url())
            .json(&LoginRequest {
                id: identity,
                pw: secret,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "login rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        let credential = body
            .get(API_KEY)
            .and_then(Value::as_str)
            .map(Credential::new)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredential)?;
        debug!(credential = %credential.redacted(), "login succeeded");
        Ok(credential)
    }

    #[tracing::instrument(skip_all, fields(credential = %credential.redacted()))]
    async fn probe(&self, credential: &Credential) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(self.config.keepalive_url())
            .header(API_KEY, credential.expose())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{ }")
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "keepalive accepted");
            Ok(())
        } else {
            Err(AuthError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
