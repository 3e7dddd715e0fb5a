//! Connector configuration
//!
//! Connection settings and credentials for one GitLab-style API endpoint.
//! The host constructs a [`GitlabConfig`], validates it, and hands it to
//! [`crate::client::GitlabClient::new`]; nothing here is process-global.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

/// Credentials attached to every API request.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitlabAuth {
    /// Personal or project access token, sent as the `PRIVATE-TOKEN` header.
    PrivateToken { token: String },
    /// OAuth access token, sent as `Authorization: Bearer`.
    Bearer { token: String },
}

impl GitlabAuth {
    /// Create private-token credentials.
    pub fn private_token(token: impl Into<String>) -> Self {
        GitlabAuth::PrivateToken {
            token: token.into(),
        }
    }

    /// Create bearer-token credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        GitlabAuth::Bearer {
            token: token.into(),
        }
    }

    /// Attach these credentials to an outgoing request.
    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            GitlabAuth::PrivateToken { token } => request.header("PRIVATE-TOKEN", token),
            GitlabAuth::Bearer { token } => request.bearer_auth(token),
        }
    }

    fn token(&self) -> &str {
        match self {
            GitlabAuth::PrivateToken { token } | GitlabAuth::Bearer { token } => token,
        }
    }

    /// Copy with the secret replaced, safe to log or echo back.
    pub fn redacted(&self) -> Self {
        match self {
            GitlabAuth::PrivateToken { .. } => GitlabAuth::PrivateToken {
                token: "***REDACTED***".to_string(),
            },
            GitlabAuth::Bearer { .. } => GitlabAuth::Bearer {
                token: "***REDACTED***".to_string(),
            },
        }
    }
}

// Manual Debug so a token never reaches log output.
impl fmt::Debug for GitlabAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitlabAuth::PrivateToken { .. } => f
                .debug_struct("PrivateToken")
                .field("token", &"***")
                .finish(),
            GitlabAuth::Bearer { .. } => {
                f.debug_struct("Bearer").field("token", &"***").finish()
            }
        }
    }
}

/// Configuration for one remote API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitlabConfig {
    /// Base URL of the API, e.g. `https://gitlab.example.com/api/v4`.
    pub base_url: String,

    /// Credentials for the endpoint.
    pub auth: GitlabAuth,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Verify TLS certificates. Disable only against test fixtures.
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tls_verify() -> bool {
    true
}

impl GitlabConfig {
    /// Create a config with required fields and default connection settings.
    pub fn new(base_url: impl Into<String>, auth: GitlabAuth) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            timeout_secs: default_timeout_secs(),
            tls_verify: default_tls_verify(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set TLS certificate verification.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Validate the configuration before building a client from it.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.base_url.is_empty() {
            return Err(ConnectorError::invalid_configuration("base_url is required"));
        }

        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ConnectorError::invalid_configuration(format!("invalid base_url: {e}"))
        })?;

        let scheme = url.scheme();
        if scheme != "https" && scheme != "http" {
            return Err(ConnectorError::invalid_configuration(format!(
                "unsupported scheme: {scheme}"
            )));
        }

        if self.auth.token().is_empty() {
            return Err(ConnectorError::invalid_configuration(
                "auth token is required",
            ));
        }

        Ok(())
    }

    /// Copy with credentials redacted, safe to log or echo back.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.auth = config.auth.redacted();
        config
    }
}
