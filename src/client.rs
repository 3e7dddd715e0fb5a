//! GitLab HTTP client (reqwest-based).
//!
//! Provides a `GitlabClient` that talks to the GitLab REST API v4 endpoints
//! backing branch protection and merge request approval settings.

use crate::config::{GitlabAuth, GitlabConfig};
use crate::error::{ConnectorError, ConnectorResult};
use crate::models::{
    ApprovalConfiguration, ChangeApprovalsRequest, ProtectBranchRequest, ProtectedBranch,
};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// GitLab REST API client for policy resources.
///
/// Wraps `reqwest::Client` with the protected-branch and approval-settings
/// calls the reconcilers need, plus status-code to error mapping.
#[derive(Debug, Clone)]
pub struct GitlabClient {
    /// Base URL of the GitLab API (e.g., "<https://gitlab.example.com/api/v4>").
    base_url: String,
    /// Authentication handler.
    auth: GitlabAuth,
    /// Underlying HTTP client.
    http_client: Client,
}

impl GitlabClient {
    /// Create a new GitLab client from a validated configuration.
    pub fn new(config: &GitlabConfig) -> ConnectorResult<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.tls_verify)
            .user_agent("gitlab-policy-connector/0.1")
            .build()
            .map_err(|e| {
                ConnectorError::invalid_configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        // Normalize base URL: strip trailing slash.
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            auth: config.auth.clone(),
            http_client,
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(base_url: String, auth: GitlabAuth, http_client: Client) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            auth,
            http_client,
        }
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Protected Branches ────────────────────────────────────────────

    /// List all protected branches of a project
    /// (GET /projects/:project/protected_branches).
    pub async fn list_protected_branches(
        &self,
        project: &str,
    ) -> ConnectorResult<Vec<ProtectedBranch>> {
        let url = format!(
            "{}/projects/{}/protected_branches",
            self.base_url,
            escape_path_segment(project)
        );
        self.get(&url).await
    }

    /// Get a single protected branch by name
    /// (GET /projects/:project/protected_branches/:branch).
    pub async fn get_protected_branch(
        &self,
        project: &str,
        branch: &str,
    ) -> ConnectorResult<ProtectedBranch> {
        let url = format!(
            "{}/projects/{}/protected_branches/{}",
            self.base_url,
            escape_path_segment(project),
            escape_path_segment(branch)
        );
        self.get(&url).await
    }

    /// Protect a branch (POST /projects/:project/protected_branches).
    ///
    /// GitLab rejects the call with 409 when the branch is already
    /// protected; callers must unprotect first to change access levels.
    pub async fn protect_branch(
        &self,
        project: &str,
        request: &ProtectBranchRequest,
    ) -> ConnectorResult<ProtectedBranch> {
        let url = format!(
            "{}/projects/{}/protected_branches",
            self.base_url,
            escape_path_segment(project)
        );
        self.post(&url, request).await
    }

    /// Unprotect a branch
    /// (DELETE /projects/:project/protected_branches/:branch).
    pub async fn unprotect_branch(&self, project: &str, branch: &str) -> ConnectorResult<()> {
        let url = format!(
            "{}/projects/{}/protected_branches/{}",
            self.base_url,
            escape_path_segment(project),
            escape_path_segment(branch)
        );
        self.delete(&url).await
    }

    // ── Approvals ─────────────────────────────────────────────────────

    /// Get the approval configuration of a project
    /// (GET /projects/:project/approvals).
    pub async fn approval_configuration(
        &self,
        project: &str,
    ) -> ConnectorResult<ApprovalConfiguration> {
        let url = format!(
            "{}/projects/{}/approvals",
            self.base_url,
            escape_path_segment(project)
        );
        self.get(&url).await
    }

    /// Change the approval configuration of a project
    /// (POST /projects/:project/approvals).
    ///
    /// GitLab treats this as a full replace of the listed flags, so the
    /// same request can serve create, update and reset.
    pub async fn change_approval_configuration(
        &self,
        project: &str,
        request: &ChangeApprovalsRequest,
    ) -> ConnectorResult<ApprovalConfiguration> {
        let url = format!(
            "{}/projects/{}/approvals",
            self.base_url,
            escape_path_segment(project)
        );
        self.post(&url, request).await
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str) -> ConnectorResult<T> {
        debug!("GitLab GET {}", url);
        let builder = self.http_client.get(url);
        let builder = self.auth.apply(builder);
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> ConnectorResult<T> {
        debug!("GitLab POST {}", url);
        let builder = self.http_client.post(url);
        let builder = self.auth.apply(builder);
        let response = builder.json(body).send().await?;
        self.handle_response(response).await
    }

    async fn delete(&self, url: &str) -> ConnectorResult<()> {
        debug!("GitLab DELETE {}", url);
        let builder = self.http_client.delete(url);
        let builder = self.auth.apply(builder);
        let response = builder.send().await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response).await
        }
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ConnectorResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                ConnectorError::unexpected_response(format!("Failed to parse response: {e}"))
            })
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> ConnectorResult<T> {
        let status = response.status();

        // Check for Retry-After header (rate limiting).
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        let message = extract_error_message(&body, status);

        match status {
            StatusCode::NOT_FOUND => Err(ConnectorError::not_found(message)),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ConnectorError::remote_rejected(status.as_u16(), message))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("GitLab rate limited, retry after {:?}s", retry_after);
                Err(ConnectorError::RateLimited {
                    retry_after_secs: retry_after,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ConnectorError::AuthenticationFailed {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => Err(ConnectorError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

/// Extract a human-readable message from a GitLab error body.
///
/// GitLab error payloads carry either `{"message": ...}` or
/// `{"error": ...}`; the message value may itself be a validation object.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message") {
            return match message.as_str() {
                Some(s) => s.to_string(),
                None => message.to_string(),
            };
        }
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return error.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

/// Percent-encode a value for use as a single URL path segment.
///
/// GitLab accepts the URL-encoded full path of a project in place of its
/// numeric ID, so "group/project" must travel as "group%2Fproject".
fn escape_path_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                escaped.push(byte as char);
            }
            _ => escaped.push_str(&format!("%{byte:02X}")),
        }
    }
    escaped
}
