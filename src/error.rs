//! Connector error types
//!
//! One taxonomy for everything the reconcilers can surface to the host:
//! local validation failures, classified remote rejections, and raw
//! transport errors. Nothing in this crate retries; the host decides
//! what to do with each of these.

use thiserror::Error;

/// Error that can occur during a reconciliation operation.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Local errors, raised before any request is sent.
    /// Opaque identifier does not satisfy the `project:branch` codec rules.
    #[error("malformed identifier {id:?}: expected \"project:branch\" with non-empty components")]
    MalformedIdentifier { id: String },

    /// Numeric access-level code outside the supported tier set.
    #[error("unknown access level code: {code}")]
    UnknownAccessLevel { code: u32 },

    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Remote errors, classified from the response status.
    /// The API refused the request as given (HTTP 400/409/422), e.g. a
    /// protect call for a branch that is already protected.
    #[error("remote rejected the request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// The target does not exist (HTTP 404). Consumed internally wherever
    /// absence is a legal state; surfaced everywhere else.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Credentials were rejected (HTTP 401/403).
    #[error("authentication failed ({status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    /// The API throttled the request (HTTP 429).
    #[error("rate limited by remote api")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success status, surfaced unchanged.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A 2xx response whose body could not be mapped onto the wire model.
    #[error("unexpected response from remote api: {message}")]
    UnexpectedResponse { message: String },

    // Post-delete verification.
    /// Destroy verification re-fetched the record after a delete.
    #[error("resource {id} still exists after delete")]
    ResourceStillExists { id: String },

    // Transport.
    /// Network, TLS, or body-decoding failure, surfaced unchanged.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ConnectorError {
    /// Check whether this error means the target does not exist.
    ///
    /// Idempotent delete, the absent branch of Read, and the destroy
    /// verification probe all treat a not-found as a legal outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConnectorError::NotFound { .. })
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::MalformedIdentifier { .. } => "MALFORMED_IDENTIFIER",
            ConnectorError::UnknownAccessLevel { .. } => "UNKNOWN_ACCESS_LEVEL",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::RemoteRejected { .. } => "REMOTE_REJECTED",
            ConnectorError::NotFound { .. } => "NOT_FOUND",
            ConnectorError::AuthenticationFailed { .. } => "AUTH_FAILED",
            ConnectorError::RateLimited { .. } => "RATE_LIMITED",
            ConnectorError::Api { .. } => "API_ERROR",
            ConnectorError::UnexpectedResponse { .. } => "UNEXPECTED_RESPONSE",
            ConnectorError::ResourceStillExists { .. } => "RESOURCE_STILL_EXISTS",
            ConnectorError::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    // Convenience constructors

    /// Create a malformed identifier error.
    pub fn malformed_identifier(id: impl Into<String>) -> Self {
        ConnectorError::MalformedIdentifier { id: id.into() }
    }

    /// Create a remote rejected error.
    pub fn remote_rejected(status: u16, message: impl Into<String>) -> Self {
        ConnectorError::RemoteRejected {
            status,
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        ConnectorError::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ConnectorError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an unexpected response error.
    pub fn unexpected_response(message: impl Into<String>) -> Self {
        ConnectorError::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// Create a resource still exists error.
    pub fn resource_still_exists(id: impl Into<String>) -> Self {
        ConnectorError::ResourceStillExists { id: id.into() }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
