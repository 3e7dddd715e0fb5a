//! GitLab policy connector.
//!
//! Reconciles branch-protection rules and merge request approval settings
//! against desired state supplied by a host orchestrator. The host owns
//! planning, persistence and retries; this crate owns the GitLab API
//! conversation, the status-code error taxonomy, and the identifier codec
//! the host stores.

pub mod access_level;
pub mod approvals;
pub mod branch_protection;
pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod verify;

pub use access_level::AccessLevel;
pub use approvals::ApprovalPolicy;
pub use branch_protection::BranchProtection;
pub use client::GitlabClient;
pub use config::{GitlabAuth, GitlabConfig};
pub use error::{ConnectorError, ConnectorResult};
pub use ids::BranchProtectionId;
