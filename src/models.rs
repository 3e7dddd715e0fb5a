//! Wire models for the endpoints the reconcilers call.
//!
//! Field names follow the remote API's JSON shape verbatim; translation to
//! host-facing types happens in the resource modules.

use serde::{Deserialize, Serialize};

/// One protection record as reported by the list and get endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedBranch {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub push_access_levels: Vec<BranchAccessDescriptor>,
    #[serde(default)]
    pub merge_access_levels: Vec<BranchAccessDescriptor>,
}

/// One entry of a protection record's access-level list.
///
/// The wire carries the numeric code next to its human-readable description;
/// only the code feeds the tier mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchAccessDescriptor {
    pub access_level: u32,
    #[serde(default)]
    pub access_level_description: String,
}

/// Body of a protect call.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectBranchRequest {
    pub name: String,
    pub push_access_level: u32,
    pub merge_access_level: u32,
}

/// Per-project merge-request approval configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfiguration {
    /// Numeric id of the configuration record, the identifier the host
    /// persists for the approval-policy resource.
    pub id: u64,
    #[serde(default)]
    pub reset_approvals_on_push: bool,
    #[serde(default)]
    pub disable_overriding_approvers_per_merge_request: bool,
    #[serde(default)]
    pub merge_requests_author_approval: bool,
}

/// Body of a change-approval-configuration call. Always carries the full
/// desired configuration; the remote side overwrites whatever existed.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeApprovalsRequest {
    pub reset_approvals_on_push: bool,
    pub disable_overriding_approvers_per_merge_request: bool,
    pub merge_requests_author_approval: bool,
}
