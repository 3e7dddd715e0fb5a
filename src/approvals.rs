//! Merge request approval configuration reconciliation.
//!
//! Unlike branch protection, a project's approval configuration always
//! exists; GitLab keeps exactly one record per project and the change call
//! replaces the managed flags wholesale. Create, update and destroy all
//! collapse into that single idempotent write.

use tracing::{debug, info};

use crate::client::GitlabClient;
use crate::error::ConnectorResult;
use crate::models::{ApprovalConfiguration, ChangeApprovalsRequest};

/// Desired or observed approval flags of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// Project reference (numeric id or namespaced path) as the host
    /// configured it.
    pub project: String,
    /// Discard existing approvals when new commits are pushed.
    pub reset_approvals_on_push: bool,
    /// Forbid editing the approver list on individual merge requests.
    pub disable_overriding_approvers: bool,
    /// Allow merge request authors to approve their own request.
    pub author_approval_allowed: bool,
}

/// Write the desired approval flags to the project.
///
/// Returns the numeric id of the configuration record alongside the state
/// GitLab reported back. Repeating the call with the same flags leaves the
/// record unchanged, so this serves create and update alike.
pub async fn change(
    client: &GitlabClient,
    desired: &ApprovalPolicy,
) -> ConnectorResult<(u64, ApprovalPolicy)> {
    info!(
        project = %desired.project,
        reset_on_push = desired.reset_approvals_on_push,
        disable_overriding = desired.disable_overriding_approvers,
        author_approval = desired.author_approval_allowed,
        "Changing approval configuration"
    );

    let request = ChangeApprovalsRequest {
        reset_approvals_on_push: desired.reset_approvals_on_push,
        disable_overriding_approvers_per_merge_request: desired.disable_overriding_approvers,
        merge_requests_author_approval: desired.author_approval_allowed,
    };
    let record = client
        .change_approval_configuration(&desired.project, &request)
        .await?;
    Ok((record.id, from_record(&desired.project, &record)))
}

/// Read the current approval flags of a project.
pub async fn read(client: &GitlabClient, project: &str) -> ConnectorResult<ApprovalPolicy> {
    debug!(project = %project, "Reading approval configuration");
    let record = client.approval_configuration(project).await?;
    Ok(from_record(project, &record))
}

/// Reset the approval flags to GitLab's defaults.
///
/// The configuration record cannot be removed, so destroy for this
/// resource means writing every managed flag back to false.
pub async fn reset(client: &GitlabClient, project: &str) -> ConnectorResult<()> {
    info!(project = %project, "Resetting approval configuration to defaults");
    let request = ChangeApprovalsRequest {
        reset_approvals_on_push: false,
        disable_overriding_approvers_per_merge_request: false,
        merge_requests_author_approval: false,
    };
    client
        .change_approval_configuration(project, &request)
        .await?;
    Ok(())
}

/// Adopt the existing approval configuration of a project.
///
/// The project reference is the lookup key; the returned record id is what
/// the host persists as the resource identifier.
pub async fn import(
    client: &GitlabClient,
    project: &str,
) -> ConnectorResult<(u64, ApprovalPolicy)> {
    let record = client.approval_configuration(project).await?;
    Ok((record.id, from_record(project, &record)))
}

fn from_record(project: &str, record: &ApprovalConfiguration) -> ApprovalPolicy {
    ApprovalPolicy {
        project: project.to_string(),
        reset_approvals_on_push: record.reset_approvals_on_push,
        disable_overriding_approvers: record.disable_overriding_approvers_per_merge_request,
        author_approval_allowed: record.merge_requests_author_approval,
    }
}
