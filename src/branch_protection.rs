//! Branch protection reconciliation.
//!
//! GitLab exposes no update call for protected branches, so convergence to
//! a changed access level is a replace: unprotect the branch, then protect
//! it again with the desired levels. Every operation here takes the
//! composite identifier from [`crate::ids`] or produces one for the host to
//! persist.

use tracing::{debug, info, warn};

use crate::access_level::AccessLevel;
use crate::client::GitlabClient;
use crate::error::{ConnectorError, ConnectorResult};
use crate::ids::BranchProtectionId;
use crate::models::{BranchAccessDescriptor, ProtectBranchRequest, ProtectedBranch};

/// Desired or observed protection state of one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchProtection {
    /// Project reference (numeric id or namespaced path) as the host
    /// configured it.
    pub project: String,
    /// Branch name. Wildcard patterns pass through to GitLab untouched.
    pub branch: String,
    /// Minimum level required to push to the branch.
    pub push_access_level: AccessLevel,
    /// Minimum level required to merge into the branch.
    pub merge_access_level: AccessLevel,
}

/// Protect a branch with the desired access levels.
///
/// Returns the identifier the host must persist alongside the state GitLab
/// reported back. Protecting an already-protected branch is rejected by
/// GitLab with a conflict, surfaced as [`ConnectorError::RemoteRejected`].
pub async fn create(
    client: &GitlabClient,
    desired: &BranchProtection,
) -> ConnectorResult<(BranchProtectionId, BranchProtection)> {
    let id = BranchProtectionId::new(&desired.project, &desired.branch)?;
    info!(
        project = %desired.project,
        branch = %desired.branch,
        push = %desired.push_access_level,
        merge = %desired.merge_access_level,
        "Protecting branch"
    );

    let request = ProtectBranchRequest {
        name: desired.branch.clone(),
        push_access_level: desired.push_access_level.as_code(),
        merge_access_level: desired.merge_access_level.as_code(),
    };
    let record = client.protect_branch(&desired.project, &request).await?;
    let state = from_record(&desired.project, &record)?;
    Ok((id, state))
}

/// Read the current protection state for an identifier.
///
/// Lists the project's protected branches and matches on the exact branch
/// name. Returns `Ok(None)` when no rule with that name exists; errors from
/// the list call itself (including a missing project) surface unchanged.
pub async fn read(
    client: &GitlabClient,
    id: &BranchProtectionId,
) -> ConnectorResult<Option<BranchProtection>> {
    debug!(project = %id.project(), branch = %id.branch(), "Reading branch protection");
    let branches = client.list_protected_branches(id.project()).await?;
    match branches.iter().find(|b| b.name == id.branch()) {
        Some(record) => from_record(id.project(), record).map(Some),
        None => Ok(None),
    }
}

/// Replace the protection rule with the desired access levels.
///
/// The identifying fields of `desired` must match `id`; changing project or
/// branch is a destroy-and-create decided by the host, not an update. The
/// replace is not atomic: between the unprotect and the re-protect the
/// branch is briefly unprotected, and if the re-protect fails it stays
/// that way until the host converges again.
pub async fn update(
    client: &GitlabClient,
    id: &BranchProtectionId,
    desired: &BranchProtection,
) -> ConnectorResult<BranchProtection> {
    info!(id = %id, "Replacing branch protection");

    // 1. Drop the existing rule. Already-absent is fine for a replace.
    delete(client, id).await?;

    // 2. Re-protect with the desired levels.
    match create(client, desired).await {
        Ok((_, state)) => Ok(state),
        Err(e) => {
            warn!(
                id = %id,
                error = %e,
                "Re-protect failed after unprotect, branch is left unprotected"
            );
            Err(e)
        }
    }
}

/// Remove the protection rule.
///
/// A rule that is already gone counts as success, so deletes are safe to
/// repeat.
pub async fn delete(client: &GitlabClient, id: &BranchProtectionId) -> ConnectorResult<()> {
    info!(project = %id.project(), branch = %id.branch(), "Unprotecting branch");
    match client.unprotect_branch(id.project(), id.branch()).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!(id = %id, "Branch protection already absent");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Adopt an existing rule from its rendered identifier.
///
/// Decodes the identifier and reads the remote state in one step; the host
/// uses this to bring unmanaged rules under management.
pub async fn import(
    client: &GitlabClient,
    id: &str,
) -> ConnectorResult<(BranchProtectionId, Option<BranchProtection>)> {
    let id = BranchProtectionId::parse(id)?;
    let state = read(client, &id).await?;
    Ok((id, state))
}

/// Map a wire record onto the connector's view of the rule.
///
/// GitLab reports a list of descriptors per action; the first entry of each
/// list carries the tier this connector manages.
fn from_record(project: &str, record: &ProtectedBranch) -> ConnectorResult<BranchProtection> {
    let push = first_level(&record.push_access_levels, "push", &record.name)?;
    let merge = first_level(&record.merge_access_levels, "merge", &record.name)?;
    Ok(BranchProtection {
        project: project.to_string(),
        branch: record.name.clone(),
        push_access_level: push,
        merge_access_level: merge,
    })
}

fn first_level(
    levels: &[BranchAccessDescriptor],
    action: &str,
    branch: &str,
) -> ConnectorResult<AccessLevel> {
    let descriptor = levels.first().ok_or_else(|| {
        ConnectorError::unexpected_response(format!(
            "protected branch {branch:?} has no {action} access levels"
        ))
    })?;
    AccessLevel::from_code(descriptor.access_level)
}
