//! Post-destroy verification.
//!
//! A destroy only counts once the remote agrees the record is gone. The
//! probe here fetches the rule directly and treats not-found as the sole
//! passing answer; a surviving record or any other failure fails the
//! check.

use tracing::debug;

use crate::client::GitlabClient;
use crate::error::{ConnectorError, ConnectorResult};
use crate::ids::BranchProtectionId;

/// Verify that a branch protection rule no longer exists.
///
/// Returns [`ConnectorError::ResourceStillExists`] when the remote still
/// reports the rule. Errors other than not-found surface unchanged; an
/// unreachable remote proves nothing about the destroy.
pub async fn ensure_destroyed(
    client: &GitlabClient,
    id: &BranchProtectionId,
) -> ConnectorResult<()> {
    debug!(id = %id, "Verifying branch protection is gone");
    match client.get_protected_branch(id.project(), id.branch()).await {
        Ok(_) => Err(ConnectorError::resource_still_exists(id.to_string())),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}
