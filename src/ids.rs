//! Composite identifier for protected-branch resources.
//!
//! The host persists exactly one string per managed resource; for branch
//! protection that string packs the two-part remote key `(project, branch)`
//! as `"{project}:{branch}"`. Encoding and decoding are pure and perform no
//! normalization; components pass through verbatim.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConnectorError, ConnectorResult};

/// Separator between project reference and branch name. `:` is not legal
/// inside a project path or a git ref name, so the split is unambiguous.
const SEPARATOR: char = ':';

/// Opaque identifier for one protected-branch rule.
///
/// Assigned at first Create (or supplied at Import) and immutable for the
/// lifetime of the resource; it is the only correlation key the host keeps
/// between its configuration and the remote record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchProtectionId {
    project: String,
    branch: String,
}

impl BranchProtectionId {
    /// Build an identifier from its components.
    ///
    /// Fails with [`ConnectorError::MalformedIdentifier`] when a component
    /// is empty or contains the separator.
    pub fn new(project: impl Into<String>, branch: impl Into<String>) -> ConnectorResult<Self> {
        let project = project.into();
        let branch = branch.into();
        if project.is_empty()
            || branch.is_empty()
            || project.contains(SEPARATOR)
            || branch.contains(SEPARATOR)
        {
            return Err(ConnectorError::malformed_identifier(format!(
                "{project}{SEPARATOR}{branch}"
            )));
        }
        Ok(Self { project, branch })
    }

    /// Decode a rendered identifier.
    ///
    /// Splits on the first separator; fails with
    /// [`ConnectorError::MalformedIdentifier`] when the separator is absent
    /// or either side is empty.
    pub fn parse(id: &str) -> ConnectorResult<Self> {
        match id.split_once(SEPARATOR) {
            Some((project, branch)) if !project.is_empty() && !branch.is_empty() => Ok(Self {
                project: project.to_string(),
                branch: branch.to_string(),
            }),
            _ => Err(ConnectorError::malformed_identifier(id)),
        }
    }

    /// Project reference (numeric id or namespaced path).
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Branch name the protection applies to.
    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl fmt::Display for BranchProtectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.project, SEPARATOR, self.branch)
    }
}

impl FromStr for BranchProtectionId {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
