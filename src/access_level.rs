//! Access-level tiers for protected branches.
//!
//! The wire format carries a tier as a numeric code next to a human-readable
//! description; host configuration refers to tiers by their lowercase names.
//! Both mappings are total over the supported set; an unmapped numeric code
//! is a defect, never silently coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ConnectorError, ConnectorResult};

/// Ordered permission tier controlling who may push to or merge into a
/// protected branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Nobody may perform the action.
    #[serde(rename = "no one")]
    NoAccess,
    Developer,
    Maintainer,
    /// Administrators only.
    Admin,
}

impl AccessLevel {
    /// All supported tiers, in ascending order of privilege.
    pub const ALL: [AccessLevel; 4] = [
        AccessLevel::NoAccess,
        AccessLevel::Developer,
        AccessLevel::Maintainer,
        AccessLevel::Admin,
    ];

    /// Numeric code used by the protected-branch endpoints.
    pub fn as_code(&self) -> u32 {
        match self {
            AccessLevel::NoAccess => 0,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Admin => 60,
        }
    }

    /// Map a wire code back to its tier.
    pub fn from_code(code: u32) -> ConnectorResult<Self> {
        match code {
            0 => Ok(AccessLevel::NoAccess),
            30 => Ok(AccessLevel::Developer),
            40 => Ok(AccessLevel::Maintainer),
            60 => Ok(AccessLevel::Admin),
            _ => Err(ConnectorError::UnknownAccessLevel { code }),
        }
    }

    /// Get the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::NoAccess => "no one",
            AccessLevel::Developer => "developer",
            AccessLevel::Maintainer => "maintainer",
            AccessLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = ParseAccessLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no one" => Ok(AccessLevel::NoAccess),
            "developer" => Ok(AccessLevel::Developer),
            "maintainer" => Ok(AccessLevel::Maintainer),
            // Deprecated vocabulary still found in older configurations.
            "master" => Ok(AccessLevel::Maintainer),
            "admin" => Ok(AccessLevel::Admin),
            _ => Err(ParseAccessLevelError {
                value: s.to_string(),
            }),
        }
    }
}

/// Error returned when parsing an unknown access-level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown access level name: {value:?}")]
pub struct ParseAccessLevelError {
    pub value: String,
}
