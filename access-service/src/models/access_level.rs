//! Access levels granted to platform users.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The functional area a user works in. Lower-case on the wire and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Inspection,
    Maintenance,
    Leadership,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Inspection => "inspection",
            AccessLevel::Maintenance => "maintenance",
            AccessLevel::Leadership => "leadership",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inspection" => Ok(AccessLevel::Inspection),
            "maintenance" => Ok(AccessLevel::Maintenance),
            "leadership" => Ok(AccessLevel::Leadership),
            _ => Err(format!("Invalid access level: {}", s)),
        }
    }
}
