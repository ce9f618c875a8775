use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Employee role.
///
/// The set is closed: an unknown role name is rejected at parse time and never
/// reaches the policy layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Management,
    Sales,
    Support,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Management, Role::Sales, Role::Support];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Management => "MANAGEMENT",
            Role::Sales => "SALES",
            Role::Support => "SUPPORT",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MANAGEMENT" => Ok(Role::Management),
            "SALES" => Ok(Role::Sales),
            "SUPPORT" => Ok(Role::Support),
            other => Err(DomainError::parse(format!(
                "unknown role '{other}' (expected MANAGEMENT, SALES or SUPPORT)"
            ))),
        }
    }
}
