use core::str::FromStr;

use serde::{Deserialize, Serialize};

use epicevents_core::DomainError;

/// Department an employee belongs to.
///
/// Closed set: the department decides the default capability set and which
/// rows an employee sees in scoped lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Department {
    Commercial,
    Support,
    Gestion,
}

impl Department {
    pub const ALL: [Department; 3] = [
        Department::Commercial,
        Department::Support,
        Department::Gestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Commercial => "COMMERCIAL",
            Department::Support => "SUPPORT",
            Department::Gestion => "GESTION",
        }
    }
}

impl core::fmt::Display for Department {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = DomainError;

    /// Case-insensitive: "gestion", "Gestion" and "GESTION" are the same department.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COMMERCIAL" => Ok(Department::Commercial),
            "SUPPORT" => Ok(Department::Support),
            "GESTION" => Ok(Department::Gestion),
            other => Err(DomainError::validation(format!(
                "unknown department '{other}' (expected COMMERCIAL, SUPPORT or GESTION)"
            ))),
        }
    }
}
