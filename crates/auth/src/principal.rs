use std::collections::BTreeSet;

use serde::Serialize;

use epicevents_core::EmployeeId;

use crate::{Department, Employee, Permission};

/// A verified caller, resolved against the credential store.
///
/// Department and grants are the employee's *current* values at verification
/// time; nothing here is taken from the token beyond the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub employee_id: EmployeeId,
    pub username: String,
    pub department: Department,
    pub grants: BTreeSet<Permission>,
}

impl Principal {
    pub fn from_employee(employee: &Employee, grants: BTreeSet<Permission>) -> Self {
        Self {
            employee_id: employee.id,
            username: employee.username.clone(),
            department: employee.department,
            grants,
        }
    }

    /// Whether the exact capability code is among the current grants.
    pub fn holds(&self, permission: &Permission) -> bool {
        self.grants.contains(permission)
    }

    pub fn is(&self, department: Department) -> bool {
        self.department == department
    }
}
