use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Department;

/// Capability code (e.g. "manage_clients").
///
/// Codes are opaque strings on the wire and in storage; the canonical set is
/// the [`CATALOG`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const MANAGE_USERS: Permission = Permission::from_static("manage_users");
    pub const DELETE_USERS: Permission = Permission::from_static("delete_users");
    pub const MANAGE_CONTRACTS: Permission = Permission::from_static("manage_contracts");
    pub const MANAGE_CLIENTS: Permission = Permission::from_static("manage_clients");
    pub const MANAGE_EVENTS: Permission = Permission::from_static("manage_events");
    pub const READ_CLIENTS: Permission = Permission::from_static("read_clients");
    pub const READ_CONTRACTS: Permission = Permission::from_static("read_contracts");
    pub const READ_EVENTS: Permission = Permission::from_static("read_events");

    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read-scope capabilities (`read_*`) exist for symmetry and audit; they never gate.
    pub fn is_read_scope(&self) -> bool {
        self.as_str().starts_with("read_")
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog entry (for seeding and display).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDefinition {
    pub code: &'static str,
    pub description: &'static str,
}

/// The canonical capability set, seeded once per store.
pub const CATALOG: [PermissionDefinition; 8] = [
    PermissionDefinition { code: "manage_users", description: "Create and modify employees" },
    PermissionDefinition { code: "delete_users", description: "Delete employees" },
    PermissionDefinition { code: "manage_contracts", description: "Create and modify contracts" },
    PermissionDefinition { code: "manage_clients", description: "Create and modify clients" },
    PermissionDefinition { code: "manage_events", description: "Create and modify events" },
    PermissionDefinition { code: "read_clients", description: "List and view clients" },
    PermissionDefinition { code: "read_contracts", description: "List and view contracts" },
    PermissionDefinition { code: "read_events", description: "List and view events" },
];

const READ_ALL: [Permission; 3] = [
    Permission::READ_CLIENTS,
    Permission::READ_CONTRACTS,
    Permission::READ_EVENTS,
];

/// Capability set granted by a department. Pure function of the enum.
pub fn derive_for_department(department: Department) -> BTreeSet<Permission> {
    let mut set: BTreeSet<Permission> = READ_ALL.into_iter().collect();
    match department {
        Department::Commercial => {
            set.insert(Permission::MANAGE_CLIENTS);
        }
        Department::Support => {
            set.insert(Permission::MANAGE_EVENTS);
        }
        Department::Gestion => {
            set.extend([
                Permission::MANAGE_USERS,
                Permission::DELETE_USERS,
                Permission::MANAGE_CONTRACTS,
                Permission::MANAGE_CLIENTS,
                Permission::MANAGE_EVENTS,
            ]);
        }
    }
    set
}

pub fn describe(code: &str) -> Option<&'static str> {
    CATALOG.iter().find(|d| d.code == code).map(|d| d.description)
}
