//! Permission catalog: seeding and department-driven grant derivation.

use serde::{Deserialize, Serialize};

use epicevents_core::{DomainError, DomainResult, EmployeeId};

use crate::permissions::{CATALOG, derive_for_department};
use crate::{Employee, Permission};

/// Stored permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub code: Permission,
    pub description: String,
}

/// Storage seam for permission records and grants.
pub trait PermissionStore {
    fn has_permission(&self, code: &Permission) -> bool;

    fn insert_permission(&mut self, record: PermissionRecord);

    fn clear_grants(&mut self, employee_id: &EmployeeId);

    /// Grant a seeded capability. Implementors reject unknown codes with `Internal`.
    fn grant(&mut self, employee_id: &EmployeeId, code: Permission) -> DomainResult<()>;
}

/// Create each canonical capability record that does not exist yet.
///
/// Never updates or removes. Returns how many records were created.
pub fn ensure_seeded<S>(store: &mut S) -> usize
where
    S: PermissionStore + ?Sized,
{
    let mut created = 0;
    for def in CATALOG {
        let code = Permission::from_static(def.code);
        if store.has_permission(&code) {
            continue;
        }
        store.insert_permission(PermissionRecord {
            code,
            description: def.description.to_string(),
        });
        created += 1;
    }
    if created > 0 {
        tracing::info!(created, "seeded permission catalog");
    }
    created
}

/// Clear all grants of `employee` and re-apply exactly the derived set.
pub fn reassign<S>(store: &mut S, employee: &Employee) -> DomainResult<()>
where
    S: PermissionStore + ?Sized,
{
    let derived = derive_for_department(employee.department);
    if let Some(missing) = derived.iter().find(|p| !store.has_permission(p)) {
        return Err(DomainError::internal(format!(
            "permission '{missing}' is not seeded"
        )));
    }

    store.clear_grants(&employee.id);
    for code in derived {
        store.grant(&employee.id, code)?;
    }
    tracing::debug!(
        employee_id = %employee.id,
        department = %employee.department,
        "permissions reassigned"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;
    use crate::{Department, NewEmployee};

    #[derive(Default)]
    struct MemoryStore {
        records: BTreeMap<Permission, PermissionRecord>,
        grants: BTreeMap<EmployeeId, BTreeSet<Permission>>,
    }

    impl PermissionStore for MemoryStore {
        fn has_permission(&self, code: &Permission) -> bool {
            self.records.contains_key(code)
        }

        fn insert_permission(&mut self, record: PermissionRecord) {
            self.records.insert(record.code.clone(), record);
        }

        fn clear_grants(&mut self, employee_id: &EmployeeId) {
            self.grants.remove(employee_id);
        }

        fn grant(&mut self, employee_id: &EmployeeId, code: Permission) -> DomainResult<()> {
            if !self.records.contains_key(&code) {
                return Err(DomainError::internal("unknown permission"));
            }
            self.grants.entry(*employee_id).or_default().insert(code);
            Ok(())
        }
    }

    fn employee(department: Department) -> Employee {
        Employee::create(
            NewEmployee {
                username: "carol".to_string(),
                password: "secret-pw".to_string(),
                email: "carol@example.com".to_string(),
                first_name: "Carol".to_string(),
                last_name: "Danvers".to_string(),
                phone: None,
                employee_number: None,
                department,
            },
            4,
            Utc::now(),
        )
        .unwrap()
    }

    fn department() -> impl Strategy<Value = Department> {
        prop_oneof![
            Just(Department::Commercial),
            Just(Department::Support),
            Just(Department::Gestion),
        ]
    }

    #[test]
    fn seeding_is_idempotent() {
        let mut store = MemoryStore::default();
        assert_eq!(ensure_seeded(&mut store), CATALOG.len());
        assert_eq!(ensure_seeded(&mut store), 0);
        assert_eq!(store.records.len(), CATALOG.len());
    }

    #[test]
    fn seeding_keeps_existing_descriptions() {
        let mut store = MemoryStore::default();
        store.insert_permission(PermissionRecord {
            code: Permission::MANAGE_USERS,
            description: "custom".to_string(),
        });

        assert_eq!(ensure_seeded(&mut store), CATALOG.len() - 1);
        assert_eq!(store.records[&Permission::MANAGE_USERS].description, "custom");
    }

    #[test]
    fn reassign_requires_seeded_catalog() {
        let mut store = MemoryStore::default();
        let err = reassign(&mut store, &employee(Department::Support)).unwrap_err();
        assert!(err.is_internal());
        assert!(store.grants.is_empty());
    }

    #[test]
    fn reassign_twice_yields_same_grants() {
        let mut store = MemoryStore::default();
        ensure_seeded(&mut store);
        let e = employee(Department::Gestion);

        reassign(&mut store, &e).unwrap();
        let first = store.grants[&e.id].clone();
        reassign(&mut store, &e).unwrap();

        assert_eq!(store.grants[&e.id], first);
        assert_eq!(first, derive_for_department(Department::Gestion));
    }

    proptest! {
        #[test]
        fn grants_follow_the_latest_department(changes in prop::collection::vec(department(), 1..8)) {
            let mut store = MemoryStore::default();
            ensure_seeded(&mut store);
            let mut e = employee(Department::Commercial);
            reassign(&mut store, &e).unwrap();

            for d in &changes {
                e.department = *d;
                reassign(&mut store, &e).unwrap();
            }

            let last = *changes.last().unwrap();
            prop_assert_eq!(&store.grants[&e.id], &derive_for_department(last));
        }
    }
}
