//! Storage seams the auth core reads from and writes to.
//!
//! The record store implements these; the core never assumes a concrete
//! backend.

use std::collections::BTreeSet;

use epicevents_core::{DomainResult, EmployeeId};

use crate::{Employee, Permission};

/// Read side of the credential store.
pub trait CredentialStore {
    fn find_employee_by_username(&self, username: &str) -> Option<&Employee>;

    fn find_employee_by_id(&self, id: &EmployeeId) -> Option<&Employee>;

    /// Current capability grants of an employee (empty if unknown).
    fn grants_of(&self, id: &EmployeeId) -> BTreeSet<Permission>;
}

/// Write side of the credential store.
pub trait CredentialStoreMut: CredentialStore {
    /// Insert or replace an employee.
    ///
    /// Fails with `Conflict` when another employee already uses the same
    /// username or email.
    fn save_employee(&mut self, employee: Employee) -> DomainResult<()>;

    /// Remove an employee and its grants. Fails with `NotFound`.
    fn delete_employee(&mut self, id: &EmployeeId) -> DomainResult<Employee>;
}
