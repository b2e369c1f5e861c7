//! Resource services.
//!
//! Each operation verifies the caller's token, asks the policy engine, and
//! only then touches data, all inside one unit of work.

mod auth;
mod clients;
mod contracts;
mod employees;
mod events;

pub use auth::AuthService;
pub use clients::ClientService;
pub use contracts::ContractService;
pub use employees::EmployeeService;
pub use events::EventService;

use epicevents_auth::Department;
use epicevents_core::{DomainError, DomainResult, EmployeeId};
use epicevents_infra::Tables;

/// Check that `id` names an employee of `department`.
pub(crate) fn ensure_department(
    tables: &Tables,
    id: &EmployeeId,
    department: Department,
    role: &str,
) -> DomainResult<()> {
    let employee = tables.employee(id)?;
    if employee.department != department {
        return Err(DomainError::validation(format!(
            "{role} must belong to {department}, {} is {}",
            employee.username, employee.department
        )));
    }
    Ok(())
}
