use chrono::Utc;

use epicevents_audit::{AuditEvent, EmployeeAction};
use epicevents_auth::authorize::{
    require_employee_deletion, require_employee_listing, require_employee_management,
};
use epicevents_auth::{CredentialStoreMut, Department, Employee, EmployeePatch, NewEmployee, reassign};
use epicevents_core::{DomainError, DomainResult, EmployeeId};
use epicevents_infra::Database;

use crate::App;

/// Employee management.
pub struct EmployeeService<'a, D> {
    app: &'a App<D>,
}

impl<'a, D> EmployeeService<'a, D>
where
    D: Database,
{
    pub(crate) fn new(app: &'a App<D>) -> Self {
        Self { app }
    }

    /// GESTION only.
    pub fn list(&self, token: &str) -> DomainResult<Vec<Employee>> {
        self.app.read_as("employees.list", token, |p, t| {
            require_employee_listing(p)?;
            Ok(t.employees.values().cloned().collect())
        })
    }

    /// Own record for anyone; any record for GESTION.
    pub fn get(&self, token: &str, id: &EmployeeId) -> DomainResult<Employee> {
        self.app.read_as("employees.get", token, |p, t| {
            if &p.employee_id != id {
                require_employee_listing(p)?;
            }
            t.employee(id).cloned()
        })
    }

    pub fn create(&self, token: &str, new: NewEmployee) -> DomainResult<Employee> {
        let cost = self.app.config().password_cost;
        self.app.write_as("employees.create", token, |p, t| {
            require_employee_management(p)?;

            let employee = Employee::create(new, cost, Utc::now())?;
            t.save_employee(employee.clone())?;
            reassign(t, &employee)?;

            tracing::info!(
                employee_id = %employee.id,
                department = %employee.department,
                created_by = %p.employee_id,
                "employee created"
            );
            let event = AuditEvent::employee_modified(
                employee.id,
                employee.username.clone(),
                EmployeeAction::Creation,
            );
            Ok((employee, vec![event]))
        })
    }

    /// Apply an allow-listed patch.
    ///
    /// A department change re-derives grants and releases client or event
    /// assignments the new department cannot hold, in the same unit of work.
    pub fn update(&self, token: &str, id: &EmployeeId, patch: EmployeePatch) -> DomainResult<Employee> {
        let cost = self.app.config().password_cost;
        self.app.write_as("employees.update", token, |p, t| {
            require_employee_management(p)?;

            let mut employee = t.employee(id)?.clone();
            let department_changed = employee.apply_patch(patch, cost)?;
            t.save_employee(employee.clone())?;
            if department_changed {
                reassign(t, &employee)?;
                let released = t.release_stale_assignments(&employee);
                tracing::info!(
                    employee_id = %employee.id,
                    department = %employee.department,
                    released,
                    "department changed"
                );
            }

            let event = AuditEvent::employee_modified(
                employee.id,
                employee.username.clone(),
                EmployeeAction::Modification,
            );
            Ok((employee, vec![event]))
        })
    }

    /// GESTION only. An employee cannot delete their own account.
    pub fn delete(&self, token: &str, id: &EmployeeId) -> DomainResult<Employee> {
        self.app.write_as("employees.delete", token, |p, t| {
            require_employee_deletion(p)?;
            if &p.employee_id == id {
                return Err(DomainError::validation("cannot delete your own account"));
            }

            let employee = t.delete_employee(id)?;
            tracing::info!(employee_id = %employee.id, deleted_by = %p.employee_id, "employee deleted");
            Ok((employee, Vec::new()))
        })
    }

    /// Employees of one department (for assignment pickers).
    pub fn by_department(&self, token: &str, department: Department) -> DomainResult<Vec<Employee>> {
        self.app.read_as("employees.by_department", token, |p, t| {
            require_employee_listing(p)?;
            Ok(t.employees
                .values()
                .filter(|e| e.department == department)
                .cloned()
                .collect())
        })
    }
}
