//! Employee record: identity, credential and department.
//!
//! Employees are both the credential holders (principals) and a managed
//! resource. The password is hashed on the way in and never leaves this
//! module in plaintext.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_core::{DomainError, DomainResult, EmployeeId, Entity, fields};

use crate::Department;
use crate::password::{hash_password, verify_password};

const MAX_USERNAME_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 6;

// ─────────────────────────────────────────────────────────────────────────────
// Employee
// ─────────────────────────────────────────────────────────────────────────────

/// Employee record.
///
/// # Invariants
/// - `username` is non-empty and immutable after creation.
/// - `password_hash` is a bcrypt hash; plaintext is never stored.
/// - `department` is one of the closed [`Department`] values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub username: String,
    password_hash: String,
    pub employee_number: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department: Department,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Validate a creation request and hash its password.
    pub fn create(new: NewEmployee, password_cost: u32, now: DateTime<Utc>) -> DomainResult<Self> {
        let new = new.validated()?;
        let password_hash = hash_password(&new.password, password_cost)?;

        Ok(Self {
            id: EmployeeId::new(),
            username: new.username,
            password_hash,
            employee_number: new.employee_number,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            phone: new.phone,
            department: new.department,
            created_at: now,
        })
    }

    /// Check a plaintext password against the stored hash.
    ///
    /// A corrupt stored hash counts as a mismatch.
    pub fn check_password(&self, plaintext: &str) -> bool {
        match verify_password(plaintext, &self.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(employee_id = %self.id, error = %e, "stored password hash is unreadable");
                false
            }
        }
    }

    /// Replace the password (new salt).
    pub fn set_password(&mut self, plaintext: &str, password_cost: u32) -> DomainResult<()> {
        validate_password(plaintext)?;
        self.password_hash = hash_password(plaintext, password_cost)?;
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Apply an allow-listed patch.
    ///
    /// Returns whether the department changed, in which case the caller must
    /// re-derive the employee's grants.
    pub fn apply_patch(&mut self, patch: EmployeePatch, password_cost: u32) -> DomainResult<bool> {
        if patch.is_empty() {
            return Err(DomainError::validation("nothing to update"));
        }

        let mut next = self.clone();
        if let Some(email) = patch.email {
            next.email = fields::email(&email)?;
        }
        if let Some(first_name) = patch.first_name {
            next.first_name = fields::required("first name", &first_name)?;
        }
        if let Some(last_name) = patch.last_name {
            next.last_name = fields::required("last name", &last_name)?;
        }
        if let Some(phone) = patch.phone {
            next.phone = fields::optional(&phone);
        }
        if let Some(number) = patch.employee_number {
            next.employee_number = fields::optional(&number);
        }
        if let Some(department) = patch.department {
            next.department = department;
        }
        if let Some(password) = patch.password {
            next.set_password(&password, password_cost)?;
        }

        let department_changed = next.department != self.department;
        *self = next;
        Ok(department_changed)
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    const KIND: &'static str = "employee";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Debug for Employee {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Employee")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("email", &self.email)
            .field("department", &self.department)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create an employee.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub employee_number: Option<String>,
    pub department: Department,
}

impl NewEmployee {
    fn validated(self) -> DomainResult<Self> {
        let username = fields::required("username", &self.username)?;
        if username.len() > MAX_USERNAME_LEN {
            return Err(DomainError::validation(format!(
                "username longer than {MAX_USERNAME_LEN} characters"
            )));
        }
        validate_password(&self.password)?;

        Ok(Self {
            username,
            password: self.password,
            email: fields::email(&self.email)?,
            first_name: fields::required("first name", &self.first_name)?,
            last_name: fields::required("last name", &self.last_name)?,
            phone: self.phone.as_deref().and_then(fields::optional),
            employee_number: self.employee_number.as_deref().and_then(fields::optional),
            department: self.department,
        })
    }
}

impl core::fmt::Debug for NewEmployee {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewEmployee")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .field("department", &self.department)
            .finish_non_exhaustive()
    }
}

/// Allow-listed employee update. `None` keeps the current value.
///
/// `username` and `created_at` are not patchable.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EmployeePatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some("")` clears the phone number.
    pub phone: Option<String>,
    /// `Some("")` clears the employee number.
    pub employee_number: Option<String>,
    pub department: Option<Department>,
    pub password: Option<String>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.employee_number.is_none()
            && self.department.is_none()
            && self.password.is_none()
    }
}

impl core::fmt::Debug for EmployeePatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EmployeePatch")
            .field("email", &self.email)
            .field("department", &self.department)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field validation
// ─────────────────────────────────────────────────────────────────────────────

fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    fn new_employee(department: Department) -> NewEmployee {
        NewEmployee {
            username: "alice".to_string(),
            password: "wonderland".to_string(),
            email: "Alice@Example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            phone: Some("  ".to_string()),
            employee_number: None,
            department,
        }
    }

    #[test]
    fn create_hashes_password_and_normalizes_fields() {
        let e = Employee::create(new_employee(Department::Support), COST, Utc::now()).unwrap();

        assert_eq!(e.username, "alice");
        assert_eq!(e.email, "alice@example.com");
        assert_eq!(e.phone, None);
        assert!(e.check_password("wonderland"));
        assert!(!e.check_password("Wonderland"));
    }

    #[test]
    fn create_requires_username_and_email() {
        let mut req = new_employee(Department::Gestion);
        req.username = "   ".to_string();
        let err = Employee::create(req, COST, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("username")));

        let mut req = new_employee(Department::Gestion);
        req.email = "not-an-email".to_string();
        let err = Employee::create(req, COST, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("email")));
    }

    #[test]
    fn create_rejects_short_password() {
        let mut req = new_employee(Department::Commercial);
        req.password = "abc".to_string();
        assert!(matches!(
            Employee::create(req, COST, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn patch_reports_department_change() {
        let mut e = Employee::create(new_employee(Department::Commercial), COST, Utc::now()).unwrap();

        let changed = e
            .apply_patch(
                EmployeePatch {
                    department: Some(Department::Support),
                    ..Default::default()
                },
                COST,
            )
            .unwrap();
        assert!(changed);
        assert_eq!(e.department, Department::Support);

        let changed = e
            .apply_patch(
                EmployeePatch {
                    first_name: Some("Alicia".to_string()),
                    department: Some(Department::Support),
                    ..Default::default()
                },
                COST,
            )
            .unwrap();
        assert!(!changed);
        assert_eq!(e.first_name, "Alicia");
    }

    #[test]
    fn failed_patch_leaves_record_untouched() {
        let mut e = Employee::create(new_employee(Department::Commercial), COST, Utc::now()).unwrap();
        let before = e.clone();

        let result = e.apply_patch(
            EmployeePatch {
                department: Some(Department::Gestion),
                email: Some("broken".to_string()),
                ..Default::default()
            },
            COST,
        );

        assert!(result.is_err());
        assert_eq!(e, before);
    }

    #[test]
    fn empty_patch_is_rejected() {
        let mut e = Employee::create(new_employee(Department::Commercial), COST, Utc::now()).unwrap();
        assert!(matches!(
            e.apply_patch(EmployeePatch::default(), COST),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let e = Employee::create(new_employee(Department::Commercial), COST, Utc::now()).unwrap();
        let rendered = format!("{e:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("$2"));
        assert!(!format!("{:?}", new_employee(Department::Support)).contains("wonderland"));
    }
}
