//! Session token issuance and verification (HS256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use epicevents_core::{DomainError, DomainResult, EmployeeId};

use crate::claims::{TokenClaims, validate_claims};
use crate::store::CredentialStore;
use crate::{AuthConfig, Principal};

/// Issues and verifies signed, time-limited session tokens.
///
/// Stateless: tokens are never persisted here, and verification only reads
/// from the credential store.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();

        // Expiry is checked by `validate_claims` so the clock can be injected.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: config.token_ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, employee_id: EmployeeId) -> DomainResult<String> {
        self.issue_at(employee_id, Utc::now())
    }

    pub fn issue_at(&self, employee_id: EmployeeId, now: DateTime<Utc>) -> DomainResult<String> {
        let claims = TokenClaims::new(employee_id, now, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::internal(format!("failed to sign token: {e}")))
    }

    /// Check signature and timing, returning the claims.
    ///
    /// Does not consult the credential store.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Option<TokenClaims> {
        let claims = match jsonwebtoken::decode::<TokenClaims>(token.trim(), &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::warn!(error = %e, "rejected session token");
                return None;
            }
        };

        if let Err(e) = validate_claims(&claims, now) {
            tracing::warn!(sub = %claims.sub, error = %e, "rejected session token");
            return None;
        }
        Some(claims)
    }

    pub fn verify<S>(&self, token: &str, store: &S) -> Option<Principal>
    where
        S: CredentialStore + ?Sized,
    {
        self.verify_at(token, Utc::now(), store)
    }

    /// Verify a token and resolve its subject against the credential store.
    ///
    /// Returns `None` for any malformed, tampered or expired token and for a
    /// subject that no longer exists.
    pub fn verify_at<S>(&self, token: &str, now: DateTime<Utc>, store: &S) -> Option<Principal>
    where
        S: CredentialStore + ?Sized,
    {
        let claims = self.decode_at(token, now)?;

        let Some(employee) = store.find_employee_by_id(&claims.sub) else {
            tracing::warn!(sub = %claims.sub, "token subject no longer exists");
            return None;
        };

        Some(Principal::from_employee(employee, store.grants_of(&employee.id)))
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &"HS256")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::permissions::derive_for_department;
    use crate::{Department, Employee, NewEmployee, Permission};

    #[derive(Default)]
    struct Directory {
        employees: BTreeMap<EmployeeId, Employee>,
    }

    impl Directory {
        fn hire(&mut self, username: &str, department: Department) -> EmployeeId {
            let e = Employee::create(
                NewEmployee {
                    username: username.to_string(),
                    password: "password1".to_string(),
                    email: format!("{username}@example.com"),
                    first_name: username.to_string(),
                    last_name: "Test".to_string(),
                    phone: None,
                    employee_number: None,
                    department,
                },
                4,
                Utc::now(),
            )
            .unwrap();
            let id = e.id;
            self.employees.insert(id, e);
            id
        }
    }

    impl CredentialStore for Directory {
        fn find_employee_by_username(&self, username: &str) -> Option<&Employee> {
            self.employees.values().find(|e| e.username == username)
        }

        fn find_employee_by_id(&self, id: &EmployeeId) -> Option<&Employee> {
            self.employees.get(id)
        }

        fn grants_of(&self, id: &EmployeeId) -> BTreeSet<Permission> {
            self.employees
                .get(id)
                .map(|e| derive_for_department(e.department))
                .unwrap_or_default()
        }
    }

    fn service() -> TokenService {
        TokenService::new(&AuthConfig::new("unit-test-secret"))
    }

    #[test]
    fn issued_token_verifies_to_its_subject() {
        let mut dir = Directory::default();
        let id = dir.hire("admin", Department::Gestion);
        let svc = service();

        let token = svc.issue(id).unwrap();
        let principal = svc.verify(&token, &dir).unwrap();

        assert_eq!(principal.employee_id, id);
        assert_eq!(principal.username, "admin");
        assert!(principal.holds(&Permission::MANAGE_USERS));
    }

    #[test]
    fn token_is_invalid_after_ttl() {
        let mut dir = Directory::default();
        let id = dir.hire("bob", Department::Commercial);
        let svc = service();
        let issued = Utc::now();

        let token = svc.issue_at(id, issued).unwrap();

        assert!(svc.verify_at(&token, issued + Duration::minutes(30), &dir).is_some());
        assert!(
            svc.verify_at(&token, issued + Duration::minutes(30) + Duration::seconds(1), &dir)
                .is_none()
        );
    }

    #[test]
    fn token_of_deleted_employee_is_invalid() {
        let mut dir = Directory::default();
        let id = dir.hire("temp", Department::Support);
        let svc = service();
        let token = svc.issue(id).unwrap();

        dir.employees.remove(&id);

        assert!(svc.verify(&token, &dir).is_none());
    }

    #[test]
    fn verification_reflects_current_department() {
        let mut dir = Directory::default();
        let id = dir.hire("dana", Department::Commercial);
        let svc = service();
        let token = svc.issue(id).unwrap();

        dir.employees.get_mut(&id).unwrap().department = Department::Support;

        let principal = svc.verify(&token, &dir).unwrap();
        assert_eq!(principal.department, Department::Support);
        assert!(principal.holds(&Permission::MANAGE_EVENTS));
        assert!(!principal.holds(&Permission::MANAGE_CLIENTS));
    }

    #[test]
    fn tampered_or_foreign_tokens_are_invalid() {
        let mut dir = Directory::default();
        let id = dir.hire("eve", Department::Gestion);
        let svc = service();
        let token = svc.issue(id).unwrap();

        let other = TokenService::new(&AuthConfig::new("another-secret"));
        assert!(other.verify(&token, &dir).is_none());

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(svc.verify(&tampered, &dir).is_none());

        assert!(svc.verify("", &dir).is_none());
        assert!(svc.verify("not.a.token", &dir).is_none());
    }

    #[test]
    fn debug_does_not_expose_keys() {
        let rendered = format!("{:?}", service());
        assert!(rendered.contains("HS256"));
        assert!(!rendered.contains("unit-test-secret"));
    }
}
