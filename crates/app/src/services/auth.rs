use epicevents_auth::{
    AuthorizationExplanation, CredentialStore, Permission, Principal, authorize, explain,
};
use epicevents_core::{DomainError, DomainResult};
use epicevents_infra::Database;

use crate::App;

/// Login and token-level checks.
pub struct AuthService<'a, D> {
    app: &'a App<D>,
}

impl<'a, D> AuthService<'a, D>
where
    D: Database,
{
    pub(crate) fn new(app: &'a App<D>) -> Self {
        Self { app }
    }

    /// Exchange credentials for a session token.
    ///
    /// Unknown usernames and wrong passwords fail the same way.
    pub fn login(&self, username: &str, password: &str) -> DomainResult<String> {
        let found = self
            .app
            .db()
            .read(|t| {
                t.find_employee_by_username(username.trim())
                    .filter(|e| e.check_password(password))
                    .map(|e| e.id)
            })
            .map_err(DomainError::from);

        let employee_id = match self.app.report("login", found)? {
            Some(id) => id,
            None => {
                tracing::warn!(username = %username.trim(), "login rejected");
                return Err(DomainError::InvalidCredentials);
            }
        };

        let token = self.app.report("login", self.app.tokens().issue(employee_id))?;
        tracing::info!(%employee_id, "login succeeded");
        Ok(token)
    }

    /// `None` for any invalid token.
    pub fn verify(&self, token: &str) -> DomainResult<Option<Principal>> {
        let result = self
            .app
            .db()
            .read(|t| self.app.tokens().verify(token, t))
            .map_err(DomainError::from);
        self.app.report("verify", result)
    }

    pub fn whoami(&self, token: &str) -> DomainResult<Principal> {
        self.app.read_as("whoami", token, |p, _| Ok(p.clone()))
    }

    /// Capability check for the token's principal.
    pub fn authorize(&self, token: &str, code: &Permission) -> DomainResult<bool> {
        self.app
            .read_as("authorize", token, |p, _| Ok(authorize(p, code)))
    }

    pub fn explain(&self, token: &str, code: &Permission) -> DomainResult<AuthorizationExplanation> {
        self.app
            .read_as("explain", token, |p, _| Ok(explain(p, code)))
    }
}
