use std::sync::Arc;

use chrono::Utc;

use epicevents_audit::{AuditEvent, AuditHook, EmployeeAction, NoopAuditHook};
use epicevents_auth::{
    AuthConfig, CredentialStoreMut, Department, Employee, NewEmployee, Principal, TokenService,
    ensure_seeded, reassign,
};
use epicevents_core::{DomainError, DomainResult};
use epicevents_infra::{Database, Tables};

use crate::services::{AuthService, ClientService, ContractService, EmployeeService, EventService};

/// Application root: configuration, token service, record store and audit hook.
///
/// Every service borrows from here; nothing is global.
pub struct App<D> {
    config: AuthConfig,
    tokens: TokenService,
    db: D,
    audit: Arc<dyn AuditHook>,
}

impl<D> App<D>
where
    D: Database,
{
    pub fn new(config: AuthConfig, db: D) -> Self {
        Self::with_audit(config, db, Arc::new(NoopAuditHook))
    }

    pub fn with_audit(config: AuthConfig, db: D, audit: Arc<dyn AuditHook>) -> Self {
        let tokens = TokenService::new(&config);
        Self {
            config,
            tokens,
            db,
            audit,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn auth(&self) -> AuthService<'_, D> {
        AuthService::new(self)
    }

    pub fn employees(&self) -> EmployeeService<'_, D> {
        EmployeeService::new(self)
    }

    pub fn clients(&self) -> ClientService<'_, D> {
        ClientService::new(self)
    }

    pub fn contracts(&self) -> ContractService<'_, D> {
        ContractService::new(self)
    }

    pub fn events(&self) -> EventService<'_, D> {
        EventService::new(self)
    }

    /// Seed the permission catalog. Returns how many records were created.
    pub fn init(&self) -> DomainResult<usize> {
        self.report("init", self.db.transaction(|t| Ok(ensure_seeded(t))))
    }

    /// Create the first GESTION employee.
    ///
    /// Only allowed while the store holds no employee; this is how the
    /// first `manage_users` holder comes to exist.
    pub fn bootstrap_admin(&self, mut new: NewEmployee) -> DomainResult<Employee> {
        new.department = Department::Gestion;
        let cost = self.config.password_cost;

        let result = self.db.transaction(|t| {
            if !t.employees.is_empty() {
                return Err(DomainError::conflict(
                    "employees already exist; use an administrator account instead",
                ));
            }
            ensure_seeded(t);
            let employee = Employee::create(new, cost, Utc::now())?;
            t.save_employee(employee.clone())?;
            reassign(t, &employee)?;
            Ok(employee)
        });

        let employee = self.report("bootstrap", result)?;
        tracing::info!(employee_id = %employee.id, username = %employee.username, "bootstrapped administrator");
        self.emit(AuditEvent::employee_modified(
            employee.id,
            employee.username.clone(),
            EmployeeAction::Creation,
        ));
        Ok(employee)
    }

    /// Resolve a token against the given state, or fail with `InvalidToken`.
    pub(crate) fn principal(&self, token: &str, tables: &Tables) -> DomainResult<Principal> {
        self.tokens
            .verify(token, tables)
            .ok_or(DomainError::InvalidToken)
    }

    /// Read committed state as `token`'s principal.
    pub(crate) fn read_as<R>(
        &self,
        operation: &'static str,
        token: &str,
        f: impl FnOnce(&Principal, &Tables) -> DomainResult<R>,
    ) -> DomainResult<R> {
        let result = self
            .db
            .read(|t| {
                let principal = self.principal(token, t)?;
                f(&principal, t)
            })
            .map_err(DomainError::from)
            .and_then(|r| r);
        self.report(operation, result)
    }

    /// Run one unit of work as `token`'s principal.
    ///
    /// Audit events returned by `f` are emitted only after the commit.
    pub(crate) fn write_as<R>(
        &self,
        operation: &'static str,
        token: &str,
        f: impl FnOnce(&Principal, &mut Tables) -> DomainResult<(R, Vec<AuditEvent>)>,
    ) -> DomainResult<R> {
        let result = self.db.transaction(|t| {
            let principal = self.principal(token, t)?;
            f(&principal, t)
        });

        let (out, events) = self.report(operation, result)?;
        for event in events {
            self.emit(event);
        }
        Ok(out)
    }

    pub(crate) fn emit(&self, event: AuditEvent) {
        self.audit.emit(event);
    }

    /// Unexpected failures go to the exception hook; the error is returned unchanged.
    pub(crate) fn report<R>(&self, operation: &'static str, result: DomainResult<R>) -> DomainResult<R> {
        if let Err(e) = &result {
            if e.is_internal() {
                tracing::error!(operation, error = %e, "operation failed");
                self.emit(AuditEvent::exception(operation, e));
            }
        }
        result
    }
}

impl<D> core::fmt::Debug for App<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
