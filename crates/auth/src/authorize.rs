//! Access policy engine.
//!
//! Three layers: capability checks, row scopes for list operations, and
//! mutation guards. Everything here is pure: callers pass in the facts
//! (owners, assignees) they read from the store.

use core::str::FromStr;

use serde::Serialize;

use epicevents_core::{DomainError, DomainResult, EmployeeId};

use crate::permissions;
use crate::{Department, Permission, Principal};

// ─────────────────────────────────────────────────────────────────────────────
// Capability check
// ─────────────────────────────────────────────────────────────────────────────

/// Whether `principal` may exercise `required`.
///
/// `read_*` codes are granted to every verified principal; row narrowing is
/// the job of the scopes below. Other codes must be among the current grants.
pub fn authorize(principal: &Principal, required: &Permission) -> bool {
    required.is_read_scope() || principal.holds(required)
}

/// [`authorize`], failing with `PermissionDenied`.
pub fn require(principal: &Principal, required: &Permission) -> DomainResult<()> {
    if authorize(principal, required) {
        Ok(())
    } else {
        Err(deny(
            principal,
            format!("missing permission '{required}'"),
        ))
    }
}

fn deny(principal: &Principal, message: impl Into<String>) -> DomainError {
    let message = message.into();
    tracing::warn!(
        employee_id = %principal.employee_id,
        department = %principal.department,
        reason = %message,
        "access denied"
    );
    DomainError::permission_denied(message)
}

fn require_department(principal: &Principal, department: Department, action: &str) -> DomainResult<()> {
    if principal.is(department) {
        Ok(())
    } else {
        Err(deny(
            principal,
            format!("only {department} may {action}"),
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why a capability check came out the way it did.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    /// Catalog description; `None` for a code outside the catalog.
    pub description: Option<&'static str>,
    pub granted: bool,
    pub reason: String,
    pub principal: PrincipalState,
    /// Set when denied: the code the principal lacks.
    pub missing: Option<String>,
}

/// Snapshot of the principal at decision time.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub employee_id: EmployeeId,
    pub username: String,
    pub department: Department,
    pub grants: Vec<String>,
}

/// Explain the decision [`authorize`] makes for `required`.
pub fn explain(principal: &Principal, required: &Permission) -> AuthorizationExplanation {
    let granted = authorize(principal, required);
    let description = permissions::describe(required.as_str());
    let reason = if description.is_none() {
        format!("'{required}' is not a known permission")
    } else if required.is_read_scope() {
        format!("'{required}' is a read scope, granted to every authenticated employee")
    } else if granted {
        format!("'{required}' is granted to department {}", principal.department)
    } else {
        format!(
            "department {} does not grant '{required}'",
            principal.department
        )
    };

    AuthorizationExplanation {
        required_permission: required.to_string(),
        description,
        granted,
        reason,
        principal: PrincipalState {
            employee_id: principal.employee_id,
            username: principal.username.clone(),
            department: principal.department,
            grants: principal.grants.iter().map(|p| p.to_string()).collect(),
        },
        missing: (!granted).then(|| required.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// List scopes
// ─────────────────────────────────────────────────────────────────────────────

/// Which clients a principal sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientScope {
    All,
    OwnedBy(EmployeeId),
}

impl ClientScope {
    pub fn for_principal(principal: &Principal) -> Self {
        let scope = match principal.department {
            Department::Commercial => ClientScope::OwnedBy(principal.employee_id),
            Department::Support | Department::Gestion => ClientScope::All,
        };
        tracing::debug!(employee_id = %principal.employee_id, ?scope, "client scope");
        scope
    }

    /// `commercial_id` is the client's owning commercial.
    pub fn admits(&self, commercial_id: Option<&EmployeeId>) -> bool {
        match self {
            ClientScope::All => true,
            ClientScope::OwnedBy(owner) => commercial_id == Some(owner),
        }
    }
}

/// Secondary filter on contract lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractFilter {
    /// The linked event has a support assignee.
    WithSupport,
    /// No linked event, or one without a support assignee.
    WithoutSupport,
    Signed,
    Unsigned,
    /// Nothing left to pay.
    FullyPaid,
    NotFullyPaid,
}

impl ContractFilter {
    /// The department allowed to request this filter.
    pub fn department(&self) -> Department {
        match self {
            ContractFilter::WithSupport | ContractFilter::WithoutSupport => Department::Gestion,
            ContractFilter::Signed
            | ContractFilter::Unsigned
            | ContractFilter::FullyPaid
            | ContractFilter::NotFullyPaid => Department::Commercial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractFilter::WithSupport => "with_support",
            ContractFilter::WithoutSupport => "without_support",
            ContractFilter::Signed => "signed",
            ContractFilter::Unsigned => "unsigned",
            ContractFilter::FullyPaid => "fully_paid",
            ContractFilter::NotFullyPaid => "not_fully_paid",
        }
    }

    fn matches(&self, facts: &ContractFacts) -> bool {
        match self {
            ContractFilter::WithSupport => facts.has_support,
            ContractFilter::WithoutSupport => !facts.has_support,
            ContractFilter::Signed => facts.signed,
            ContractFilter::Unsigned => !facts.signed,
            ContractFilter::FullyPaid => facts.amount_due == 0,
            ContractFilter::NotFullyPaid => facts.amount_due > 0,
        }
    }
}

impl core::fmt::Display for ContractFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "with_support" => Ok(ContractFilter::WithSupport),
            "without_support" => Ok(ContractFilter::WithoutSupport),
            "signed" => Ok(ContractFilter::Signed),
            "unsigned" => Ok(ContractFilter::Unsigned),
            "fully_paid" => Ok(ContractFilter::FullyPaid),
            "not_fully_paid" => Ok(ContractFilter::NotFullyPaid),
            other => Err(DomainError::validation(format!("unknown contract filter '{other}'"))),
        }
    }
}

/// What the contract scope needs to know about one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractFacts {
    /// `commercial_id` of the contract's client.
    pub owner: Option<EmployeeId>,
    pub signed: bool,
    pub amount_due: u64,
    /// Whether the linked event has a support assignee.
    pub has_support: bool,
}

/// Which contracts a principal sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractScope {
    owner: Option<EmployeeId>,
    filter: Option<ContractFilter>,
}

impl ContractScope {
    /// Resolve the scope, rejecting a filter the principal's department may not use.
    pub fn resolve(principal: &Principal, filter: Option<ContractFilter>) -> DomainResult<Self> {
        if let Some(f) = filter {
            if !principal.is(f.department()) {
                return Err(deny(
                    principal,
                    format!("contract filter '{f}' is reserved to {}", f.department()),
                ));
            }
        }

        let owner = match principal.department {
            Department::Commercial => Some(principal.employee_id),
            Department::Support | Department::Gestion => None,
        };
        tracing::debug!(employee_id = %principal.employee_id, ?owner, ?filter, "contract scope");
        Ok(Self { owner, filter })
    }

    pub fn filter(&self) -> Option<ContractFilter> {
        self.filter
    }

    pub fn admits(&self, facts: &ContractFacts) -> bool {
        if let Some(owner) = &self.owner {
            if facts.owner.as_ref() != Some(owner) {
                return false;
            }
        }
        self.filter.is_none_or(|f| f.matches(facts))
    }
}

/// Event list toggle for SUPPORT: own events (default) or all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventView {
    #[default]
    Mine,
    All,
}

impl FromStr for EventView {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mine" | "my_events" => Ok(EventView::Mine),
            "all" => Ok(EventView::All),
            other => Err(DomainError::validation(format!(
                "unknown event view '{other}' (expected mine or all)"
            ))),
        }
    }
}

/// Which events a principal sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    All,
    AssignedTo(EmployeeId),
}

impl EventScope {
    /// The view toggle only narrows SUPPORT; everyone else sees all events.
    pub fn resolve(principal: &Principal, view: EventView) -> Self {
        let scope = match (principal.department, view) {
            (Department::Support, EventView::Mine) => EventScope::AssignedTo(principal.employee_id),
            _ => EventScope::All,
        };
        tracing::debug!(employee_id = %principal.employee_id, ?scope, "event scope");
        scope
    }

    pub fn admits(&self, contact_support_id: Option<&EmployeeId>) -> bool {
        match self {
            EventScope::All => true,
            EventScope::AssignedTo(id) => contact_support_id == Some(id),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mutation guards
// ─────────────────────────────────────────────────────────────────────────────

pub fn require_employee_management(principal: &Principal) -> DomainResult<()> {
    require(principal, &Permission::MANAGE_USERS)
}

pub fn require_employee_deletion(principal: &Principal) -> DomainResult<()> {
    require_department(principal, Department::Gestion, "delete employees")
}

pub fn require_employee_listing(principal: &Principal) -> DomainResult<()> {
    require_department(principal, Department::Gestion, "list employees")
}

/// Decide the owner of a new client.
///
/// A COMMERCIAL always owns the clients they create; GESTION holding
/// `manage_clients` may pick any owner (or none).
pub fn authorize_client_creation(
    principal: &Principal,
    requested_owner: Option<EmployeeId>,
) -> DomainResult<Option<EmployeeId>> {
    match principal.department {
        Department::Commercial => match requested_owner {
            Some(owner) if owner != principal.employee_id => Err(deny(
                principal,
                "only GESTION may assign a client to another commercial",
            )),
            _ => Ok(Some(principal.employee_id)),
        },
        Department::Gestion => {
            require(principal, &Permission::MANAGE_CLIENTS)?;
            Ok(requested_owner)
        }
        Department::Support => Err(deny(principal, "SUPPORT may not create clients")),
    }
}

/// `owner` is the client's current `commercial_id`.
pub fn require_client_update(
    principal: &Principal,
    owner: Option<&EmployeeId>,
    reassigns_owner: bool,
) -> DomainResult<()> {
    match principal.department {
        Department::Gestion => require(principal, &Permission::MANAGE_CLIENTS),
        Department::Commercial if reassigns_owner => Err(deny(
            principal,
            "only GESTION may reassign a client's commercial",
        )),
        Department::Commercial if owner == Some(&principal.employee_id) => Ok(()),
        _ => Err(deny(principal, "not the commercial in charge of this client")),
    }
}

pub fn require_contract_creation(principal: &Principal) -> DomainResult<()> {
    require(principal, &Permission::MANAGE_CONTRACTS)
}

/// `owner` is the `commercial_id` of the contract's client.
pub fn require_contract_update(principal: &Principal, owner: Option<&EmployeeId>) -> DomainResult<()> {
    match principal.department {
        Department::Gestion => require(principal, &Permission::MANAGE_CONTRACTS),
        Department::Commercial if owner == Some(&principal.employee_id) => Ok(()),
        _ => Err(deny(principal, "not allowed to modify this contract")),
    }
}

/// Decide the support contact of a new event.
///
/// Requires `manage_events`. A SUPPORT creator becomes the contact; only
/// GESTION may name somebody else.
pub fn authorize_event_creation(
    principal: &Principal,
    requested_support: Option<EmployeeId>,
) -> DomainResult<Option<EmployeeId>> {
    require(principal, &Permission::MANAGE_EVENTS)?;
    match principal.department {
        Department::Gestion => Ok(requested_support),
        _ => match requested_support {
            Some(id) if id != principal.employee_id => Err(deny(
                principal,
                "only GESTION may assign an event's support contact",
            )),
            _ => Ok(Some(principal.employee_id)),
        },
    }
}

/// `assignee` is the event's current `contact_support_id`.
pub fn require_event_update(
    principal: &Principal,
    assignee: Option<&EmployeeId>,
    reassigns_support: bool,
) -> DomainResult<()> {
    match principal.department {
        Department::Gestion => require(principal, &Permission::MANAGE_EVENTS),
        Department::Support if reassigns_support => Err(deny(
            principal,
            "only GESTION may assign an event's support contact",
        )),
        Department::Support if assignee == Some(&principal.employee_id) => Ok(()),
        _ => Err(deny(principal, "not the support contact of this event")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::derive_for_department;

    fn principal(department: Department) -> Principal {
        Principal {
            employee_id: EmployeeId::new(),
            username: department.as_str().to_lowercase(),
            department,
            grants: derive_for_department(department),
        }
    }

    fn facts(owner: Option<EmployeeId>) -> ContractFacts {
        ContractFacts {
            owner,
            signed: false,
            amount_due: 100,
            has_support: false,
        }
    }

    #[test]
    fn read_scopes_are_universal() {
        for d in Department::ALL {
            let p = principal(d);
            assert!(authorize(&p, &Permission::READ_CLIENTS));
            assert!(authorize(&p, &Permission::READ_CONTRACTS));
            assert!(authorize(&p, &Permission::READ_EVENTS));
        }
    }

    #[test]
    fn read_scope_is_granted_even_without_stored_grants() {
        let mut p = principal(Department::Support);
        p.grants.clear();
        assert!(authorize(&p, &Permission::READ_CLIENTS));
        assert!(!authorize(&p, &Permission::MANAGE_EVENTS));
    }

    #[test]
    fn manage_users_is_gestion_only() {
        assert!(authorize(&principal(Department::Gestion), &Permission::MANAGE_USERS));
        assert!(!authorize(&principal(Department::Commercial), &Permission::MANAGE_USERS));
        assert!(!authorize(&principal(Department::Support), &Permission::MANAGE_USERS));
    }

    #[test]
    fn require_reports_permission_denied() {
        let err = require(&principal(Department::Commercial), &Permission::MANAGE_CONTRACTS).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(ref m) if m.contains("manage_contracts")));
    }

    #[test]
    fn explanation_mirrors_decision() {
        let p = principal(Department::Commercial);

        let denied = explain(&p, &Permission::MANAGE_USERS);
        assert!(!denied.granted);
        assert_eq!(denied.missing.as_deref(), Some("manage_users"));

        let granted = explain(&p, &Permission::MANAGE_CLIENTS);
        assert!(granted.granted);
        assert!(granted.missing.is_none());
        assert_eq!(granted.principal.grants.len(), 4);

        let json = serde_json::to_value(&denied).unwrap();
        assert_eq!(json["principal"]["department"], "COMMERCIAL");
        assert_eq!(json["description"], "Create and modify employees");
    }

    #[test]
    fn explanation_flags_codes_outside_the_catalog() {
        let p = principal(Department::Gestion);

        let unknown = explain(&p, &Permission::new("launch_rockets"));
        assert!(!unknown.granted);
        assert_eq!(unknown.description, None);
        assert!(unknown.reason.contains("not a known permission"));

        let read = explain(&p, &Permission::READ_EVENTS);
        assert_eq!(read.description, Some("List and view events"));
        assert!(read.reason.contains("read scope"));
    }

    #[test]
    fn commercial_sees_only_own_clients() {
        let p = principal(Department::Commercial);
        let scope = ClientScope::for_principal(&p);
        let other = EmployeeId::new();

        assert!(scope.admits(Some(&p.employee_id)));
        assert!(!scope.admits(Some(&other)));
        assert!(!scope.admits(None));

        assert_eq!(ClientScope::for_principal(&principal(Department::Gestion)), ClientScope::All);
        assert_eq!(ClientScope::for_principal(&principal(Department::Support)), ClientScope::All);
    }

    #[test]
    fn commercial_contract_scope_follows_client_owner() {
        let p = principal(Department::Commercial);
        let scope = ContractScope::resolve(&p, None).unwrap();

        assert!(scope.admits(&facts(Some(p.employee_id))));
        assert!(!scope.admits(&facts(Some(EmployeeId::new()))));
        assert!(!scope.admits(&facts(None)));
    }

    #[test]
    fn commercial_filters_apply_on_top_of_ownership() {
        let p = principal(Department::Commercial);
        let mine = Some(p.employee_id);

        let paid = ContractFacts { amount_due: 0, signed: true, ..facts(mine) };
        let unpaid = facts(mine);

        let fully_paid = ContractScope::resolve(&p, Some(ContractFilter::FullyPaid)).unwrap();
        assert!(fully_paid.admits(&paid));
        assert!(!fully_paid.admits(&unpaid));

        let unsigned = ContractScope::resolve(&p, Some(ContractFilter::Unsigned)).unwrap();
        assert!(unsigned.admits(&unpaid));
        assert!(!unsigned.admits(&paid));
    }

    #[test]
    fn support_filters_are_gestion_only() {
        let gestion = principal(Department::Gestion);
        let scope = ContractScope::resolve(&gestion, Some(ContractFilter::WithoutSupport)).unwrap();
        assert!(scope.admits(&facts(None)));
        assert!(!scope.admits(&ContractFacts { has_support: true, ..facts(None) }));

        let err = ContractScope::resolve(&principal(Department::Commercial), Some(ContractFilter::WithSupport))
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let err = ContractScope::resolve(&gestion, Some(ContractFilter::Signed)).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[test]
    fn contract_filter_parsing() {
        assert_eq!("not-fully-paid".parse::<ContractFilter>().unwrap(), ContractFilter::NotFullyPaid);
        assert_eq!("WITH_SUPPORT".parse::<ContractFilter>().unwrap(), ContractFilter::WithSupport);
        assert!(matches!("paid".parse::<ContractFilter>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn support_event_view_defaults_to_own_events() {
        let p = principal(Department::Support);
        let mine = EventScope::resolve(&p, EventView::default());
        assert!(mine.admits(Some(&p.employee_id)));
        assert!(!mine.admits(Some(&EmployeeId::new())));
        assert!(!mine.admits(None));

        assert_eq!(EventScope::resolve(&p, EventView::All), EventScope::All);
        assert_eq!(
            EventScope::resolve(&principal(Department::Commercial), EventView::Mine),
            EventScope::All
        );
    }

    #[test]
    fn employee_guards() {
        let gestion = principal(Department::Gestion);
        let commercial = principal(Department::Commercial);

        assert!(require_employee_management(&gestion).is_ok());
        assert!(require_employee_management(&commercial).is_err());
        assert!(require_employee_deletion(&gestion).is_ok());
        assert!(require_employee_listing(&principal(Department::Support)).is_err());
    }

    #[test]
    fn commercial_creates_clients_for_themselves() {
        let p = principal(Department::Commercial);
        assert_eq!(authorize_client_creation(&p, None).unwrap(), Some(p.employee_id));
        assert!(authorize_client_creation(&p, Some(EmployeeId::new())).is_err());

        let g = principal(Department::Gestion);
        let owner = EmployeeId::new();
        assert_eq!(authorize_client_creation(&g, Some(owner)).unwrap(), Some(owner));

        assert!(authorize_client_creation(&principal(Department::Support), None).is_err());
    }

    #[test]
    fn client_updates_need_ownership_or_gestion() {
        let p = principal(Department::Commercial);
        assert!(require_client_update(&p, Some(&p.employee_id), false).is_ok());
        assert!(require_client_update(&p, Some(&p.employee_id), true).is_err());
        assert!(require_client_update(&p, Some(&EmployeeId::new()), false).is_err());
        assert!(require_client_update(&principal(Department::Gestion), None, true).is_ok());
        assert!(require_client_update(&principal(Department::Support), None, false).is_err());
    }

    #[test]
    fn contract_guards() {
        let commercial = principal(Department::Commercial);
        assert!(require_contract_creation(&commercial).is_err());
        assert!(require_contract_creation(&principal(Department::Gestion)).is_ok());

        assert!(require_contract_update(&commercial, Some(&commercial.employee_id)).is_ok());
        assert!(require_contract_update(&commercial, None).is_err());
        assert!(require_contract_update(&principal(Department::Support), None).is_err());
    }

    #[test]
    fn event_guards() {
        let support = principal(Department::Support);
        assert_eq!(
            authorize_event_creation(&support, None).unwrap(),
            Some(support.employee_id)
        );
        assert!(authorize_event_creation(&support, Some(EmployeeId::new())).is_err());
        assert!(authorize_event_creation(&principal(Department::Commercial), None).is_err());

        let gestion = principal(Department::Gestion);
        let other = EmployeeId::new();
        assert_eq!(authorize_event_creation(&gestion, Some(other)).unwrap(), Some(other));

        assert!(require_event_update(&support, Some(&support.employee_id), false).is_ok());
        assert!(require_event_update(&support, Some(&support.employee_id), true).is_err());
        assert!(require_event_update(&support, None, false).is_err());
        assert!(require_event_update(&principal(Department::Gestion), None, true).is_ok());
    }
}
