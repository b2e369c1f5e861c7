//! Audit facts emitted by the core and the hook that receives them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_core::{ContractId, EmployeeId};

use crate::bus::EventBus;
use crate::event::Event;

/// What happened to an employee record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeAction {
    Creation,
    Modification,
}

impl core::fmt::Display for EmployeeAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EmployeeAction::Creation => f.write_str("creation"),
            EmployeeAction::Modification => f.write_str("modification"),
        }
    }
}

/// An employee was created or modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeModified {
    pub employee_id: EmployeeId,
    pub username: String,
    pub action: EmployeeAction,
    pub occurred_at: DateTime<Utc>,
}

/// A contract's signed flag went from false to true for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSigned {
    pub contract_id: ContractId,
    pub client_name: String,
    /// Smallest currency unit.
    pub total_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// An unexpected error escaped an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRaised {
    pub operation: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// All audit facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    EmployeeModified(EmployeeModified),
    ContractSigned(ContractSigned),
    Exception(ExceptionRaised),
}

impl AuditEvent {
    pub fn employee_modified(
        employee_id: EmployeeId,
        username: impl Into<String>,
        action: EmployeeAction,
    ) -> Self {
        AuditEvent::EmployeeModified(EmployeeModified {
            employee_id,
            username: username.into(),
            action,
            occurred_at: Utc::now(),
        })
    }

    pub fn contract_signed(
        contract_id: ContractId,
        client_name: impl Into<String>,
        total_amount: u64,
    ) -> Self {
        AuditEvent::ContractSigned(ContractSigned {
            contract_id,
            client_name: client_name.into(),
            total_amount,
            occurred_at: Utc::now(),
        })
    }

    pub fn exception(operation: impl Into<String>, error: &dyn std::error::Error) -> Self {
        AuditEvent::Exception(ExceptionRaised {
            operation: operation.into(),
            message: error.to_string(),
            occurred_at: Utc::now(),
        })
    }
}

impl Event for AuditEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::EmployeeModified(_) => "audit.employee.modified",
            AuditEvent::ContractSigned(_) => "audit.contract.signed",
            AuditEvent::Exception(_) => "audit.exception",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AuditEvent::EmployeeModified(e) => e.occurred_at,
            AuditEvent::ContractSigned(e) => e.occurred_at,
            AuditEvent::Exception(e) => e.occurred_at,
        }
    }
}

/// Receiver of audit facts.
///
/// The core only triggers; formatting and shipping belong to the implementor.
/// Emission must not fail the operation that produced the fact.
pub trait AuditHook: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

impl<H> AuditHook for Arc<H>
where
    H: AuditHook + ?Sized,
{
    fn emit(&self, event: AuditEvent) {
        (**self).emit(event)
    }
}

/// Discards every fact.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditHook;

impl AuditHook for NoopAuditHook {
    fn emit(&self, _event: AuditEvent) {}
}

/// Publishes every fact on an [`EventBus`].
#[derive(Debug)]
pub struct BusAuditHook<B> {
    bus: B,
}

impl<B> BusAuditHook<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B> AuditHook for BusAuditHook<B>
where
    B: EventBus<AuditEvent>,
{
    fn emit(&self, event: AuditEvent) {
        let event_type = event.event_type();
        if let Err(e) = self.bus.publish(event) {
            tracing::warn!(event_type, error = ?e, "failed to publish audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryEventBus;

    #[test]
    fn bus_hook_publishes_to_subscribers() {
        let bus = Arc::new(InMemoryEventBus::<AuditEvent>::new());
        let sub = bus.subscribe();
        let hook = BusAuditHook::new(bus.clone());

        hook.emit(AuditEvent::contract_signed(ContractId::new(), "Acme", 120_000));

        let got = sub.drain();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].event_type(), "audit.contract.signed");
    }

    #[test]
    fn exception_captures_error_message() {
        let err = std::io::Error::other("disk full");
        let AuditEvent::Exception(e) = AuditEvent::exception("contracts.update", &err) else {
            panic!("expected exception event");
        };
        assert_eq!(e.operation, "contracts.update");
        assert_eq!(e.message, "disk full");
    }

    #[test]
    fn employee_action_serializes_snake_case() {
        let json = serde_json::to_string(&EmployeeAction::Modification).unwrap();
        assert_eq!(json, "\"modification\"");
    }
}
