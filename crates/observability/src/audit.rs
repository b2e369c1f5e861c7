//! Audit facts rendered as structured tracing records (target `audit`).

use epicevents_audit::{AuditEvent, AuditHook, Event};

/// Writes every audit fact as one `tracing` event at target `audit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditHook;

impl TracingAuditHook {
    pub fn new() -> Self {
        Self
    }
}

impl AuditHook for TracingAuditHook {
    fn emit(&self, event: AuditEvent) {
        let event_type = event.event_type();
        match &event {
            AuditEvent::EmployeeModified(e) => tracing::info!(
                target: "audit",
                event_type,
                employee_id = %e.employee_id,
                username = %e.username,
                action = %e.action,
                occurred_at = %e.occurred_at,
                "employee {}",
                e.action
            ),
            AuditEvent::ContractSigned(e) => tracing::info!(
                target: "audit",
                event_type,
                contract_id = %e.contract_id,
                client_name = %e.client_name,
                total_amount = e.total_amount,
                occurred_at = %e.occurred_at,
                "contract signed"
            ),
            AuditEvent::Exception(e) => tracing::error!(
                target: "audit",
                event_type,
                operation = %e.operation,
                message = %e.message,
                occurred_at = %e.occurred_at,
                "unexpected error"
            ),
        }
    }
}
