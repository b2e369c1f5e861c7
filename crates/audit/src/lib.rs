//! `epicevents-audit`: audit facts and the bus that carries them out of the core.

pub mod bus;
pub mod event;
pub mod hook;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use hook::{
    AuditEvent, AuditHook, BusAuditHook, ContractSigned, EmployeeAction, EmployeeModified,
    ExceptionRaised, NoopAuditHook,
};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
