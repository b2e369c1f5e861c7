//! `epicevents-core`: domain foundation building blocks.
//!
//! Identifiers, the shared error taxonomy and the entity contract. No IO.

pub mod entity;
pub mod error;
pub mod fields;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ClientId, ContractId, EmployeeId, EventId};
