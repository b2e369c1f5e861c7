//! Business records: clients, contracts and events.
//!
//! Pure data and validation rules (no IO, no authorization). Each record has
//! an explicit allow-listed patch type; fields outside it cannot change.

pub mod client;
pub mod contract;
pub mod event;

pub use client::{Client, ClientPatch, NewClient};
pub use contract::{Contract, ContractPatch, NewContract};
pub use event::{Event, EventPatch, NewEvent};
