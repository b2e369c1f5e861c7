//! Infrastructure layer: record store, units of work and configuration.

pub mod config;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use store::{Database, InMemoryDatabase, JsonFileDatabase, StoreError, Tables};
