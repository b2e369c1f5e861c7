//! `epicevents-auth`: authentication and authorization core.
//!
//! Token sessions, the department-driven permission catalog and the access
//! policy engine. Storage is reached only through the traits in [`store`]
//! and [`catalog`].

pub mod authorize;
pub mod catalog;
pub mod claims;
pub mod config;
pub mod department;
pub mod employee;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod store;
pub mod token;

pub use authorize::{
    AuthorizationExplanation, ClientScope, ContractFacts, ContractFilter, ContractScope,
    EventScope, EventView, authorize, explain, require,
};
pub use catalog::{PermissionRecord, PermissionStore, ensure_seeded, reassign};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use config::AuthConfig;
pub use department::Department;
pub use employee::{Employee, EmployeePatch, NewEmployee};
pub use permissions::{Permission, derive_for_department};
pub use principal::Principal;
pub use store::{CredentialStore, CredentialStoreMut};
pub use token::TokenService;
