//! Application layer: resource services on top of the auth core, the
//! session token file and the command line.

pub mod app;
pub mod cli;
pub mod services;
pub mod session;

pub use app::App;
pub use services::{AuthService, ClientService, ContractService, EmployeeService, EventService};
pub use session::TokenFile;
