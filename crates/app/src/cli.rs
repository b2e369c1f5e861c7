//! `epicevents` command line.

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use dialoguer::Password;

use epicevents_auth::{
    ContractFilter, Department, Employee, EmployeePatch, EventView, NewEmployee, Permission,
};
use epicevents_core::{ClientId, ContractId, EmployeeId, EventId};
use epicevents_crm::{
    Client, ClientPatch, Contract, ContractPatch, Event, EventPatch, NewClient, NewContract,
    NewEvent,
};
use epicevents_infra::{AppConfig, Database, JsonFileDatabase};
use epicevents_observability::TracingAuditHook;

use crate::{App, TokenFile};

#[derive(Parser)]
#[command(name = "epicevents")]
#[command(about = "Epic Events customer relationship management")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seed the permission catalog
    Init,
    /// Create the first administrator (only on an empty store)
    Bootstrap(EmployeeArgs),
    /// Log in and store the session token
    Login {
        #[arg(long)]
        username: String,
        /// Prompted with hidden input when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show the logged-in employee
    Whoami,
    /// Explain whether the current session holds a permission
    Can {
        /// Permission code (e.g. manage_users)
        code: String,
    },
    /// Employee management
    Employees {
        #[command(subcommand)]
        action: EmployeeCommands,
    },
    /// Client management
    Clients {
        #[command(subcommand)]
        action: ClientCommands,
    },
    /// Contract management
    Contracts {
        #[command(subcommand)]
        action: ContractCommands,
    },
    /// Event management
    Events {
        #[command(subcommand)]
        action: EventCommands,
    },
}

#[derive(Args)]
pub struct EmployeeArgs {
    #[arg(long)]
    username: String,
    /// Prompted with hidden input (and confirmed) when omitted
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    email: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    employee_number: Option<String>,
}

impl EmployeeArgs {
    fn into_new(self, department: Department) -> anyhow::Result<NewEmployee> {
        let password = match self.password {
            Some(password) => password,
            None => prompt_password(&format!("Password for {}", self.username), true)?,
        };
        Ok(NewEmployee {
            username: self.username,
            password,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            employee_number: self.employee_number,
            department,
        })
    }
}

fn prompt_password(prompt: &str, confirm: bool) -> anyhow::Result<String> {
    let mut input = Password::new().with_prompt(prompt);
    if confirm {
        input = input.with_confirmation("Repeat password", "Passwords do not match");
    }
    input.interact().context("reading password")
}

#[derive(Subcommand)]
pub enum EmployeeCommands {
    List {
        /// Only employees of this department
        #[arg(long)]
        department: Option<Department>,
    },
    Create {
        #[command(flatten)]
        employee: EmployeeArgs,
        /// COMMERCIAL, SUPPORT or GESTION
        #[arg(long)]
        department: Department,
    },
    Update {
        id: EmployeeId,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        employee_number: Option<String>,
        #[arg(long)]
        department: Option<Department>,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },
    Delete {
        id: EmployeeId,
    },
}

#[derive(Subcommand)]
pub enum ClientCommands {
    List,
    Create {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        phone: Option<String>,
        /// Owning commercial (GESTION only)
        #[arg(long)]
        commercial: Option<EmployeeId>,
    },
    Update {
        id: ClientId,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, conflicts_with = "unassign")]
        commercial: Option<EmployeeId>,
        /// Remove the owning commercial
        #[arg(long)]
        unassign: bool,
    },
}

#[derive(Subcommand)]
pub enum ContractCommands {
    List {
        /// with_support, without_support, signed, unsigned, fully_paid, not_fully_paid
        #[arg(long)]
        filter: Option<ContractFilter>,
    },
    Create {
        #[arg(long)]
        client: ClientId,
        /// Total amount in cents
        #[arg(long)]
        total: u64,
        /// Amount still due in cents (defaults to the total)
        #[arg(long)]
        due: Option<u64>,
        #[arg(long)]
        signed: bool,
    },
    Update {
        id: ContractId,
        #[arg(long)]
        total: Option<u64>,
        #[arg(long)]
        due: Option<u64>,
        #[arg(long)]
        signed: bool,
    },
}

#[derive(Subcommand)]
pub enum EventCommands {
    List {
        /// mine (default) or all
        #[arg(long, default_value = "mine")]
        view: EventView,
    },
    Create {
        #[arg(long)]
        contract: ContractId,
        #[arg(long)]
        name: String,
        /// RFC 3339 timestamp
        #[arg(long)]
        start: DateTime<Utc>,
        /// RFC 3339 timestamp
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long)]
        location: String,
        #[arg(long)]
        attendees: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        support: Option<EmployeeId>,
    },
    Update {
        id: EventId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        attendees: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, conflicts_with = "unassign")]
        support: Option<EmployeeId>,
        /// Remove the support contact
        #[arg(long)]
        unassign: bool,
    },
}

/// Load configuration, open the store and execute one command.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let db = JsonFileDatabase::open(&config.data_path)
        .with_context(|| format!("opening {}", config.data_path.display()))?;
    let app = App::with_audit(config.auth.clone(), db, Arc::new(TracingAuditHook::new()));
    let session = TokenFile::new(config.token_path.clone());

    execute(&app, &session, cli.command)
}

fn require_token(session: &TokenFile) -> anyhow::Result<String> {
    match session.load().context("reading session token")? {
        Some(token) => Ok(token),
        None => bail!("not logged in; run `epicevents login` first"),
    }
}

pub fn execute<D: Database>(app: &App<D>, session: &TokenFile, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => {
            let created = app.init()?;
            println!("permission catalog ready ({created} created)");
        }
        Commands::Bootstrap(args) => {
            let admin = app.bootstrap_admin(args.into_new(Department::Gestion)?)?;
            println!("administrator {} created ({})", admin.username, admin.id);
        }
        Commands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password("Password", false)?,
            };
            let token = app.auth().login(&username, &password)?;
            session.save(&token).context("writing session token")?;
            println!("logged in as {username}");
        }
        Commands::Logout => {
            if session.clear().context("removing session token")? {
                println!("logged out");
            } else {
                println!("no active session");
            }
        }
        Commands::Whoami => {
            let token = require_token(session)?;
            let me = app.auth().whoami(&token)?;
            let grants: Vec<String> = me.grants.iter().map(|p| p.to_string()).collect();
            println!("{} ({}) {}", me.username, me.department, me.employee_id);
            println!("permissions: {}", grants.join(", "));
        }
        Commands::Can { code } => {
            let token = require_token(session)?;
            let explanation = app.auth().explain(&token, &Permission::new(code))?;
            println!("{}", serde_json::to_string_pretty(&explanation)?);
        }
        Commands::Employees { action } => employees(app, &require_token(session)?, action)?,
        Commands::Clients { action } => clients(app, &require_token(session)?, action)?,
        Commands::Contracts { action } => contracts(app, &require_token(session)?, action)?,
        Commands::Events { action } => events(app, &require_token(session)?, action)?,
    }
    Ok(())
}

fn employees<D: Database>(app: &App<D>, token: &str, action: EmployeeCommands) -> anyhow::Result<()> {
    let svc = app.employees();
    match action {
        EmployeeCommands::List { department: None } => svc.list(token)?.iter().for_each(print_employee),
        EmployeeCommands::List {
            department: Some(department),
        } => svc
            .by_department(token, department)?
            .iter()
            .for_each(print_employee),
        EmployeeCommands::Create { employee, department } => {
            print_employee(&svc.create(token, employee.into_new(department)?)?)
        }
        EmployeeCommands::Update {
            id,
            email,
            first_name,
            last_name,
            phone,
            employee_number,
            department,
            password,
        } => {
            let password = if password {
                Some(prompt_password("New password", true)?)
            } else {
                None
            };
            let patch = EmployeePatch {
                email,
                first_name,
                last_name,
                phone,
                employee_number,
                department,
                password,
            };
            print_employee(&svc.update(token, &id, patch)?)
        }
        EmployeeCommands::Delete { id } => {
            let removed = svc.delete(token, &id)?;
            println!("deleted {} ({})", removed.username, removed.id);
        }
    }
    Ok(())
}

fn clients<D: Database>(app: &App<D>, token: &str, action: ClientCommands) -> anyhow::Result<()> {
    let svc = app.clients();
    match action {
        ClientCommands::List => svc.list(token)?.iter().for_each(print_client),
        ClientCommands::Create {
            full_name,
            email,
            company,
            phone,
            commercial,
        } => {
            let new = NewClient {
                full_name,
                email,
                phone,
                company,
                commercial_id: commercial,
            };
            print_client(&svc.create(token, new)?)
        }
        ClientCommands::Update {
            id,
            full_name,
            email,
            company,
            phone,
            commercial,
            unassign,
        } => {
            let commercial_id = if unassign { Some(None) } else { commercial.map(Some) };
            let patch = ClientPatch {
                full_name,
                email,
                phone,
                company,
                commercial_id,
            };
            print_client(&svc.update(token, &id, patch)?)
        }
    }
    Ok(())
}

fn contracts<D: Database>(app: &App<D>, token: &str, action: ContractCommands) -> anyhow::Result<()> {
    let svc = app.contracts();
    match action {
        ContractCommands::List { filter } => svc.list(token, filter)?.iter().for_each(print_contract),
        ContractCommands::Create {
            client,
            total,
            due,
            signed,
        } => {
            let new = NewContract {
                client_id: client,
                total_amount: total,
                amount_due: due,
                signed,
            };
            print_contract(&svc.create(token, new)?)
        }
        ContractCommands::Update {
            id,
            total,
            due,
            signed,
        } => {
            let patch = ContractPatch {
                total_amount: total,
                amount_due: due,
                signed: signed.then_some(true),
            };
            print_contract(&svc.update(token, &id, patch)?)
        }
    }
    Ok(())
}

fn events<D: Database>(app: &App<D>, token: &str, action: EventCommands) -> anyhow::Result<()> {
    let svc = app.events();
    match action {
        EventCommands::List { view } => svc.list(token, view)?.iter().for_each(print_event),
        EventCommands::Create {
            contract,
            name,
            start,
            end,
            location,
            attendees,
            notes,
            support,
        } => {
            let new = NewEvent {
                name,
                contract_id: contract,
                starts_at: start,
                ends_at: end,
                location,
                attendees,
                notes,
                contact_support_id: support,
            };
            print_event(&svc.create(token, new)?)
        }
        EventCommands::Update {
            id,
            name,
            start,
            end,
            location,
            attendees,
            notes,
            support,
            unassign,
        } => {
            let contact_support_id = if unassign { Some(None) } else { support.map(Some) };
            let patch = EventPatch {
                name,
                starts_at: start,
                ends_at: end,
                location,
                attendees,
                notes,
                contact_support_id,
            };
            print_event(&svc.update(token, &id, patch)?)
        }
    }
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_employee(e: &Employee) {
    println!(
        "{}  {:<16} {:<24} {:<10} {}",
        e.id,
        e.username,
        e.full_name(),
        e.department,
        e.email
    );
}

fn print_client(c: &Client) {
    println!(
        "{}  {:<24} {:<24} {:<28} commercial={}",
        c.id,
        c.full_name,
        c.company,
        c.email,
        or_dash(c.commercial_id)
    );
}

fn print_contract(c: &Contract) {
    println!("{}", contract_line(c));
}

fn contract_line(c: &Contract) -> String {
    let payment = if c.is_fully_paid() {
        "paid".to_string()
    } else {
        format!("due={}", format_cents(c.amount_due))
    };
    format!(
        "{}  client={} total={} {} signed={}",
        c.id,
        c.client_id,
        format_cents(c.total_amount),
        payment,
        c.signed
    )
}

fn print_event(e: &Event) {
    println!(
        "{}  {:<24} {} -> {}  {}  support={}",
        e.id,
        e.name,
        e.starts_at.format("%Y-%m-%d %H:%M"),
        e.ends_at.format("%Y-%m-%d %H:%M"),
        e.location,
        or_dash(e.contact_support_id)
    );
}

fn format_cents(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_contract_filter_and_event_view() {
        let cli = Cli::try_parse_from(["epicevents", "contracts", "list", "--filter", "not_fully_paid"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Contracts {
                action: ContractCommands::List {
                    filter: Some(ContractFilter::NotFullyPaid)
                }
            }
        ));

        let cli = Cli::try_parse_from(["epicevents", "events", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Events {
                action: EventCommands::List { view: EventView::Mine }
            }
        ));
    }

    #[test]
    fn rejects_unknown_department() {
        let result = Cli::try_parse_from([
            "epicevents",
            "employees",
            "create",
            "--username",
            "x",
            "--password",
            "secret1",
            "--email",
            "x@y.io",
            "--first-name",
            "X",
            "--last-name",
            "Y",
            "--department",
            "MARKETING",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn passwords_stay_off_the_command_line_unless_given() {
        let cli = Cli::try_parse_from(["epicevents", "login", "--username", "admin"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login { ref username, password: None } if username == "admin"
        ));

        let id = EmployeeId::new().to_string();
        let cli = Cli::try_parse_from(["epicevents", "employees", "update", id.as_str(), "--password"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Employees {
                action: EmployeeCommands::Update { password: true, .. }
            }
        ));
        assert!(Cli::try_parse_from(["epicevents", "employees", "update", id.as_str(), "--password", "secret1"]).is_err());
    }

    #[test]
    fn employee_list_accepts_a_department() {
        let cli = Cli::try_parse_from(["epicevents", "employees", "list", "--department", "support"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Employees {
                action: EmployeeCommands::List {
                    department: Some(Department::Support)
                }
            }
        ));
    }

    #[test]
    fn contract_line_shows_payment_state() {
        let contract = |amount_due| {
            Contract::create(
                NewContract {
                    client_id: ClientId::new(),
                    total_amount: 150_000,
                    amount_due: Some(amount_due),
                    signed: true,
                },
                Utc::now(),
            )
            .unwrap()
        };

        let open = contract_line(&contract(25_050));
        assert!(open.contains("total=1500.00 due=250.50"));
        let settled = contract_line(&contract(0));
        assert!(settled.contains("total=1500.00 paid"));
        assert!(!settled.contains("due="));
    }

    #[test]
    fn cents_are_formatted_with_two_decimals() {
        assert_eq!(format_cents(120_005), "1200.05");
        assert_eq!(format_cents(7), "0.07");
    }
}
