//! The `epiccrm` command tree.

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use epiccrm_core::{ClientId, ContractId, EmployeeId, EventId, Money, Role};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Parser)]
#[command(name = "epiccrm")]
#[command(about = "Epic Events CRM back office", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authenticate and store a session locally
    Login {
        email: String,
        /// Read from stdin when omitted
        password: Option<String>,
    },

    /// Forget the local session
    Logout,

    /// Exchange the stored refresh token for a new token pair
    RefreshToken {
        /// Issue a new refresh token as well
        #[arg(long, conflicts_with = "no_rotate")]
        rotate: bool,

        /// Keep the current refresh token
        #[arg(long)]
        no_rotate: bool,
    },

    /// Show the current employee and what they may do
    Whoami,

    /// Employee accounts
    Employees {
        #[command(subcommand)]
        command: EmployeesCommand,
    },

    /// Client records
    Clients {
        #[command(subcommand)]
        command: ClientsCommand,
    },

    /// Contracts
    Contracts {
        #[command(subcommand)]
        command: ContractsCommand,
    },

    /// Events
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },
}

impl Command {
    /// The refresh rotation requested on the command line, if any.
    pub fn rotation(rotate: bool, no_rotate: bool) -> Option<bool> {
        match (rotate, no_rotate) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum EmployeesCommand {
    /// Create an account (MANAGEMENT; the very first account needs no session)
    Create {
        first_name: String,
        last_name: String,
        email: String,
        /// MANAGEMENT, SALES or SUPPORT
        role: Role,
        /// Read from stdin when omitted
        password: Option<String>,
    },

    /// List accounts
    List {
        #[arg(long)]
        role: Option<Role>,
    },

    /// Deactivate an account (MANAGEMENT)
    Deactivate { employee_id: EmployeeId },

    /// Reactivate an account (MANAGEMENT)
    Reactivate { employee_id: EmployeeId },

    /// Permanently delete an unreferenced account (MANAGEMENT)
    Delete {
        employee_id: EmployeeId,
        /// Repeat the id to confirm
        #[arg(long)]
        confirm: EmployeeId,
    },
}

#[derive(Debug, Subcommand)]
pub enum ClientsCommand {
    List {
        /// Only clients I am the sales contact for
        #[arg(long)]
        mine: bool,
    },

    /// Create a client owned by the caller (SALES)
    Create {
        first_name: String,
        last_name: String,
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
    },

    /// Edit a client (owning SALES or MANAGEMENT); an empty value clears phone or company
    Update {
        client_id: ClientId,
        #[command(flatten)]
        fields: ClientFields,
    },

    /// Hand a client and its contracts to another SALES employee
    Reassign {
        client_id: ClientId,
        sales_contact_id: EmployeeId,
    },
}

#[derive(Debug, Args)]
pub struct ClientFields {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ContractsCommand {
    List {
        #[arg(long)]
        unsigned: bool,
        /// Only contracts with an amount still due
        #[arg(long)]
        unpaid: bool,
    },

    /// Create an unsigned contract (MANAGEMENT or the client's SALES contact)
    Create {
        client_id: ClientId,
        #[arg(allow_hyphen_values = true)]
        total: Money,
        #[arg(allow_hyphen_values = true)]
        amount_due: Money,
    },

    /// Change amounts (owning SALES or MANAGEMENT)
    Update {
        contract_id: ContractId,
        #[arg(long, allow_hyphen_values = true)]
        total: Option<Money>,
        #[arg(long, allow_hyphen_values = true)]
        amount_due: Option<Money>,
    },

    /// Sign a contract (MANAGEMENT)
    Sign { contract_id: ContractId },

    /// Hand a contract to another SALES employee
    Reassign {
        contract_id: ContractId,
        sales_contact_id: EmployeeId,
    },
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    List {
        #[arg(long)]
        without_support: bool,
        /// Only events I support
        #[arg(long)]
        mine: bool,
    },

    /// Create an event for a signed contract (owning SALES)
    Create {
        client_id: ClientId,
        contract_id: ContractId,
        /// "YYYY-MM-DD HH:MM", UTC
        #[arg(value_parser = parse_datetime)]
        start: DateTime<Utc>,
        /// "YYYY-MM-DD HH:MM", UTC
        #[arg(value_parser = parse_datetime)]
        end: DateTime<Utc>,
        location: String,
        #[arg(allow_hyphen_values = true)]
        attendees: i32,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Edit an event (its SUPPORT contact or MANAGEMENT)
    Update {
        event_id: EventId,
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_datetime)]
        end: Option<DateTime<Utc>>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        attendees: Option<i32>,
        #[arg(long)]
        notes: Option<String>,
        /// Move the event to another SUPPORT employee (MANAGEMENT)
        #[arg(long)]
        support_contact_id: Option<EmployeeId>,
    },

    /// Give an event a SUPPORT contact (MANAGEMENT)
    Assign {
        event_id: EventId,
        support_contact_id: EmployeeId,
    },

    /// Remove an event's SUPPORT contact (MANAGEMENT)
    Unassign { event_id: EventId },
}

/// Accepts `YYYY-MM-DD HH:MM` or `YYYY-MM-DDTHH:MM`, read as UTC.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    let normalized = raw.trim().replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&normalized, DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("expected \"YYYY-MM-DD HH:MM\", got \"{raw}\""))
}
