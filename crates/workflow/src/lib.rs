//! `epiccrm-workflow`: records, persistence collaborators and workflow guards.
//!
//! Every guard takes the resolved actor and the collaborators it needs, checks
//! policy, re-reads the target record, validates the transition and writes at
//! most once per record. Guards fail fast and never partially apply.

pub mod client;
pub mod contract;
pub mod employee;
pub mod event;
pub mod identity;
mod input;
pub mod memory;
pub mod store;

pub use client::Client;
pub use contract::{Contract, check_amounts};
pub use employee::Employee;
pub use event::Event;
pub use identity::{IdentityResolver, authenticate, login, logout, refresh};
pub use input::normalize_email;
pub use memory::{InMemoryStore, Snapshot};
pub use store::{
    ClientQuery, ClientStore, ContractQuery, ContractStore, CrmStore, EmployeeDirectory,
    EventQuery, EventStore, ReferenceCounts,
};
