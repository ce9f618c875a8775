//! Persistence collaborators.
//!
//! Guards only ever talk to these traits. Filters are intents; the collaborator
//! executes the query.

use epiccrm_core::{ClientId, ContractId, EmployeeId, EventId, Role, StoreError};

use crate::client::Client;
use crate::contract::Contract;
use crate::employee::Employee;
use crate::event::Event;

/// How many records name an employee as their sales or support contact.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCounts {
    pub clients: usize,
    pub contracts: usize,
    pub events: usize,
}

impl ReferenceCounts {
    pub fn is_zero(&self) -> bool {
        self.clients == 0 && self.contracts == 0 && self.events == 0
    }
}

pub trait EmployeeDirectory {
    fn get_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;
    /// Lookup by normalized (trimmed, lowercase) email.
    fn get_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError>;
    fn list_all(&self) -> Result<Vec<Employee>, StoreError>;
    fn list_by_role(&self, role: Role) -> Result<Vec<Employee>, StoreError>;
    fn count(&self) -> Result<usize, StoreError>;
    /// Clients and contracts by sales contact, events by support contact.
    fn count_references(&self, id: EmployeeId) -> Result<ReferenceCounts, StoreError>;
    fn add_employee(&self, employee: Employee) -> Result<(), StoreError>;
    fn update_employee(&self, employee: &Employee) -> Result<(), StoreError>;
    fn remove_employee(&self, id: EmployeeId) -> Result<(), StoreError>;
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ClientQuery {
    pub sales_contact: Option<EmployeeId>,
}

pub trait ClientStore {
    fn get_client(&self, id: ClientId) -> Result<Option<Client>, StoreError>;
    fn get_client_by_email(&self, email: &str) -> Result<Option<Client>, StoreError>;
    fn list_clients(&self, query: ClientQuery) -> Result<Vec<Client>, StoreError>;
    fn add_client(&self, client: Client) -> Result<(), StoreError>;
    fn update_client(&self, client: &Client) -> Result<(), StoreError>;
}

/// Contract filter intents. All set conditions must hold.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ContractQuery {
    pub unsigned: bool,
    /// `amount_due > 0`.
    pub unpaid: bool,
    pub client: Option<ClientId>,
}

pub trait ContractStore {
    fn get_contract(&self, id: ContractId) -> Result<Option<Contract>, StoreError>;
    fn list_contracts(&self, query: ContractQuery) -> Result<Vec<Contract>, StoreError>;
    fn add_contract(&self, contract: Contract) -> Result<(), StoreError>;
    fn update_contract(&self, contract: &Contract) -> Result<(), StoreError>;
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub without_support: bool,
    pub support_contact: Option<EmployeeId>,
}

pub trait EventStore {
    fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError>;
    fn list_events(&self, query: EventQuery) -> Result<Vec<Event>, StoreError>;
    fn add_event(&self, event: Event) -> Result<(), StoreError>;
    fn update_event(&self, event: &Event) -> Result<(), StoreError>;
}

/// Everything a command may need.
pub trait CrmStore: EmployeeDirectory + ClientStore + ContractStore + EventStore {}

impl<S> CrmStore for S where S: EmployeeDirectory + ClientStore + ContractStore + EventStore {}
