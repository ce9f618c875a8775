//! In-memory implementation of every persistence collaborator.
//!
//! Records live in ordered maps keyed by their UUIDv7 ids, so listings come
//! back in creation order. [`Snapshot`] is the serializable form.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use epiccrm_core::{ClientId, ContractId, EmployeeId, EventId, Role, StoreError};

use crate::client::Client;
use crate::contract::Contract;
use crate::employee::Employee;
use crate::event::Event;
use crate::store::{
    ClientQuery, ClientStore, ContractQuery, ContractStore, EmployeeDirectory, EventQuery,
    EventStore, ReferenceCounts,
};

/// Every record, as persisted between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Default)]
struct Tables {
    employees: BTreeMap<EmployeeId, Employee>,
    clients: BTreeMap<ClientId, Client>,
    contracts: BTreeMap<ContractId, Contract>,
    events: BTreeMap<EventId, Event>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let tables = Tables {
            employees: snapshot.employees.into_iter().map(|e| (e.id, e)).collect(),
            clients: snapshot.clients.into_iter().map(|c| (c.id, c)).collect(),
            contracts: snapshot.contracts.into_iter().map(|c| (c.id, c)).collect(),
            events: snapshot.events.into_iter().map(|e| (e.id, e)).collect(),
        };
        Self {
            inner: RwLock::new(tables),
        }
    }

    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let t = self.read()?;
        Ok(Snapshot {
            employees: t.employees.values().cloned().collect(),
            clients: t.clients.values().cloned().collect(),
            contracts: t.contracts.values().cloned().collect(),
            events: t.events.values().cloned().collect(),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::new("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::new("in-memory store lock poisoned"))
    }
}

fn missing(kind: &str, id: impl core::fmt::Display) -> StoreError {
    StoreError::new(format!("no {kind} row with id {id}"))
}

fn duplicate(kind: &str, id: impl core::fmt::Display) -> StoreError {
    StoreError::new(format!("{kind} row {id} already exists"))
}

impl EmployeeDirectory for InMemoryStore {
    fn get_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.read()?.employees.get(&id).cloned())
    }

    fn get_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .read()?
            .employees
            .values()
            .find(|e| e.email == email)
            .cloned())
    }

    fn list_all(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(self.read()?.employees.values().cloned().collect())
    }

    fn list_by_role(&self, role: Role) -> Result<Vec<Employee>, StoreError> {
        Ok(self
            .read()?
            .employees
            .values()
            .filter(|e| e.role == role)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.employees.len())
    }

    fn count_references(&self, id: EmployeeId) -> Result<ReferenceCounts, StoreError> {
        let t = self.read()?;
        Ok(ReferenceCounts {
            clients: t.clients.values().filter(|c| c.sales_contact_id == id).count(),
            contracts: t.contracts.values().filter(|c| c.sales_contact_id == id).count(),
            events: t
                .events
                .values()
                .filter(|e| e.support_contact_id == Some(id))
                .count(),
        })
    }

    fn add_employee(&self, employee: Employee) -> Result<(), StoreError> {
        let mut t = self.write()?;
        if t.employees.contains_key(&employee.id) {
            return Err(duplicate("employee", employee.id));
        }
        t.employees.insert(employee.id, employee);
        Ok(())
    }

    fn update_employee(&self, employee: &Employee) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let slot = t
            .employees
            .get_mut(&employee.id)
            .ok_or_else(|| missing("employee", employee.id))?;
        *slot = employee.clone();
        Ok(())
    }

    fn remove_employee(&self, id: EmployeeId) -> Result<(), StoreError> {
        self.write()?
            .employees
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("employee", id))
    }
}

impl ClientStore for InMemoryStore {
    fn get_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.read()?.clients.get(&id).cloned())
    }

    fn get_client_by_email(&self, email: &str) -> Result<Option<Client>, StoreError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .read()?
            .clients
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    fn list_clients(&self, query: ClientQuery) -> Result<Vec<Client>, StoreError> {
        Ok(self
            .read()?
            .clients
            .values()
            .filter(|c| query.sales_contact.is_none_or(|id| c.sales_contact_id == id))
            .cloned()
            .collect())
    }

    fn add_client(&self, client: Client) -> Result<(), StoreError> {
        let mut t = self.write()?;
        if t.clients.contains_key(&client.id) {
            return Err(duplicate("client", client.id));
        }
        t.clients.insert(client.id, client);
        Ok(())
    }

    fn update_client(&self, client: &Client) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let slot = t
            .clients
            .get_mut(&client.id)
            .ok_or_else(|| missing("client", client.id))?;
        *slot = client.clone();
        Ok(())
    }
}

impl ContractStore for InMemoryStore {
    fn get_contract(&self, id: ContractId) -> Result<Option<Contract>, StoreError> {
        Ok(self.read()?.contracts.get(&id).cloned())
    }

    fn list_contracts(&self, query: ContractQuery) -> Result<Vec<Contract>, StoreError> {
        Ok(self
            .read()?
            .contracts
            .values()
            .filter(|c| !query.unsigned || !c.is_signed)
            .filter(|c| !query.unpaid || c.amount_due.is_positive())
            .filter(|c| query.client.is_none_or(|id| c.client_id == id))
            .cloned()
            .collect())
    }

    fn add_contract(&self, contract: Contract) -> Result<(), StoreError> {
        let mut t = self.write()?;
        if t.contracts.contains_key(&contract.id) {
            return Err(duplicate("contract", contract.id));
        }
        t.contracts.insert(contract.id, contract);
        Ok(())
    }

    fn update_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let slot = t
            .contracts
            .get_mut(&contract.id)
            .ok_or_else(|| missing("contract", contract.id))?;
        *slot = contract.clone();
        Ok(())
    }
}

impl EventStore for InMemoryStore {
    fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.read()?.events.get(&id).cloned())
    }

    fn list_events(&self, query: EventQuery) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .read()?
            .events
            .values()
            .filter(|e| !query.without_support || e.support_contact_id.is_none())
            .filter(|e| {
                query
                    .support_contact
                    .is_none_or(|id| e.support_contact_id == Some(id))
            })
            .cloned()
            .collect())
    }

    fn add_event(&self, event: Event) -> Result<(), StoreError> {
        let mut t = self.write()?;
        if t.events.contains_key(&event.id) {
            return Err(duplicate("event", event.id));
        }
        t.events.insert(event.id, event);
        Ok(())
    }

    fn update_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let slot = t
            .events
            .get_mut(&event.id)
            .ok_or_else(|| missing("event", event.id))?;
        *slot = event.clone();
        Ok(())
    }
}
