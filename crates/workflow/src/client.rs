//! Clients and their sales-contact ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epiccrm_auth::{authorize, authorize_owned};
use epiccrm_core::{
    Action, ClientId, DomainError, DomainResult, EmployeeId, Entity, EntityKind, Role,
    ValidationError,
};

use crate::employee::{Employee, require_assignable};
use crate::input::{normalize_email, optional, required};
use crate::store::{ClientQuery, ClientStore, ContractQuery, ContractStore, EmployeeDirectory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub sales_contact_id: EmployeeId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Client {
    type Id = ClientId;

    const KIND: EntityKind = EntityKind::Client;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateClient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateClient. `None` keeps a field; a blank phone or company clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateClient {
    pub client_id: ClientId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignClient {
    pub client_id: ClientId,
    pub sales_contact_id: EmployeeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    /// Only clients whose sales contact is the actor.
    pub mine: bool,
}

pub(crate) fn find<S>(store: &S, id: ClientId) -> DomainResult<Client>
where
    S: ClientStore + ?Sized,
{
    store
        .get_client(id)?
        .ok_or_else(|| DomainError::not_found(EntityKind::Client, id))
}

fn ensure_email_free<S>(store: &S, email: &str, except: Option<ClientId>) -> DomainResult<()>
where
    S: ClientStore + ?Sized,
{
    match store.get_client_by_email(email)? {
        Some(existing) if Some(existing.id) != except => Err(ValidationError::DuplicateEmail {
            kind: EntityKind::Client,
            email: email.to_string(),
        }
        .into()),
        _ => Ok(()),
    }
}

/// SALES only; the creator becomes the sales contact.
pub fn create<S>(actor: &Employee, store: &S, cmd: CreateClient) -> DomainResult<Client>
where
    S: ClientStore + ?Sized,
{
    authorize(&actor.principal(), Action::CreateClient)?;

    let first_name = required("first_name", &cmd.first_name)?;
    let last_name = required("last_name", &cmd.last_name)?;
    let email = normalize_email(&cmd.email)?;
    ensure_email_free(store, &email, None)?;

    let client = Client {
        id: ClientId::new(),
        first_name,
        last_name,
        email,
        phone: optional(cmd.phone.as_deref()),
        company_name: optional(cmd.company_name.as_deref()),
        sales_contact_id: actor.id,
        created_at: cmd.occurred_at,
        updated_at: cmd.occurred_at,
    };
    store.add_client(client.clone())?;

    tracing::info!(client_id = %client.id, sales_contact = %actor.id, "client created");
    Ok(client)
}

/// MANAGEMENT, or the owning SALES contact.
pub fn update<S>(actor: &Employee, store: &S, cmd: UpdateClient) -> DomainResult<Client>
where
    S: ClientStore + ?Sized,
{
    let principal = actor.principal();
    authorize(&principal, Action::UpdateClient)?;

    let mut client = find(store, cmd.client_id)?;
    authorize_owned(&principal, Action::UpdateClient, Some(client.sales_contact_id))?;

    if let Some(first_name) = cmd.first_name.as_deref() {
        client.first_name = required("first_name", first_name)?;
    }
    if let Some(last_name) = cmd.last_name.as_deref() {
        client.last_name = required("last_name", last_name)?;
    }
    if let Some(email) = cmd.email.as_deref() {
        let email = normalize_email(email)?;
        ensure_email_free(store, &email, Some(client.id))?;
        client.email = email;
    }
    if let Some(phone) = cmd.phone.as_deref() {
        client.phone = optional(Some(phone));
    }
    if let Some(company) = cmd.company_name.as_deref() {
        client.company_name = optional(Some(company));
    }
    client.updated_at = cmd.occurred_at;
    store.update_client(&client)?;

    tracing::info!(client_id = %client.id, actor = %actor.id, "client updated");
    Ok(client)
}

/// Hand a client to another active SALES employee.
///
/// Every contract of the client follows its new sales contact.
pub fn reassign<S>(actor: &Employee, store: &S, cmd: ReassignClient) -> DomainResult<Client>
where
    S: EmployeeDirectory + ClientStore + ContractStore + ?Sized,
{
    let principal = actor.principal();
    authorize(&principal, Action::ReassignClient)?;

    let mut client = find(store, cmd.client_id)?;
    authorize_owned(&principal, Action::ReassignClient, Some(client.sales_contact_id))?;

    let target = require_assignable(store, cmd.sales_contact_id, Role::Sales)?;
    let contracts = store.list_contracts(ContractQuery {
        client: Some(client.id),
        ..ContractQuery::default()
    })?;

    client.sales_contact_id = target.id;
    client.updated_at = cmd.occurred_at;
    store.update_client(&client)?;

    for mut contract in contracts {
        contract.sales_contact_id = target.id;
        contract.updated_at = cmd.occurred_at;
        store.update_contract(&contract)?;
    }

    tracing::info!(
        client_id = %client.id,
        sales_contact = %target.id,
        actor = %actor.id,
        "client reassigned"
    );
    Ok(client)
}

pub fn list<S>(actor: &Employee, store: &S, filter: ClientFilter) -> DomainResult<Vec<Client>>
where
    S: ClientStore + ?Sized,
{
    authorize(&actor.principal(), Action::ListClients)?;
    let query = ClientQuery {
        sales_contact: filter.mine.then_some(actor.id),
    };
    Ok(store.list_clients(query)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use epiccrm_core::PermissionDenied;

    fn employee(store: &InMemoryStore, role: Role) -> Employee {
        let id = EmployeeId::new();
        let e = Employee {
            id,
            first_name: "E".into(),
            last_name: role.as_str().into(),
            email: format!("{id}@epic.io"),
            role,
            password_hash: "x".into(),
            is_active: true,
            created_at: Utc::now(),
            deactivated_at: None,
            reactivated_at: None,
        };
        store.add_employee(e.clone()).unwrap();
        e
    }

    fn new_client(email: &str) -> CreateClient {
        CreateClient {
            first_name: " Kevin ".into(),
            last_name: "Casey".into(),
            email: email.into(),
            phone: Some("  ".into()),
            company_name: Some("Cool Startup".into()),
            occurred_at: Utc::now(),
        }
    }

    fn edit(client_id: ClientId) -> UpdateClient {
        UpdateClient {
            client_id,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            company_name: None,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn sales_creates_and_owns_client() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);

        let client = create(&sales, &store, new_client("Kevin@Startup.io")).unwrap();
        assert_eq!(client.sales_contact_id, sales.id);
        assert_eq!(client.first_name, "Kevin");
        assert_eq!(client.email, "kevin@startup.io");
        assert_eq!(client.phone, None);
    }

    #[test]
    fn management_cannot_create_client() {
        let store = InMemoryStore::new();
        let boss = employee(&store, Role::Management);
        let err = create(&boss, &store, new_client("k@s.io")).unwrap_err();
        assert!(matches!(
            err,
            DomainError::PermissionDenied(PermissionDenied::RequiredRoles { .. })
        ));
    }

    #[test]
    fn duplicate_client_email_is_rejected() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        create(&sales, &store, new_client("k@s.io")).unwrap();
        let err = create(&sales, &store, new_client("K@S.io")).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::DuplicateEmail {
                kind: EntityKind::Client,
                ..
            })
        ));
    }

    #[test]
    fn only_owner_or_management_updates() {
        let store = InMemoryStore::new();
        let owner = employee(&store, Role::Sales);
        let other = employee(&store, Role::Sales);
        let boss = employee(&store, Role::Management);
        let client = create(&owner, &store, new_client("k@s.io")).unwrap();

        let mut cmd = edit(client.id);
        cmd.company_name = Some("Other".into());
        let err = update(&other, &store, cmd.clone()).unwrap_err();
        assert!(matches!(
            err,
            DomainError::PermissionDenied(PermissionDenied::RequiredOwnership { .. })
        ));

        assert_eq!(
            update(&boss, &store, cmd.clone()).unwrap().company_name.as_deref(),
            Some("Other")
        );
        cmd.company_name = Some(String::new());
        assert_eq!(update(&owner, &store, cmd).unwrap().company_name, None);
    }

    #[test]
    fn update_rejects_blank_names_and_taken_email() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        let a = create(&sales, &store, new_client("a@s.io")).unwrap();
        create(&sales, &store, new_client("b@s.io")).unwrap();

        let mut cmd = edit(a.id);
        cmd.last_name = Some("  ".into());
        assert_eq!(
            update(&sales, &store, cmd).unwrap_err(),
            DomainError::from(ValidationError::MissingField("last_name"))
        );

        let mut cmd = edit(a.id);
        cmd.email = Some("b@s.io".into());
        assert!(update(&sales, &store, cmd).is_err());

        let mut cmd = edit(a.id);
        cmd.email = Some("A@S.IO".into());
        assert!(update(&sales, &store, cmd).is_ok());
    }

    #[test]
    fn reassign_moves_contracts_along() {
        let store = InMemoryStore::new();
        let owner = employee(&store, Role::Sales);
        let next = employee(&store, Role::Sales);
        let boss = employee(&store, Role::Management);
        let client = create(&owner, &store, new_client("k@s.io")).unwrap();
        let contract = crate::contract::create(
            &boss,
            &store,
            crate::contract::CreateContract {
                client_id: client.id,
                total_amount: epiccrm_core::Money::from_units(100),
                amount_due: epiccrm_core::Money::ZERO,
                occurred_at: Utc::now(),
            },
        )
        .unwrap();

        let moved = reassign(
            &boss,
            &store,
            ReassignClient {
                client_id: client.id,
                sales_contact_id: next.id,
                occurred_at: Utc::now(),
            },
        )
        .unwrap();
        assert_eq!(moved.sales_contact_id, next.id);
        let contract = store.get_contract(contract.id).unwrap().unwrap();
        assert_eq!(contract.sales_contact_id, next.id);
    }

    #[test]
    fn reassign_target_must_be_active_sales() {
        let store = InMemoryStore::new();
        let owner = employee(&store, Role::Sales);
        let support = employee(&store, Role::Support);
        let client = create(&owner, &store, new_client("k@s.io")).unwrap();

        let err = reassign(
            &owner,
            &store,
            ReassignClient {
                client_id: client.id,
                sales_contact_id: support.id,
                occurred_at: Utc::now(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(ValidationError::WrongRole { .. })));

        let err = reassign(
            &support,
            &store,
            ReassignClient {
                client_id: client.id,
                sales_contact_id: owner.id,
                occurred_at: Utc::now(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DomainError::PermissionDenied(PermissionDenied::RequiredRoles { .. })
        ));
    }

    #[test]
    fn list_mine_only_returns_owned_clients() {
        let store = InMemoryStore::new();
        let a = employee(&store, Role::Sales);
        let b = employee(&store, Role::Sales);
        create(&a, &store, new_client("1@s.io")).unwrap();
        create(&b, &store, new_client("2@s.io")).unwrap();

        assert_eq!(list(&a, &store, ClientFilter { mine: true }).unwrap().len(), 1);
        assert_eq!(list(&a, &store, ClientFilter::default()).unwrap().len(), 2);
    }
}
