//! Contracts: amount bounds and the one-way `Unsigned → Signed` transition.
//!
//! `0 < total_amount` and `0 <= amount_due <= total_amount` hold for every
//! stored contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epiccrm_auth::{authorize, authorize_owned};
use epiccrm_core::{
    Action, ClientId, ContractId, DomainError, DomainResult, EmployeeId, Entity, EntityKind, Money,
    Role, ValidationError,
};

use crate::employee::{Employee, require_assignable};
use crate::store::{ClientStore, ContractQuery, ContractStore, EmployeeDirectory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub client_id: ClientId,
    /// Copied from the client at creation.
    pub sales_contact_id: EmployeeId,
    pub total_amount: Money,
    pub amount_due: Money,
    pub is_signed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn is_paid(&self) -> bool {
        !self.amount_due.is_positive()
    }
}

impl Entity for Contract {
    type Id = ContractId;

    const KIND: EntityKind = EntityKind::Contract;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: CreateContract. Contracts always start unsigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContract {
    pub client_id: ClientId,
    pub total_amount: Money,
    pub amount_due: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateContract. Only supplied amounts change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateContract {
    pub contract_id: ContractId,
    pub total_amount: Option<Money>,
    pub amount_due: Option<Money>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignContract {
    pub contract_id: ContractId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignContract {
    pub contract_id: ContractId,
    pub sales_contact_id: EmployeeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ContractFilter {
    pub unsigned: bool,
    pub unpaid: bool,
}

/// `0 < total` and `0 <= due <= total`.
pub fn check_amounts(total: Money, due: Money) -> Result<(), ValidationError> {
    if !total.is_positive() {
        return Err(ValidationError::TotalNotPositive(total));
    }
    if due.is_negative() {
        return Err(ValidationError::NegativeAmountDue(due));
    }
    if due > total {
        return Err(ValidationError::AmountDueExceedsTotal { due, total });
    }
    Ok(())
}

pub(crate) fn find<S>(store: &S, id: ContractId) -> DomainResult<Contract>
where
    S: ContractStore + ?Sized,
{
    store
        .get_contract(id)?
        .ok_or_else(|| DomainError::not_found(EntityKind::Contract, id))
}

pub fn create<S>(actor: &Employee, store: &S, cmd: CreateContract) -> DomainResult<Contract>
where
    S: ClientStore + ContractStore + ?Sized,
{
    authorize(&actor.principal(), Action::CreateContract)?;
    check_amounts(cmd.total_amount, cmd.amount_due)?;

    let client = crate::client::find(store, cmd.client_id)?;

    let contract = Contract {
        id: ContractId::new(),
        client_id: client.id,
        sales_contact_id: client.sales_contact_id,
        total_amount: cmd.total_amount,
        amount_due: cmd.amount_due,
        is_signed: false,
        created_at: cmd.occurred_at,
        updated_at: cmd.occurred_at,
    };
    store.add_contract(contract.clone())?;

    tracing::info!(
        contract_id = %contract.id,
        client_id = %client.id,
        actor = %actor.id,
        "contract created"
    );
    Ok(contract)
}

/// Apply the supplied amounts, then re-check the final pair as a whole.
///
/// Nothing is written unless the resulting contract satisfies the bounds.
pub fn update<S>(actor: &Employee, store: &S, cmd: UpdateContract) -> DomainResult<Contract>
where
    S: ContractStore + ?Sized,
{
    let principal = actor.principal();
    authorize(&principal, Action::UpdateContract)?;

    let mut contract = find(store, cmd.contract_id)?;
    authorize_owned(&principal, Action::UpdateContract, Some(contract.sales_contact_id))?;

    let total = cmd.total_amount.unwrap_or(contract.total_amount);
    let due = cmd.amount_due.unwrap_or(contract.amount_due);
    check_amounts(total, due)?;

    contract.total_amount = total;
    contract.amount_due = due;
    contract.updated_at = cmd.occurred_at;
    store.update_contract(&contract)?;

    tracing::info!(contract_id = %contract.id, actor = %actor.id, "contract updated");
    Ok(contract)
}

/// MANAGEMENT only. Signing is irreversible; a second sign is rejected.
pub fn sign<S>(actor: &Employee, store: &S, cmd: SignContract) -> DomainResult<Contract>
where
    S: ContractStore + ?Sized,
{
    authorize(&actor.principal(), Action::SignContract)?;

    let mut contract = find(store, cmd.contract_id)?;
    if contract.is_signed {
        return Err(ValidationError::ContractAlreadySigned.into());
    }

    contract.is_signed = true;
    contract.updated_at = cmd.occurred_at;
    store.update_contract(&contract)?;

    tracing::info!(contract_id = %contract.id, actor = %actor.id, "contract signed");
    Ok(contract)
}

pub fn reassign<S>(actor: &Employee, store: &S, cmd: ReassignContract) -> DomainResult<Contract>
where
    S: EmployeeDirectory + ContractStore + ?Sized,
{
    let principal = actor.principal();
    authorize(&principal, Action::ReassignContract)?;

    let mut contract = find(store, cmd.contract_id)?;
    authorize_owned(&principal, Action::ReassignContract, Some(contract.sales_contact_id))?;

    let target = require_assignable(store, cmd.sales_contact_id, Role::Sales)?;
    contract.sales_contact_id = target.id;
    contract.updated_at = cmd.occurred_at;
    store.update_contract(&contract)?;

    tracing::info!(
        contract_id = %contract.id,
        sales_contact = %target.id,
        actor = %actor.id,
        "contract reassigned"
    );
    Ok(contract)
}

pub fn list<S>(actor: &Employee, store: &S, filter: ContractFilter) -> DomainResult<Vec<Contract>>
where
    S: ContractStore + ?Sized,
{
    authorize(&actor.principal(), Action::ListContracts)?;
    Ok(store.list_contracts(ContractQuery {
        unsigned: filter.unsigned,
        unpaid: filter.unpaid,
        client: None,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::memory::InMemoryStore;
    use epiccrm_core::PermissionDenied;
    use proptest::prelude::*;

    fn employee(store: &InMemoryStore, role: Role) -> Employee {
        let id = EmployeeId::new();
        let e = Employee {
            id,
            first_name: "E".into(),
            last_name: "Mp".into(),
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

    fn client_of(store: &InMemoryStore, sales: &Employee) -> Client {
        let id = ClientId::new();
        let c = Client {
            id,
            first_name: "C".into(),
            last_name: "L".into(),
            email: format!("{id}@client.io"),
            phone: None,
            company_name: None,
            sales_contact_id: sales.id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.add_client(c.clone()).unwrap();
        c
    }

    fn new_contract(client_id: ClientId, total: i64, due: i64) -> CreateContract {
        CreateContract {
            client_id,
            total_amount: Money::from_units(total),
            amount_due: Money::from_units(due),
            occurred_at: Utc::now(),
        }
    }

    fn amounts(contract_id: ContractId, total: Option<i64>, due: Option<i64>) -> UpdateContract {
        UpdateContract {
            contract_id,
            total_amount: total.map(Money::from_units),
            amount_due: due.map(Money::from_units),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn create_copies_sales_contact_and_starts_unsigned() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        let boss = employee(&store, Role::Management);
        let client = client_of(&store, &sales);

        let contract = create(&boss, &store, new_contract(client.id, 1000, 200)).unwrap();
        assert_eq!(contract.sales_contact_id, sales.id);
        assert!(!contract.is_signed);
    }

    #[test]
    fn create_checks_bounds_and_client() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        let client = client_of(&store, &sales);

        assert_eq!(
            create(&sales, &store, new_contract(client.id, 0, 0)).unwrap_err(),
            DomainError::from(ValidationError::TotalNotPositive(Money::ZERO))
        );
        assert!(matches!(
            create(&sales, &store, new_contract(client.id, 100, 101)).unwrap_err(),
            DomainError::Validation(ValidationError::AmountDueExceedsTotal { .. })
        ));
        assert!(matches!(
            create(&sales, &store, new_contract(ClientId::new(), 100, 0)).unwrap_err(),
            DomainError::NotFound { kind: EntityKind::Client, .. }
        ));
    }

    #[test]
    fn support_cannot_create_contracts() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        let support = employee(&store, Role::Support);
        let client = client_of(&store, &sales);
        assert!(matches!(
            create(&support, &store, new_contract(client.id, 10, 0)).unwrap_err(),
            DomainError::PermissionDenied(PermissionDenied::RequiredRoles { .. })
        ));
    }

    #[test]
    fn partial_update_is_checked_against_final_pair() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        let client = client_of(&store, &sales);
        let contract = create(&sales, &store, new_contract(client.id, 1000, 200)).unwrap();

        // Lowering total below the existing due is rejected, nothing is written.
        let err = update(&sales, &store, amounts(contract.id, Some(100), None)).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::AmountDueExceedsTotal { .. })
        ));
        assert_eq!(store.get_contract(contract.id).unwrap().unwrap(), contract);

        // Both supplied together is fine.
        let updated = update(&sales, &store, amounts(contract.id, Some(100), Some(50))).unwrap();
        assert_eq!(updated.total_amount, Money::from_units(100));
        assert_eq!(updated.amount_due, Money::from_units(50));
    }

    #[test]
    fn other_sales_cannot_update() {
        let store = InMemoryStore::new();
        let sales1 = employee(&store, Role::Sales);
        let sales2 = employee(&store, Role::Sales);
        let client = client_of(&store, &sales1);
        let contract = create(&sales1, &store, new_contract(client.id, 1000, 200)).unwrap();

        let err = update(&sales2, &store, amounts(contract.id, Some(2000), None)).unwrap_err();
        assert!(matches!(
            err,
            DomainError::PermissionDenied(PermissionDenied::RequiredOwnership { .. })
        ));
    }

    #[test]
    fn sign_is_management_only_and_one_way() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        let boss = employee(&store, Role::Management);
        let client = client_of(&store, &sales);
        let contract = create(&sales, &store, new_contract(client.id, 1000, 0)).unwrap();
        let cmd = SignContract { contract_id: contract.id, occurred_at: Utc::now() };

        assert!(sign(&sales, &store, cmd.clone()).is_err());
        assert!(sign(&boss, &store, cmd.clone()).unwrap().is_signed);
        assert_eq!(
            sign(&boss, &store, cmd).unwrap_err(),
            DomainError::from(ValidationError::ContractAlreadySigned)
        );
    }

    #[test]
    fn reassign_requires_active_sales_target() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        let next = employee(&store, Role::Sales);
        let support = employee(&store, Role::Support);
        let client = client_of(&store, &sales);
        let contract = create(&sales, &store, new_contract(client.id, 10, 0)).unwrap();

        let to = |id| ReassignContract {
            contract_id: contract.id,
            sales_contact_id: id,
            occurred_at: Utc::now(),
        };
        assert!(matches!(
            reassign(&sales, &store, to(support.id)).unwrap_err(),
            DomainError::Validation(ValidationError::WrongRole { .. })
        ));
        assert!(matches!(
            reassign(&support, &store, to(next.id)).unwrap_err(),
            DomainError::PermissionDenied(PermissionDenied::RequiredRoles { .. })
        ));
        assert_eq!(reassign(&sales, &store, to(next.id)).unwrap().sales_contact_id, next.id);
    }

    #[test]
    fn list_filters_unsigned_and_unpaid() {
        let store = InMemoryStore::new();
        let sales = employee(&store, Role::Sales);
        let boss = employee(&store, Role::Management);
        let client = client_of(&store, &sales);
        let paid = create(&sales, &store, new_contract(client.id, 10, 0)).unwrap();
        create(&sales, &store, new_contract(client.id, 10, 5)).unwrap();
        sign(
            &boss,
            &store,
            SignContract { contract_id: paid.id, occurred_at: Utc::now() },
        )
        .unwrap();

        let unsigned = list(
            &sales,
            &store,
            ContractFilter { unsigned: true, unpaid: false },
        )
        .unwrap();
        assert_eq!(unsigned.len(), 1);
        let unpaid = list(
            &sales,
            &store,
            ContractFilter { unsigned: false, unpaid: true },
        )
        .unwrap();
        assert_eq!(unpaid.len(), 1);
        assert!(!unpaid[0].is_paid());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn stored_contract_always_satisfies_bounds(
            start_total in 1i64..10_000,
            start_due_pct in 0i64..=100,
            new_total in prop::option::of(-100i64..20_000),
            new_due in prop::option::of(-100i64..20_000),
        ) {
            let store = InMemoryStore::new();
            let sales = employee(&store, Role::Sales);
            let client = client_of(&store, &sales);
            let start_due = start_total * start_due_pct / 100;
            let before = create(
                &sales,
                &store,
                new_contract(client.id, start_total, start_due),
            )
            .unwrap();

            let result = update(&sales, &store, amounts(before.id, new_total, new_due));
            let after = store.get_contract(before.id).unwrap().unwrap();

            prop_assert!(check_amounts(after.total_amount, after.amount_due).is_ok());
            match result {
                Ok(updated) => prop_assert_eq!(updated, after),
                Err(_) => prop_assert_eq!(before, after),
            }
        }
    }
}
