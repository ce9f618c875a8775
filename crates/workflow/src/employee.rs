//! Employees: bootstrap, creation and the activation lifecycle.
//!
//! `Active → Deactivated → Active` (reactivated), or `→ Deleted` (hard delete,
//! irreversible). Only MANAGEMENT drives these transitions, never on itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epiccrm_auth::{PasswordError, PasswordHasher, Principal, authorize};
use epiccrm_core::{
    Action, DomainError, DomainResult, EmployeeId, Entity, EntityKind, Role, StoreError,
    ValidationError,
};

use crate::input::{normalize_email, required};
use crate::store::EmployeeDirectory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub reactivated_at: Option<DateTime<Utc>>,
}

impl Employee {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    const KIND: EntityKind = EntityKind::Employee;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: CreateEmployee. Carries the plaintext password until it is hashed.
#[derive(Clone)]
pub struct CreateEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivateEmployee {
    pub employee_id: EmployeeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactivateEmployee {
    pub employee_id: EmployeeId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: HardDeleteEmployee. `confirm_id` must repeat `employee_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardDeleteEmployee {
    pub employee_id: EmployeeId,
    pub confirm_id: EmployeeId,
}

pub(crate) fn find<D>(directory: &D, id: EmployeeId) -> DomainResult<Employee>
where
    D: EmployeeDirectory + ?Sized,
{
    directory
        .get_by_id(id)?
        .ok_or_else(|| DomainError::not_found(EntityKind::Employee, id))
}

/// Load an employee that is about to become a sales or support contact.
///
/// Missing, wrong role and inactive are reported as distinct errors, in that order.
pub(crate) fn require_assignable<D>(
    directory: &D,
    id: EmployeeId,
    role: Role,
) -> DomainResult<Employee>
where
    D: EmployeeDirectory + ?Sized,
{
    let target = find(directory, id)?;
    if target.role != role {
        return Err(ValidationError::WrongRole {
            employee: id,
            expected: role,
            actual: target.role,
        }
        .into());
    }
    if !target.is_active {
        return Err(ValidationError::Inactive(id).into());
    }
    Ok(target)
}

/// Create an employee.
///
/// With an empty directory this is the bootstrap: no session is needed and the
/// account must be MANAGEMENT. Otherwise `actor` is resolved (only then) and
/// must be MANAGEMENT.
pub fn create<D, H, A>(
    directory: &D,
    hasher: &H,
    actor: A,
    cmd: CreateEmployee,
) -> DomainResult<Employee>
where
    D: EmployeeDirectory + ?Sized,
    H: PasswordHasher + ?Sized,
    A: FnOnce() -> DomainResult<Employee>,
{
    let bootstrap = directory.count()? == 0;
    if bootstrap {
        if cmd.role != Role::Management {
            return Err(ValidationError::FirstEmployeeMustBeManagement.into());
        }
    } else {
        let actor = actor()?;
        authorize(&actor.principal(), Action::CreateEmployee)?;
    }

    let first_name = required("first_name", &cmd.first_name)?;
    let last_name = required("last_name", &cmd.last_name)?;
    let email = normalize_email(&cmd.email)?;
    if directory.get_by_email(&email)?.is_some() {
        return Err(ValidationError::DuplicateEmail {
            kind: EntityKind::Employee,
            email,
        }
        .into());
    }

    let password_hash = hasher.hash(&cmd.password).map_err(password_error)?;

    let employee = Employee {
        id: EmployeeId::new(),
        first_name,
        last_name,
        email,
        role: cmd.role,
        password_hash,
        is_active: true,
        created_at: cmd.occurred_at,
        deactivated_at: None,
        reactivated_at: None,
    };
    directory.add_employee(employee.clone())?;

    tracing::info!(
        employee_id = %employee.id,
        role = %employee.role,
        bootstrap,
        "employee created"
    );
    Ok(employee)
}

fn password_error(err: PasswordError) -> DomainError {
    match err {
        PasswordError::Empty => ValidationError::MissingField("password").into(),
        PasswordError::Hashing(msg) => {
            StoreError::new(format!("password hashing failed: {msg}")).into()
        }
    }
}

pub fn list<D>(actor: &Employee, directory: &D, role: Option<Role>) -> DomainResult<Vec<Employee>>
where
    D: EmployeeDirectory + ?Sized,
{
    authorize(&actor.principal(), Action::ListEmployees)?;
    let employees = match role {
        Some(role) => directory.list_by_role(role)?,
        None => directory.list_all()?,
    };
    Ok(employees)
}

/// Soft delete: the row stays, the account can no longer log in.
pub fn deactivate<D>(
    actor: &Employee,
    directory: &D,
    cmd: DeactivateEmployee,
) -> DomainResult<Employee>
where
    D: EmployeeDirectory + ?Sized,
{
    authorize(&actor.principal(), Action::DeactivateEmployee)?;
    if cmd.employee_id == actor.id {
        return Err(ValidationError::SelfTarget {
            action: Action::DeactivateEmployee,
        }
        .into());
    }

    let mut target = find(directory, cmd.employee_id)?;
    if !target.is_active {
        return Err(ValidationError::AlreadyDeactivated(target.id).into());
    }

    target.is_active = false;
    target.deactivated_at = Some(cmd.occurred_at);
    target.reactivated_at = None;
    directory.update_employee(&target)?;

    tracing::info!(employee_id = %target.id, actor = %actor.id, "employee deactivated");
    Ok(target)
}

pub fn reactivate<D>(
    actor: &Employee,
    directory: &D,
    cmd: ReactivateEmployee,
) -> DomainResult<Employee>
where
    D: EmployeeDirectory + ?Sized,
{
    authorize(&actor.principal(), Action::ReactivateEmployee)?;

    let mut target = find(directory, cmd.employee_id)?;
    if target.is_active {
        return Err(ValidationError::AlreadyActive(target.id).into());
    }

    target.is_active = true;
    target.deactivated_at = None;
    target.reactivated_at = Some(cmd.occurred_at);
    directory.update_employee(&target)?;

    tracing::info!(employee_id = %target.id, actor = %actor.id, "employee reactivated");
    Ok(target)
}

/// Irreversibly remove an employee no record refers to.
pub fn hard_delete<D>(actor: &Employee, directory: &D, cmd: HardDeleteEmployee) -> DomainResult<()>
where
    D: EmployeeDirectory + ?Sized,
{
    authorize(&actor.principal(), Action::HardDeleteEmployee)?;
    if cmd.confirm_id != cmd.employee_id {
        return Err(ValidationError::ConfirmationMismatch {
            expected: cmd.employee_id,
            given: cmd.confirm_id,
        }
        .into());
    }
    if cmd.employee_id == actor.id {
        return Err(ValidationError::SelfTarget {
            action: Action::HardDeleteEmployee,
        }
        .into());
    }

    let target = find(directory, cmd.employee_id)?;
    let refs = directory.count_references(target.id)?;
    if !refs.is_zero() {
        return Err(ValidationError::StillReferenced {
            clients: refs.clients,
            contracts: refs.contracts,
            events: refs.events,
        }
        .into());
    }

    directory.remove_employee(target.id)?;
    tracing::info!(employee_id = %target.id, actor = %actor.id, "employee hard-deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use epiccrm_core::PermissionDenied;

    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String, PasswordError> {
            if password.is_empty() {
                return Err(PasswordError::Empty);
            }
            Ok(format!("plain:{password}"))
        }
    }

    fn cmd(email: &str, role: Role) -> CreateEmployee {
        CreateEmployee {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: email.into(),
            role,
            password: "pw".into(),
            occurred_at: Utc::now(),
        }
    }

    fn no_session() -> DomainResult<Employee> {
        Err(DomainError::from(epiccrm_core::NotAuthenticated::NoLocalToken))
    }

    fn seeded() -> (InMemoryStore, Employee) {
        let store = InMemoryStore::new();
        let boss = create(
            &store,
            &PlainHasher,
            no_session,
            cmd("boss@epic.io", Role::Management),
        )
        .unwrap();
        (store, boss)
    }

    fn hire(store: &InMemoryStore, boss: &Employee, email: &str, role: Role) -> Employee {
        let actor = boss.clone();
        create(store, &PlainHasher, move || Ok(actor), cmd(email, role)).unwrap()
    }

    #[test]
    fn bootstrap_requires_management() {
        let store = InMemoryStore::new();
        let err = create(
            &store,
            &PlainHasher,
            no_session,
            cmd("s@epic.io", Role::Sales),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::from(ValidationError::FirstEmployeeMustBeManagement));

        let first = create(
            &store,
            &PlainHasher,
            no_session,
            cmd("M@Epic.io", Role::Management),
        )
        .unwrap();
        assert!(first.is_active);
        assert_eq!(first.email, "m@epic.io");
    }

    #[test]
    fn after_bootstrap_a_session_is_required() {
        let (store, _) = seeded();
        let err = create(
            &store,
            &PlainHasher,
            no_session,
            cmd("x@epic.io", Role::Sales),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::NotAuthenticated(_)));
    }

    #[test]
    fn only_management_creates_employees() {
        let (store, boss) = seeded();
        let sales = hire(&store, &boss, "sales@epic.io", Role::Sales);

        let actor = sales.clone();
        let err = create(&store, &PlainHasher, move || Ok(actor), cmd("y@epic.io", Role::Support))
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::PermissionDenied(PermissionDenied::RequiredRoles { .. })
        ));
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let (store, boss) = seeded();
        let actor = boss.clone();
        let err = create(&store, &PlainHasher, move || Ok(actor), cmd("BOSS@epic.io", Role::Sales))
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::DuplicateEmail { .. })
        ));
    }

    #[test]
    fn empty_password_is_a_missing_field() {
        let store = InMemoryStore::new();
        let mut c = cmd("m@epic.io", Role::Management);
        c.password = String::new();
        let err = create(&store, &PlainHasher, no_session, c).unwrap_err();
        assert_eq!(err, DomainError::from(ValidationError::MissingField("password")));
    }

    #[test]
    fn deactivate_then_reactivate_stamps_timestamps() {
        let (store, boss) = seeded();
        let sales = hire(&store, &boss, "sales@epic.io", Role::Sales);
        let t1 = Utc::now();

        let off = deactivate(
            &boss,
            &store,
            DeactivateEmployee { employee_id: sales.id, occurred_at: t1 },
        )
        .unwrap();
        assert!(!off.is_active);
        assert_eq!(off.deactivated_at, Some(t1));
        assert_eq!(off.reactivated_at, None);

        let again = deactivate(
            &boss,
            &store,
            DeactivateEmployee { employee_id: sales.id, occurred_at: t1 },
        )
        .unwrap_err();
        assert_eq!(again, DomainError::from(ValidationError::AlreadyDeactivated(sales.id)));

        let t2 = Utc::now();
        let on = reactivate(
            &boss,
            &store,
            ReactivateEmployee { employee_id: sales.id, occurred_at: t2 },
        )
        .unwrap();
        assert!(on.is_active);
        assert_eq!(on.deactivated_at, None);
        assert_eq!(on.reactivated_at, Some(t2));

        let twice = reactivate(
            &boss,
            &store,
            ReactivateEmployee { employee_id: sales.id, occurred_at: t2 },
        )
        .unwrap_err();
        assert_eq!(twice, DomainError::from(ValidationError::AlreadyActive(sales.id)));
    }

    #[test]
    fn cannot_deactivate_self() {
        let (store, boss) = seeded();
        let err = deactivate(
            &boss,
            &store,
            DeactivateEmployee { employee_id: boss.id, occurred_at: Utc::now() },
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::from(ValidationError::SelfTarget { action: Action::DeactivateEmployee })
        );
    }

    #[test]
    fn hard_delete_checks_confirmation_before_self_target() {
        let (store, boss) = seeded();
        let other = EmployeeId::new();
        let err = hard_delete(
            &boss,
            &store,
            HardDeleteEmployee { employee_id: boss.id, confirm_id: other },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::ConfirmationMismatch { .. })
        ));

        let err = hard_delete(
            &boss,
            &store,
            HardDeleteEmployee { employee_id: boss.id, confirm_id: boss.id },
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::from(ValidationError::SelfTarget { action: Action::HardDeleteEmployee })
        );
    }

    #[test]
    fn hard_delete_removes_unreferenced_employee() {
        let (store, boss) = seeded();
        let support = hire(&store, &boss, "sup@epic.io", Role::Support);

        hard_delete(
            &boss,
            &store,
            HardDeleteEmployee { employee_id: support.id, confirm_id: support.id },
        )
        .unwrap();
        assert_eq!(store.get_by_id(support.id).unwrap(), None);

        let err = hard_delete(
            &boss,
            &store,
            HardDeleteEmployee { employee_id: support.id, confirm_id: support.id },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { kind: EntityKind::Employee, .. }));
    }

    #[test]
    fn assignable_reports_missing_role_and_inactive_distinctly() {
        let (store, boss) = seeded();
        let sales = hire(&store, &boss, "sales@epic.io", Role::Sales);

        assert!(matches!(
            require_assignable(&store, EmployeeId::new(), Role::Support),
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            require_assignable(&store, sales.id, Role::Support),
            Err(DomainError::Validation(ValidationError::WrongRole { .. }))
        ));

        deactivate(
            &boss,
            &store,
            DeactivateEmployee { employee_id: sales.id, occurred_at: Utc::now() },
        )
        .unwrap();
        assert_eq!(
            require_assignable(&store, sales.id, Role::Sales),
            Err(DomainError::from(ValidationError::Inactive(sales.id)))
        );
    }

    #[test]
    fn list_filters_by_role() {
        let (store, boss) = seeded();
        hire(&store, &boss, "s1@epic.io", Role::Sales);
        hire(&store, &boss, "s2@epic.io", Role::Sales);

        assert_eq!(list(&boss, &store, None).unwrap().len(), 3);
        assert_eq!(list(&boss, &store, Some(Role::Sales)).unwrap().len(), 2);
    }
}
