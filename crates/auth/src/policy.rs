//! Role-based policy: the fixed role matrix plus ownership qualification.
//!
//! Everything here is pure. Decisions are emitted as `tracing` events on the
//! `epiccrm::authz` target but never persisted.

use serde::Serialize;

use epiccrm_core::{Action, EmployeeId, Ownership, PermissionDenied, Role};

/// The acting employee as seen by the policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub employee_id: EmployeeId,
    pub role: Role,
}

impl Principal {
    pub fn new(employee_id: EmployeeId, role: Role) -> Self {
        Self { employee_id, role }
    }
}

const MANAGEMENT: &[Role] = &[Role::Management];
const SALES: &[Role] = &[Role::Sales];
const MANAGEMENT_OR_SALES: &[Role] = &[Role::Management, Role::Sales];
const MANAGEMENT_OR_SUPPORT: &[Role] = &[Role::Management, Role::Support];
const ANY: &[Role] = &Role::ALL;

/// Roles allowed to attempt `action`.
pub fn required_roles(action: Action) -> &'static [Role] {
    match action {
        Action::CreateEmployee
        | Action::DeactivateEmployee
        | Action::ReactivateEmployee
        | Action::HardDeleteEmployee => MANAGEMENT,

        Action::ListEmployees
        | Action::ListClients
        | Action::ListContracts
        | Action::ListEvents => ANY,

        Action::CreateClient => SALES,
        Action::UpdateClient | Action::ReassignClient => MANAGEMENT_OR_SALES,

        Action::CreateContract | Action::UpdateContract | Action::ReassignContract => {
            MANAGEMENT_OR_SALES
        }
        Action::SignContract => MANAGEMENT,

        Action::CreateEvent => SALES,
        Action::UpdateEvent => MANAGEMENT_OR_SUPPORT,
        Action::ReassignEventSupport | Action::UnassignEventSupport => MANAGEMENT,
    }
}

/// Which contact `role` must be on the target record to perform `action`.
///
/// `None` means the role check alone decides.
pub fn ownership_scope(role: Role, action: Action) -> Option<Ownership> {
    match (role, action) {
        (
            Role::Sales,
            Action::UpdateClient
            | Action::ReassignClient
            | Action::UpdateContract
            | Action::ReassignContract
            | Action::CreateEvent,
        ) => Some(Ownership::SalesContact),
        (Role::Support, Action::UpdateEvent) => Some(Ownership::SupportContact),
        _ => None,
    }
}

pub fn allow(role: Role, action: Action) -> bool {
    required_roles(action).contains(&role)
}

/// Every action the matrix lets `role` attempt.
pub fn actions_for(role: Role) -> Vec<Action> {
    Action::ALL.into_iter().filter(|a| allow(role, *a)).collect()
}

/// Ownership facts about the target record, as far as the caller knows them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "contact")]
pub enum OwnershipFacts {
    /// No record is involved yet (or the caller checks ownership itself).
    Unchecked,
    /// The record's relevant contact (sales or support, per the action).
    Contact(Option<EmployeeId>),
}

fn evaluate(
    principal: &Principal,
    action: Action,
    facts: OwnershipFacts,
) -> Result<(), PermissionDenied> {
    let required = required_roles(action);
    if !required.contains(&principal.role) {
        return Err(PermissionDenied::RequiredRoles {
            action,
            required,
            actual: principal.role,
        });
    }

    match (ownership_scope(principal.role, action), facts) {
        (Some(contact), OwnershipFacts::Contact(owner)) if owner != Some(principal.employee_id) => {
            Err(PermissionDenied::RequiredOwnership { action, contact })
        }
        _ => Ok(()),
    }
}

/// Role-only check.
pub fn authorize(principal: &Principal, action: Action) -> Result<(), PermissionDenied> {
    let result = evaluate(principal, action, OwnershipFacts::Unchecked);
    record(principal, action, &result);
    result
}

/// Role check followed by the ownership check for ownership-qualified actions.
///
/// `owner` is the record's sales or support contact, whichever the action
/// concerns.
pub fn authorize_owned(
    principal: &Principal,
    action: Action,
    owner: Option<EmployeeId>,
) -> Result<(), PermissionDenied> {
    let result = evaluate(principal, action, OwnershipFacts::Contact(owner));
    record(principal, action, &result);
    result
}

fn record(principal: &Principal, action: Action, result: &Result<(), PermissionDenied>) {
    match result {
        Ok(()) => tracing::debug!(
            target: "epiccrm::authz",
            principal = %principal.employee_id,
            role = %principal.role,
            %action,
            granted = true,
        ),
        Err(denied) => tracing::info!(
            target: "epiccrm::authz",
            principal = %principal.employee_id,
            role = %principal.role,
            %action,
            granted = false,
            reason = %denied,
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision explanation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    RequiredRoles,
    RequiredOwnership,
}

/// Serializable account of one authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationDecision {
    pub principal: Principal,
    pub action: Action,
    pub granted: bool,
    pub reason: String,
    pub required_roles: Vec<Role>,
    pub required_ownership: Option<Ownership>,
    pub facts: OwnershipFacts,
    pub denial: Option<DenialKind>,
}

/// Explain the decision `authorize`/`authorize_owned` would make.
pub fn explain(
    principal: &Principal,
    action: Action,
    facts: OwnershipFacts,
) -> AuthorizationDecision {
    let result = evaluate(principal, action, facts);
    let required_ownership = ownership_scope(principal.role, action);

    let (granted, reason, denial) = match result {
        Ok(()) => {
            let reason = match (required_ownership, facts) {
                (Some(contact), OwnershipFacts::Contact(_)) => {
                    format!("role {} may {action} as the {contact}", principal.role)
                }
                (Some(contact), OwnershipFacts::Unchecked) => format!(
                    "role {} may {action}; {contact} check left to the caller",
                    principal.role
                ),
                (None, _) => format!("role {} may {action}", principal.role),
            };
            (true, reason, None)
        }
        Err(denied) => {
            let kind = match denied {
                PermissionDenied::RequiredRoles { .. } => DenialKind::RequiredRoles,
                PermissionDenied::RequiredOwnership { .. } => DenialKind::RequiredOwnership,
            };
            (false, denied.to_string(), Some(kind))
        }
    };

    AuthorizationDecision {
        principal: *principal,
        action,
        granted,
        reason,
        required_roles: required_roles(action).to_vec(),
        required_ownership,
        facts,
        denial,
    }
}
