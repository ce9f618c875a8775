//! Actions gated by the authorization policy.

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;

/// Every mutation (and listing) an actor can attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateEmployee,
    ListEmployees,
    DeactivateEmployee,
    ReactivateEmployee,
    HardDeleteEmployee,

    CreateClient,
    ListClients,
    UpdateClient,
    ReassignClient,

    CreateContract,
    ListContracts,
    UpdateContract,
    ReassignContract,
    SignContract,

    CreateEvent,
    ListEvents,
    UpdateEvent,
    ReassignEventSupport,
    UnassignEventSupport,
}

impl Action {
    pub const ALL: [Action; 19] = [
        Action::CreateEmployee,
        Action::ListEmployees,
        Action::DeactivateEmployee,
        Action::ReactivateEmployee,
        Action::HardDeleteEmployee,
        Action::CreateClient,
        Action::ListClients,
        Action::UpdateClient,
        Action::ReassignClient,
        Action::CreateContract,
        Action::ListContracts,
        Action::UpdateContract,
        Action::ReassignContract,
        Action::SignContract,
        Action::CreateEvent,
        Action::ListEvents,
        Action::UpdateEvent,
        Action::ReassignEventSupport,
        Action::UnassignEventSupport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateEmployee => "create_employee",
            Action::ListEmployees => "list_employees",
            Action::DeactivateEmployee => "deactivate_employee",
            Action::ReactivateEmployee => "reactivate_employee",
            Action::HardDeleteEmployee => "hard_delete_employee",
            Action::CreateClient => "create_client",
            Action::ListClients => "list_clients",
            Action::UpdateClient => "update_client",
            Action::ReassignClient => "reassign_client",
            Action::CreateContract => "create_contract",
            Action::ListContracts => "list_contracts",
            Action::UpdateContract => "update_contract",
            Action::ReassignContract => "reassign_contract",
            Action::SignContract => "sign_contract",
            Action::CreateEvent => "create_event",
            Action::ListEvents => "list_events",
            Action::UpdateEvent => "update_event",
            Action::ReassignEventSupport => "reassign_event_support",
            Action::UnassignEventSupport => "unassign_event_support",
        }
    }

    /// The kind of record this action targets.
    ///
    /// `CreateEvent` is checked against the owning client, so it targets clients.
    pub fn resource(&self) -> EntityKind {
        match self {
            Action::CreateEmployee
            | Action::ListEmployees
            | Action::DeactivateEmployee
            | Action::ReactivateEmployee
            | Action::HardDeleteEmployee => EntityKind::Employee,
            Action::CreateClient
            | Action::ListClients
            | Action::UpdateClient
            | Action::ReassignClient
            | Action::CreateEvent => EntityKind::Client,
            Action::CreateContract
            | Action::ListContracts
            | Action::UpdateContract
            | Action::ReassignContract
            | Action::SignContract => EntityKind::Contract,
            Action::ListEvents
            | Action::UpdateEvent
            | Action::ReassignEventSupport
            | Action::UnassignEventSupport => EntityKind::Event,
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which designated contact of a record an ownership-qualified action requires.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    SalesContact,
    SupportContact,
}

impl core::fmt::Display for Ownership {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Ownership::SalesContact => f.write_str("sales contact"),
            Ownership::SupportContact => f.write_str("support contact"),
        }
    }
}
