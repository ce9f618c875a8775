//! Events: creation against a signed contract, and support assignment.
//!
//! Support contact changes always go through the assignment checks, including
//! when they arrive as part of a general update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epiccrm_auth::{authorize, authorize_owned};
use epiccrm_core::{
    Action, ClientId, ContractId, DomainError, DomainResult, EmployeeId, Entity, EntityKind,
    EventId, Role, ValidationError,
};

use crate::employee::{Employee, require_assignable};
use crate::input::{optional, required};
use crate::store::{ClientStore, ContractStore, EmployeeDirectory, EventQuery, EventStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub client_id: ClientId,
    pub contract_id: ContractId,
    pub support_contact_id: Option<EmployeeId>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub attendees: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Event {
    type Id = EventId;

    const KIND: EntityKind = EntityKind::Event;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEvent {
    pub client_id: ClientId,
    pub contract_id: ContractId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub attendees: i32,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignSupport {
    pub event_id: EventId,
    pub support_contact_id: EmployeeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnassignSupport {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateEvent. `None` keeps a field; blank notes clear them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEvent {
    pub event_id: EventId,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub attendees: Option<i32>,
    pub notes: Option<String>,
    /// A new support contact; subject to the same checks as [`assign_support`].
    pub support_contact_id: Option<EmployeeId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub without_support: bool,
    /// Only events whose support contact is the actor.
    pub assigned_to_me: bool,
}

fn check_schedule(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    attendees: i32,
) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::InvalidDateRange);
    }
    if attendees < 0 {
        return Err(ValidationError::NegativeAttendees(attendees));
    }
    Ok(())
}

fn find<S>(store: &S, id: EventId) -> DomainResult<Event>
where
    S: EventStore + ?Sized,
{
    store
        .get_event(id)?
        .ok_or_else(|| DomainError::not_found(EntityKind::Event, id))
}

/// SALES only, for a client they own and a signed contract of that client.
pub fn create<S>(actor: &Employee, store: &S, cmd: CreateEvent) -> DomainResult<Event>
where
    S: ClientStore + ContractStore + EventStore + ?Sized,
{
    let principal = actor.principal();
    authorize(&principal, Action::CreateEvent)?;

    check_schedule(cmd.start_date, cmd.end_date, cmd.attendees)?;
    let location = required("location", &cmd.location)?;

    let client = crate::client::find(store, cmd.client_id)?;
    authorize_owned(&principal, Action::CreateEvent, Some(client.sales_contact_id))?;

    let contract = crate::contract::find(store, cmd.contract_id)?;
    if contract.client_id != client.id {
        return Err(ValidationError::ContractClientMismatch.into());
    }
    if !contract.is_signed {
        return Err(ValidationError::ContractNotSigned.into());
    }

    let event = Event {
        id: EventId::new(),
        client_id: client.id,
        contract_id: contract.id,
        support_contact_id: None,
        start_date: cmd.start_date,
        end_date: cmd.end_date,
        location,
        attendees: cmd.attendees,
        notes: optional(cmd.notes.as_deref()),
        created_at: cmd.occurred_at,
        updated_at: cmd.occurred_at,
    };
    store.add_event(event.clone())?;

    tracing::info!(
        event_id = %event.id,
        contract_id = %contract.id,
        actor = %actor.id,
        "event created"
    );
    Ok(event)
}

/// Assign or reassign the support contact. MANAGEMENT only; the target must
/// exist, be SUPPORT and be active.
pub fn assign_support<S>(actor: &Employee, store: &S, cmd: AssignSupport) -> DomainResult<Event>
where
    S: EmployeeDirectory + EventStore + ?Sized,
{
    authorize(&actor.principal(), Action::ReassignEventSupport)?;

    let mut event = find(store, cmd.event_id)?;
    let support = require_assignable(store, cmd.support_contact_id, Role::Support)?;

    event.support_contact_id = Some(support.id);
    event.updated_at = cmd.occurred_at;
    store.update_event(&event)?;

    tracing::info!(
        event_id = %event.id,
        support_contact = %support.id,
        actor = %actor.id,
        "event support assigned"
    );
    Ok(event)
}

/// MANAGEMENT only. Unassigning an event without support is a no-op.
pub fn unassign_support<S>(actor: &Employee, store: &S, cmd: UnassignSupport) -> DomainResult<Event>
where
    S: EventStore + ?Sized,
{
    authorize(&actor.principal(), Action::UnassignEventSupport)?;

    let mut event = find(store, cmd.event_id)?;
    if event.support_contact_id.is_some() {
        event.support_contact_id = None;
        event.updated_at = cmd.occurred_at;
        store.update_event(&event)?;
        tracing::info!(event_id = %event.id, actor = %actor.id, "event support unassigned");
    }
    Ok(event)
}

/// MANAGEMENT on any event, SUPPORT only on events assigned to them.
///
/// All field checks and any support change are validated before the single
/// write.
pub fn update<S>(actor: &Employee, store: &S, cmd: UpdateEvent) -> DomainResult<Event>
where
    S: EmployeeDirectory + EventStore + ?Sized,
{
    let principal = actor.principal();
    authorize(&principal, Action::UpdateEvent)?;

    let mut event = find(store, cmd.event_id)?;
    authorize_owned(&principal, Action::UpdateEvent, event.support_contact_id)?;

    let start = cmd.start_date.unwrap_or(event.start_date);
    let end = cmd.end_date.unwrap_or(event.end_date);
    let attendees = cmd.attendees.unwrap_or(event.attendees);
    check_schedule(start, end, attendees)?;
    let location = match cmd.location.as_deref() {
        Some(location) => required("location", location)?,
        None => event.location.clone(),
    };

    let support = match cmd.support_contact_id {
        Some(id) => {
            authorize(&principal, Action::ReassignEventSupport)?;
            Some(require_assignable(store, id, Role::Support)?.id)
        }
        None => event.support_contact_id,
    };

    event.start_date = start;
    event.end_date = end;
    event.attendees = attendees;
    event.location = location;
    if let Some(notes) = cmd.notes.as_deref() {
        event.notes = optional(Some(notes));
    }
    event.support_contact_id = support;
    event.updated_at = cmd.occurred_at;
    store.update_event(&event)?;

    tracing::info!(event_id = %event.id, actor = %actor.id, "event updated");
    Ok(event)
}

pub fn list<S>(actor: &Employee, store: &S, filter: EventFilter) -> DomainResult<Vec<Event>>
where
    S: EventStore + ?Sized,
{
    authorize(&actor.principal(), Action::ListEvents)?;

    // An event cannot be both unassigned and assigned to the actor.
    if filter.without_support && filter.assigned_to_me {
        return Ok(Vec::new());
    }
    Ok(store.list_events(EventQuery {
        without_support: filter.without_support,
        support_contact: filter.assigned_to_me.then_some(actor.id),
    })?)
}
