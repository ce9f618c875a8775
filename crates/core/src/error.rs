//! Error taxonomy of the back office.
//!
//! Every variant is non-retryable and surfaced verbatim to the caller.

use thiserror::Error;

use crate::action::{Action, Ownership};
use crate::entity::EntityKind;
use crate::id::EmployeeId;
use crate::role::Role;
use crate::value_object::Money;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Session/identity failure.
    #[error(transparent)]
    NotAuthenticated(#[from] NotAuthenticated),

    /// Raw token-codec failure (e.g. surfaced by a refresh).
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Role or ownership policy violation.
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),

    /// Entity invariant violation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A value failed to parse at the input boundary (role, amount, date).
    #[error("invalid input: {0}")]
    Parse(String),

    /// A persistence collaborator failed.
    ///
    /// Not part of the domain taxonomy: guards never raise it themselves, and
    /// the command boundary reports it generically after rolling back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn not_found(kind: EntityKind, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether this failure falls outside the domain taxonomy.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Why the caller has no usable identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotAuthenticated {
    #[error("not authenticated: no local token found, run `login`")]
    NoLocalToken,

    #[error("not authenticated: {0}; run `refresh-token` or `login`")]
    InvalidOrExpiredToken(TokenError),

    /// The token is valid but its subject no longer exists. The stored token is
    /// left in place until the caller logs out.
    #[error("not authenticated: no employee matches the stored token (subject {0}); run `logout` then `login`")]
    UnknownSubject(EmployeeId),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error("no refresh token found, run `login`")]
    NoRefreshToken,
}

/// Token codec failure. Decoding fails closed on any of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("wrong token type (expected {expected}, got {actual})")]
    WrongType { expected: String, actual: String },

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Encoding(String),
}

/// Policy denial, either by role or by ownership.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionDenied {
    #[error("access denied: {action} requires role {}, current role is {actual}", join_roles(.required))]
    RequiredRoles {
        action: Action,
        required: &'static [Role],
        actual: Role,
    },

    #[error("access denied: {action} is limited to the {contact} of this {}", .action.resource())]
    RequiredOwnership { action: Action, contact: Ownership },
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Entity invariant violation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("a {kind} with email '{email}' already exists")]
    DuplicateEmail { kind: EntityKind, email: String },

    #[error("the first account must be MANAGEMENT")]
    FirstEmployeeMustBeManagement,

    #[error("you cannot {action} yourself")]
    SelfTarget { action: Action },

    #[error("employee {0} is already deactivated")]
    AlreadyDeactivated(EmployeeId),

    #[error("employee {0} is already active")]
    AlreadyActive(EmployeeId),

    #[error("confirmation mismatch: expected {expected}, got {given}")]
    ConfirmationMismatch { expected: EmployeeId, given: EmployeeId },

    #[error("employee is still referenced (clients={clients}, contracts={contracts}, events={events})")]
    StillReferenced {
        clients: usize,
        contracts: usize,
        events: usize,
    },

    #[error("employee {employee} must have role {expected} (has {actual})")]
    WrongRole {
        employee: EmployeeId,
        expected: Role,
        actual: Role,
    },

    #[error("employee {0} is deactivated")]
    Inactive(EmployeeId),

    #[error("total amount must be greater than 0 (got {0})")]
    TotalNotPositive(Money),

    #[error("amount due cannot be negative (got {0})")]
    NegativeAmountDue(Money),

    #[error("amount due {due} exceeds total amount {total}")]
    AmountDueExceedsTotal { due: Money, total: Money },

    #[error("contract is already signed")]
    ContractAlreadySigned,

    #[error("contract is not signed")]
    ContractNotSigned,

    #[error("contract does not belong to this client")]
    ContractClientMismatch,

    #[error("start date must be before end date")]
    InvalidDateRange,

    #[error("attendees cannot be negative (got {0})")]
    NegativeAttendees(i32),
}

/// Failure raised by a persistence collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("storage failure: {0}")]
pub struct StoreError(String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
