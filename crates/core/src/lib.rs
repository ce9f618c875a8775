//! `epiccrm-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod action;
pub mod entity;
pub mod error;
pub mod id;
pub mod role;
pub mod value_object;

pub use action::{Action, Ownership};
pub use entity::{Entity, EntityKind};
pub use error::{
    DomainError, DomainResult, NotAuthenticated, PermissionDenied, StoreError, TokenError,
    ValidationError,
};
pub use id::{ClientId, ContractId, EmployeeId, EventId};
pub use role::Role;
pub use value_object::{Money, ValueObject};
