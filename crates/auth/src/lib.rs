//! `epiccrm-auth`: session tokens and the authorization policy.
//!
//! No storage and no terminal I/O: token persistence is behind [`TokenStore`],
//! and configuration is passed in as a [`SessionConfig`].

pub mod claims;
pub mod codec;
pub mod config;
pub mod password;
pub mod policy;
pub mod session;
pub mod token_store;

pub use claims::{DecodedToken, SessionClaims, TokenKind, validate_claims};
pub use codec::TokenCodec;
pub use config::{ConfigError, SessionConfig};
pub use password::{Argon2Passwords, PasswordError, PasswordHasher, PasswordVerifier};
pub use policy::{
    AuthorizationDecision, DenialKind, OwnershipFacts, Principal, actions_for, allow,
    authorize, authorize_owned, explain,
};
pub use session::{SessionManager, TokenPair};
pub use token_store::{InMemoryTokenStore, TokenStore};
