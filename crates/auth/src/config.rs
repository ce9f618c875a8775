//! Session configuration.
//!
//! Passed explicitly into the codec and session manager at construction; nothing
//! in this crate reads the environment.

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ALGORITHM: &str = "HS256";
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 20;
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;
/// One week.
pub const MAX_ACCESS_TTL_MINUTES: i64 = 7 * 24 * 60;
pub const MAX_REFRESH_TTL_DAYS: i64 = 365;

/// Configuration consumed by [`crate::TokenCodec`] and [`crate::SessionManager`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Symmetric signing secret. Always supplied externally.
    pub secret: String,
    /// JWT algorithm identifier (HS256, HS384 or HS512).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
    #[serde(default = "default_rotate")]
    pub rotate_on_refresh: bool,
}

fn default_algorithm() -> String {
    DEFAULT_ALGORITHM.to_string()
}

fn default_access_ttl_minutes() -> i64 {
    DEFAULT_ACCESS_TTL_MINUTES
}

fn default_refresh_ttl_days() -> i64 {
    DEFAULT_REFRESH_TTL_DAYS
}

fn default_rotate() -> bool {
    true
}

// The secret never appears in logs or panic messages.
impl core::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("rotate_on_refresh", &self.rotate_on_refresh)
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("signing secret is missing or empty")]
    MissingSecret,

    #[error("unsupported signing algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("{field} must be positive (got {value})")]
    NonPositiveTtl { field: &'static str, value: i64 },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl SessionConfig {
    /// Build a configuration with the default algorithm, lifetimes and rotation.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: default_algorithm(),
            access_ttl_minutes: DEFAULT_ACCESS_TTL_MINUTES,
            refresh_ttl_days: DEFAULT_REFRESH_TTL_DAYS,
            rotate_on_refresh: true,
        }
    }

    /// Validate the configuration and resolve the signing algorithm.
    pub fn validate(&self) -> Result<Algorithm, ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.access_ttl_minutes <= 0 {
            return Err(ConfigError::NonPositiveTtl {
                field: "access_ttl_minutes",
                value: self.access_ttl_minutes,
            });
        }
        if self.refresh_ttl_days <= 0 {
            return Err(ConfigError::NonPositiveTtl {
                field: "refresh_ttl_days",
                value: self.refresh_ttl_days,
            });
        }
        if self.access_ttl_minutes > MAX_ACCESS_TTL_MINUTES {
            return Err(ttl_too_long(
                "access_ttl_minutes",
                self.access_ttl_minutes,
                MAX_ACCESS_TTL_MINUTES,
            ));
        }
        if self.refresh_ttl_days > MAX_REFRESH_TTL_DAYS {
            return Err(ttl_too_long(
                "refresh_ttl_days",
                self.refresh_ttl_days,
                MAX_REFRESH_TTL_DAYS,
            ));
        }
        parse_algorithm(&self.algorithm)
    }
}

fn ttl_too_long(field: &str, value: i64, max: i64) -> ConfigError {
    ConfigError::InvalidValue {
        key: field.to_string(),
        message: format!("{value} exceeds the maximum of {max}"),
    }
}

fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let algorithm: Algorithm = name
        .trim()
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| ConfigError::UnsupportedAlgorithm(name.to_string()))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}
