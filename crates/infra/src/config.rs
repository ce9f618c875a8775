//! Configuration loading from the process environment.

use std::path::PathBuf;

use epiccrm_auth::{ConfigError, SessionConfig};

pub const JWT_SECRET: &str = "EPICCRM_JWT_SECRET";
pub const JWT_ALGORITHM: &str = "EPICCRM_JWT_ALGORITHM";
pub const ACCESS_TOKEN_MINUTES: &str = "EPICCRM_ACCESS_TOKEN_MINUTES";
pub const REFRESH_TOKEN_DAYS: &str = "EPICCRM_REFRESH_TOKEN_DAYS";
pub const ROTATE_REFRESH: &str = "EPICCRM_ROTATE_REFRESH";
pub const HOME: &str = "EPICCRM_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub session: SessionConfig,
    /// Holds `tokens.json` and `data.json`.
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn tokens_path(&self) -> PathBuf {
        self.data_dir.join("tokens.json")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("data.json")
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Blank values count as unset.
    ///
    /// The signing secret is required; everything else has a default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secret = get(JWT_SECRET).ok_or(ConfigError::MissingSecret)?;
        let mut session = SessionConfig::with_secret(secret);

        if let Some(algorithm) = get(JWT_ALGORITHM) {
            session.algorithm = algorithm;
        }
        if let Some(raw) = get(ACCESS_TOKEN_MINUTES) {
            session.access_ttl_minutes = parse_int(ACCESS_TOKEN_MINUTES, &raw)?;
        }
        if let Some(raw) = get(REFRESH_TOKEN_DAYS) {
            session.refresh_ttl_days = parse_int(REFRESH_TOKEN_DAYS, &raw)?;
        }
        if let Some(raw) = get(ROTATE_REFRESH) {
            session.rotate_on_refresh = parse_bool(ROTATE_REFRESH, &raw)?;
        }
        session.validate()?;

        let data_dir = match get(HOME) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .map(|h| h.join(".epiccrm"))
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: HOME.to_string(),
                    message: "unset and no home directory could be resolved".to_string(),
                })?,
        };

        Ok(Self { session, data_dir })
    }
}

fn parse_int(key: &str, raw: &str) -> Result<i64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected an integer, got '{raw}'"),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{raw}'"),
        }),
    }
}
