//! Session pairs: issuance and refresh-token rotation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use epiccrm_core::{EmployeeId, TokenError};

use crate::claims::{DecodedToken, TokenKind};
use crate::codec::TokenCodec;
use crate::config::{ConfigError, SessionConfig};

/// An access token plus the refresh token that can mint its successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
    rotate_on_refresh: bool,
}

fn out_of_range(field: &str, value: i64) -> ConfigError {
    ConfigError::InvalidValue {
        key: field.to_string(),
        message: format!("{value} is out of range"),
    }
}

impl SessionManager {
    /// Validates `config`; lifetimes chrono cannot represent are rejected.
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        let codec = TokenCodec::new(config)?;
        let access_ttl = Duration::try_minutes(config.access_ttl_minutes)
            .ok_or_else(|| out_of_range("access_ttl_minutes", config.access_ttl_minutes))?;
        let refresh_ttl = Duration::try_days(config.refresh_ttl_days)
            .ok_or_else(|| out_of_range("refresh_ttl_days", config.refresh_ttl_days))?;

        Ok(Self {
            codec,
            access_ttl,
            refresh_ttl,
            rotate_on_refresh: config.rotate_on_refresh,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Configured default for [`SessionManager::refresh`].
    pub fn rotate_on_refresh(&self) -> bool {
        self.rotate_on_refresh
    }

    pub fn create_pair(&self, employee: EmployeeId) -> Result<TokenPair, TokenError> {
        self.create_pair_at(employee, Utc::now())
    }

    pub fn create_pair_at(
        &self,
        employee: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self
                .codec
                .issue_at(employee, TokenKind::Access, self.access_ttl, now)?,
            refresh_token: self
                .codec
                .issue_at(employee, TokenKind::Refresh, self.refresh_ttl, now)?,
        })
    }

    /// Decode an access token.
    pub fn verify_access(&self, token: &str) -> Result<DecodedToken, TokenError> {
        self.codec.decode(token, TokenKind::Access)
    }

    pub fn refresh(&self, refresh_token: &str, rotate: bool) -> Result<TokenPair, TokenError> {
        self.refresh_at(refresh_token, rotate, Utc::now())
    }

    /// Mint a new access token from a refresh token.
    ///
    /// With `rotate` the refresh token is replaced as well; without it the
    /// supplied refresh token is echoed back unchanged.
    pub fn refresh_at(
        &self,
        refresh_token: &str,
        rotate: bool,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let decoded = self.codec.decode_at(refresh_token, TokenKind::Refresh, now)?;

        if rotate {
            let pair = self.create_pair_at(decoded.subject, now)?;
            tracing::debug!(subject = %decoded.subject, "rotated refresh token");
            return Ok(pair);
        }

        let access_token =
            self.codec
                .issue_at(decoded.subject, TokenKind::Access, self.access_ttl, now)?;
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(&SessionConfig::with_secret("session-secret")).unwrap()
    }

    #[test]
    fn oversized_lifetimes_fail_construction() {
        let mut cfg = SessionConfig::with_secret("session-secret");
        cfg.access_ttl_minutes = 1_000_000_000_000_000;
        assert!(matches!(SessionManager::new(&cfg), Err(ConfigError::InvalidValue { .. })));

        cfg.access_ttl_minutes = 20;
        cfg.refresh_ttl_days = 100_000_000_000;
        assert!(matches!(SessionManager::new(&cfg), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn pair_carries_both_kinds_for_the_same_subject() {
        let sm = manager();
        let id = EmployeeId::new();
        let pair = sm.create_pair(id).unwrap();

        let access = sm.codec().decode(&pair.access_token, TokenKind::Access).unwrap();
        let refresh = sm
            .codec()
            .decode(&pair.refresh_token, TokenKind::Refresh)
            .unwrap();
        assert_eq!(access.subject, id);
        assert_eq!(refresh.subject, id);
        assert_eq!(refresh.expires_at - refresh.issued_at, Duration::days(7));
    }

    #[test]
    fn refresh_without_rotation_echoes_refresh_token() {
        let sm = manager();
        let pair = sm.create_pair(EmployeeId::new()).unwrap();

        let next = sm.refresh(&pair.refresh_token, false).unwrap();
        assert_eq!(next.refresh_token, pair.refresh_token);
    }

    #[test]
    fn refresh_with_rotation_issues_new_refresh_token_for_same_subject() {
        let sm = manager();
        let id = EmployeeId::new();
        let pair = sm.create_pair(id).unwrap();

        let next = sm.refresh(&pair.refresh_token, true).unwrap();
        assert_ne!(next.refresh_token, pair.refresh_token);
        let decoded = sm
            .codec()
            .decode(&next.refresh_token, TokenKind::Refresh)
            .unwrap();
        assert_eq!(decoded.subject, id);
    }

    #[test]
    fn access_token_cannot_refresh() {
        let sm = manager();
        let pair = sm.create_pair(EmployeeId::new()).unwrap();

        let err = sm.refresh(&pair.access_token, true).unwrap_err();
        assert!(matches!(err, TokenError::WrongType { .. }));
    }

    #[test]
    fn expired_refresh_token_is_surfaced() {
        let sm = manager();
        let issued = Utc::now() - Duration::days(8);
        let pair = sm.create_pair_at(EmployeeId::new(), issued).unwrap();

        assert_eq!(
            sm.refresh(&pair.refresh_token, false).unwrap_err(),
            TokenError::Expired
        );
    }
}
