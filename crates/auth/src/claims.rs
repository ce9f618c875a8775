use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use epiccrm_core::{EmployeeId, TokenError};

/// Which half of a session pair a token is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed claims carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the employee the session belongs to.
    pub sub: EmployeeId,

    /// Token type, checked against the caller's expectation on decode.
    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Issued-at (Unix seconds).
    pub iat: i64,

    /// Expiration (Unix seconds).
    pub exp: i64,

    /// Unique token id; two tokens minted in the same second still differ.
    pub jti: Uuid,
}

/// Claims of a token that passed signature, expiry and type checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub subject: EmployeeId,
    pub kind: TokenKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    pub(crate) fn into_decoded(self) -> Result<DecodedToken, TokenError> {
        let issued_at = timestamp(self.iat)?;
        let expires_at = timestamp(self.exp)?;
        Ok(DecodedToken {
            subject: self.sub,
            kind: self.kind,
            issued_at,
            expires_at,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| TokenError::Malformed(format!("timestamp out of range: {secs}")))
}

/// Deterministically validate the time window of session claims.
///
/// Signature verification happens before this in the codec; this only checks
/// the claims against `now`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp <= claims.iat {
        return Err(TokenError::Malformed(
            "invalid time window (exp <= iat)".to_string(),
        ));
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(iat: DateTime<Utc>, ttl: Duration) -> SessionClaims {
        SessionClaims {
            sub: EmployeeId::new(),
            kind: TokenKind::Access,
            iat: iat.timestamp(),
            exp: (iat + ttl).timestamp(),
            jti: Uuid::now_v7(),
        }
    }

    #[test]
    fn live_claims_pass() {
        let now = Utc::now();
        assert!(validate_claims(&claims(now, Duration::minutes(20)), now).is_ok());
    }

    #[test]
    fn expiry_is_inclusive_of_exp_second() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(20), Duration::minutes(20));
        assert_eq!(validate_claims(&c, now), Err(TokenError::Expired));
    }

    #[test]
    fn inverted_window_is_malformed() {
        let now = Utc::now();
        let c = claims(now, Duration::minutes(-5));
        assert!(matches!(validate_claims(&c, now), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn type_claim_is_serialized_as_type() {
        let c = claims(Utc::now(), Duration::minutes(1));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "access");
    }
}
