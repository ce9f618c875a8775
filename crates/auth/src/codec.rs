//! Signed session tokens (JWT, symmetric secret).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use epiccrm_core::{EmployeeId, TokenError};

use crate::claims::{DecodedToken, SessionClaims, TokenKind, validate_claims};
use crate::config::{ConfigError, SessionConfig};

/// Encodes and decodes session tokens. Has no side effects.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        let algorithm = config.validate()?;
        let secret = config.secret.as_bytes();

        // Expiry is checked against an explicit `now` in `decode_at`.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn issue(
        &self,
        subject: EmployeeId,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.issue_at(subject, kind, ttl, Utc::now())
    }

    /// Issue a token whose validity window starts at `now`.
    pub fn issue_at(
        &self,
        subject: EmployeeId,
        kind: TokenKind,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let exp = now
            .checked_add_signed(ttl)
            .map(|at| at.timestamp())
            .ok_or_else(|| TokenError::Encoding(format!("expiry out of range (ttl {ttl})")))?;
        let claims = SessionClaims {
            sub: subject,
            kind,
            iat,
            exp,
            jti: Uuid::now_v7(),
        };
        jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<DecodedToken, TokenError> {
        self.decode_at(token, expected, Utc::now())
    }

    /// Verify signature, time window and type claim, in that order.
    pub fn decode_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<DecodedToken, TokenError> {
        let data = jsonwebtoken::decode::<SessionClaims>(
            token.trim(),
            &self.decoding,
            &self.validation,
        )
        .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        let claims = data.claims;
        validate_claims(&claims, now)?;

        if claims.kind != expected {
            return Err(TokenError::WrongType {
                expected: expected.to_string(),
                actual: claims.kind.to_string(),
            });
        }

        claims.into_decoded()
    }
}
