//! JWT claims model and validation (transport-agnostic).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerly_core::{TenantId, UserId};

/// The minimal set of claims a ledgerly token carries.
///
/// Deliberately **no roles or permissions**: those are resolved fresh from
/// storage on every request by the guard, so role edits take effect without
/// re-authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Tenant context for the token.
    pub tenant_id: TenantId,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token could not be decoded")]
    Malformed,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only; signature verification is done by
/// the [`JwtValidator`] implementation.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Token decoding + validation boundary consumed by the HTTP middleware.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 validator over a shared secret.
pub struct Hs256JwtValidator {
    decoding_key: jsonwebtoken::DecodingKey,
    encoding_key: jsonwebtoken::EncodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            decoding_key: jsonwebtoken::DecodingKey::from_secret(&secret),
            encoding_key: jsonwebtoken::EncodingKey::from_secret(&secret),
        }
    }

    /// Mint a token for `claims` (login path and tests).
    pub fn encode(&self, claims: &JwtClaims) -> Result<String, TokenValidationError> {
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            claims,
            &self.encoding_key,
        )
        .map_err(|_| TokenValidationError::Malformed)
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        // Expiry lives in `expires_at` (RFC 3339), not the numeric `exp`
        // claim, so the library's own time checks are disabled and
        // `validate_claims` decides deterministically.
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenValidationError::Malformed)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            tenant_id: TenantId::new(),
            issued_at: now,
            expires_at: now + Duration::minutes(10),
        }
    }

    #[test]
    fn valid_window_passes() {
        let now = Utc::now();
        assert!(validate_claims(&claims(now), now + Duration::minutes(1)).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        assert_eq!(
            validate_claims(&claims(now), now + Duration::minutes(11)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn hs256_round_trip() {
        let v = Hs256JwtValidator::new(b"test-secret".to_vec());
        let now = Utc::now();
        let c = claims(now);
        let token = v.encode(&c).unwrap();
        let decoded = v.validate(&token, now + Duration::seconds(1)).unwrap();
        assert_eq!(decoded, c);
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let v = Hs256JwtValidator::new(b"secret-a".to_vec());
        let other = Hs256JwtValidator::new(b"secret-b".to_vec());
        let now = Utc::now();
        let token = v.encode(&claims(now)).unwrap();
        assert_eq!(
            other.validate(&token, now).unwrap_err(),
            TokenValidationError::Malformed
        );
    }
}
