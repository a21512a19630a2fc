use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;

pub mod guard;
pub mod password;

/// Claims carried in the bearer token. The token is stateless; nothing is
/// persisted server-side and there is no revocation list. Role is a claim of
/// record at issue time only - the authorization gate re-checks the live role
/// on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Employee id.
    pub sub: i64,
    pub role: Role,
    pub gym_id: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(employee_id: i64, role: Role, gym_id: Option<i64>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: employee_id,
            role,
            gym_id,
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    Invalid,
}

/// Sign claims into an HS256 bearer token.
pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate signature and expiry, returning the decoded claims.
///
/// Callers at the HTTP boundary must render Expired and Invalid identically
/// so the response does not reveal which check failed.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    // No clock leeway: a token is dead the moment exp passes.
    validation.leeway = 0;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(AuthError::Expired),
            _ => Err(AuthError::Invalid),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip_preserves_claims() {
        let claims = Claims::new(42, Role::Coach, Some(7), 4);
        let token = issue_token(SECRET, &claims).unwrap();
        let decoded = verify_token(SECRET, &token).unwrap();

        assert_eq!(decoded.sub, 42);
        assert_eq!(decoded.role, Role::Coach);
        assert_eq!(decoded.gym_id, Some(7));
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let claims = Claims::new(1, Role::Manager, None, 4);
        let token = issue_token("other-secret", &claims).unwrap();
        assert!(matches!(
            verify_token(SECRET, &token),
            Err(AuthError::Invalid)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: Role::Manager,
            gym_id: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = issue_token(SECRET, &claims).unwrap();
        assert!(matches!(
            verify_token(SECRET, &token),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn rejects_token_seconds_past_expiry() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: Role::Manager,
            gym_id: None,
            iat: now - 3600,
            exp: now - 30,
        };
        let token = issue_token(SECRET, &claims).unwrap();
        assert!(matches!(
            verify_token(SECRET, &token),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn rejects_garbage_token() {
        assert!(matches!(
            verify_token(SECRET, "not.a.jwt"),
            Err(AuthError::Invalid)
        ));
    }

    #[test]
    fn refuses_empty_secret() {
        let claims = Claims::new(1, Role::Manager, None, 4);
        assert!(matches!(
            issue_token("", &claims),
            Err(AuthError::MissingSecret)
        ));
        assert!(matches!(
            verify_token("", "whatever"),
            Err(AuthError::MissingSecret)
        ));
    }
}
