//! User model and JWT claims

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// User account. Created at registration; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// JWT claims for an authenticated user.
///
/// Tokens carry no expiration claim, so verification runs with expiry
/// validation disabled. Presence of a token gates navigation client-side;
/// the server keeps no session or revocation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub user_id: i32,
    pub iat: i64,
}

impl TokenClaims {
    /// Sign the claims into an HS256 token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a token. Fails on a bad signature or a malformed
    /// payload; tolerates the missing `exp` claim.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn claims() -> TokenClaims {
        TokenClaims {
            sub: "budi".to_string(),
            user_id: 42,
            iat: chrono::Utc::now().timestamp(),
        }
    }

    #[test]
    fn token_round_trip() {
        let token = claims().create_token(SECRET).expect("signing should succeed");
        assert!(!token.is_empty());

        let decoded = TokenClaims::from_token(&token, SECRET).expect("verify should succeed");
        assert_eq!(decoded.sub, "budi");
        assert_eq!(decoded.user_id, 42);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = claims().create_token(SECRET).expect("signing should succeed");
        assert!(TokenClaims::from_token(&token, "another-secret").is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(TokenClaims::from_token("not-a-token", SECRET).is_err());
        assert!(TokenClaims::from_token("", SECRET).is_err());
    }
}
