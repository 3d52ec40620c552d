//! Authentication and user registration service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{TokenClaims, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate a user by username and password, returning a signed token
    /// together with the user.
    ///
    /// Every failure is an authentication error so callers answer 403 without
    /// revealing more than the original form messages did.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> AppResult<(String, User)> {
        let (username, password) = require_credentials(username, password)?;

        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found.".to_string()))?;

        if !verify_password(&user.password, password)? {
            return Err(AppError::Authentication("Invalid credentials.".to_string()));
        }

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Register a new user with a hashed password.
    ///
    /// Uniqueness is checked up front instead of waiting for the insert to
    /// fail, so a taken username surfaces as a conflict rather than a
    /// database error.
    pub async fn register(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> AppResult<User> {
        let (username, password) = require_credentials(username, password)?;

        if self.repository.users.username_exists(username).await? {
            return Err(AppError::Conflict("Username already exists.".to_string()));
        }

        let hash = hash_password(password)?;
        self.repository.users.create(username, &hash).await
    }

    /// Create a signed token for a user
    pub fn create_token(&self, user: &User) -> AppResult<String> {
        let claims = TokenClaims {
            sub: user.username.clone(),
            user_id: user.id,
            iat: Utc::now().timestamp(),
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify a token signature and return the embedded claims
    pub fn verify_token(&self, token: &str) -> AppResult<TokenClaims> {
        TokenClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid token".to_string()))
    }
}

/// Both credentials must be present and non-empty
fn require_credentials<'a>(
    username: Option<&'a str>,
    password: Option<&'a str>,
) -> AppResult<(&'a str, &'a str)> {
    match (username, password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        }
        _ => Err(AppError::Authentication(
            "Please fill all the form!".to_string(),
        )),
    }
}

/// Hash a password using Argon2 with a per-record random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password(&hash, "s3cret").unwrap());
        assert!(!verify_password(&hash, "wrong").unwrap());
    }

    #[test]
    fn same_password_hashes_to_different_strings() {
        let first = hash_password("s3cret").unwrap();
        let second = hash_password("s3cret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(verify_password("not-a-phc-string", "s3cret").is_err());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(require_credentials(None, Some("pw")).is_err());
        assert!(require_credentials(Some("user"), None).is_err());
        assert!(require_credentials(Some(""), Some("pw")).is_err());
        assert!(require_credentials(Some("user"), Some("")).is_err());
        assert!(require_credentials(Some("user"), Some("pw")).is_ok());
    }
}
