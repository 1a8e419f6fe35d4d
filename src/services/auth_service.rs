//! Token issuance and verification, plus password hashing.
//!
//! Access and reset tokens are HS256 JWTs that share one secret; the
//! `purpose` claim keeps one kind from being accepted as the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AuthConfig, SecurityConfig};
use crate::constants::tokens::{ACCESS_PURPOSE, RESET_PURPOSE};
use crate::db::repositories::user::hash_password;
use crate::models::user::{User, UserRole};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub role: UserRole,
    pub purpose: String,
    /// Password salt at issue time; set on reset tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    secret: String,
    token_ttl: Duration,
    reset_ttl: Duration,
    security: SecurityConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(auth: &AuthConfig, security: SecurityConfig) -> Self {
        Self {
            secret: auth.jwt_secret.clone(),
            token_ttl: Duration::hours(auth.token_ttl_hours),
            reset_ttl: Duration::minutes(auth.reset_token_ttl_minutes),
            security,
        }
    }

    #[must_use]
    pub fn reset_ttl_minutes(&self) -> i64 {
        self.reset_ttl.num_minutes()
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        self.sign(user, ACCESS_PURPOSE, None, self.token_ttl)
    }

    /// The token only verifies while `stamp` still matches the stored credential,
    /// so it stops working once the password changes.
    pub fn issue_reset_token(&self, user: &User, stamp: &str) -> Result<String, AuthError> {
        self.sign(user, RESET_PURPOSE, Some(stamp.to_string()), self.reset_ttl)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, ACCESS_PURPOSE)
    }

    pub fn verify_reset_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, RESET_PURPOSE)
    }

    /// Hashes off the async runtime; argon2 is deliberately slow.
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let security = self.security.clone();

        tokio::task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {e}")))?
            .map_err(AuthError::from)
    }

    fn sign(
        &self,
        user: &User,
        purpose: &str,
        stamp: Option<String>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            purpose: purpose.to_string(),
            stamp,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), &claims, &key)
            .map_err(|e| AuthError::Internal(format!("create JWT: {e}")))
    }

    fn verify(&self, token: &str, purpose: &str) -> Result<Claims, AuthError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        if data.claims.purpose != purpose {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            &AuthConfig {
                jwt_secret: "test-secret".to_string(),
                ..Default::default()
            },
            SecurityConfig {
                argon2_memory_cost_kib: 1024,
                argon2_time_cost: 1,
                argon2_parallelism: 1,
            },
        )
    }

    fn user() -> User {
        User {
            id: 42,
            email: "a@x.com".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            role: UserRole::Moderator,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_access_token_round_trip_carries_identity() {
        let auth = service();
        let token = auth.issue_access_token(&user()).unwrap();

        let claims = auth.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, UserRole::Moderator);
        assert_eq!(claims.purpose, ACCESS_PURPOSE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let auth = service();
        let token = auth
            .sign(&user(), ACCESS_PURPOSE, None, Duration::minutes(-5))
            .unwrap();

        assert!(matches!(
            auth.verify_access_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = service().issue_access_token(&user()).unwrap();
        let other = AuthService::new(
            &AuthConfig {
                jwt_secret: "another-secret".to_string(),
                ..Default::default()
            },
            SecurityConfig::default(),
        );

        assert!(matches!(
            other.verify_access_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            service().verify_access_token("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_reset_token_is_not_an_access_token() {
        let auth = service();
        let reset = auth.issue_reset_token(&user(), "salt").unwrap();

        assert!(matches!(
            auth.verify_access_token(&reset),
            Err(AuthError::InvalidToken)
        ));
        let claims = auth.verify_reset_token(&reset).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.stamp.as_deref(), Some("salt"));
    }

    #[tokio::test]
    async fn test_hash_password_runs_off_runtime() {
        let hash = service().hash_password("Secret123").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }
}
