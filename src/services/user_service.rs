//! Domain service for accounts: registration, login, profile and password
//! management, and the admin user directory.

use serde::Serialize;
use thiserror::Error;

use crate::models::Page;
use crate::models::user::{NewUser, User, UserPatch, UserQuery};
use crate::services::auth_service::AuthError;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    pub(crate) fn not_found() -> Self {
        Self::NotFound("User not found".to_string())
    }

    pub(crate) fn email_taken() -> Self {
        Self::Conflict("User with this email already exists".to_string())
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::email_taken();
        }
        Self::Internal(err.to_string())
    }
}

impl From<AuthError> for UserError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::InvalidToken => {
                Self::Unauthorized("Invalid or expired reset token".to_string())
            }
            AuthError::Internal(msg) => Self::Internal(msg),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: User,
    pub token: String,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Self-service sign-up. The role is always `user`, whatever the payload
    /// asked for, and a welcome email is sent on a best-effort basis.
    async fn register(&self, user: NewUser) -> Result<User, UserError>;

    /// Creates an account with the requested role.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] if the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// # Errors
    ///
    /// Returns [`UserError::BadRequest`] on a wrong email/password pair or a
    /// deactivated account.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, UserError>;

    async fn get_by_id(&self, id: i32) -> Result<User, UserError>;

    async fn list(&self, query: UserQuery) -> Result<Page<User>, UserError>;

    async fn update(&self, id: i32, patch: UserPatch) -> Result<User, UserError>;

    /// Like [`UserService::update`] but ignores role and activation changes.
    async fn update_profile(&self, id: i32, patch: UserPatch) -> Result<User, UserError>;

    async fn delete(&self, id: i32) -> Result<(), UserError>;

    async fn change_password(
        &self,
        id: i32,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), UserError>;

    /// Always succeeds so callers cannot probe which emails exist.
    async fn reset_password(&self, email: &str) -> Result<bool, UserError>;

    async fn confirm_password_reset(&self, token: &str, new_password: &str)
    -> Result<(), UserError>;

    async fn deactivate(&self, id: i32) -> Result<User, UserError>;

    async fn activate(&self, id: i32) -> Result<User, UserError>;
}
