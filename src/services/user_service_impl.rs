//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::Store;
use crate::models::Page;
use crate::models::user::{NewUser, User, UserPatch, UserQuery, UserRole};
use crate::services::auth_service::AuthService;
use crate::services::email::EmailService;
use crate::services::user_service::{LoginResult, UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    auth: Arc<AuthService>,
    email: Arc<EmailService>,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, auth: Arc<AuthService>, email: Arc<EmailService>) -> Self {
        Self { store, auth, email }
    }

    async fn require(&self, id: i32) -> Result<User, UserError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(UserError::not_found)
    }

    async fn set_active(&self, id: i32, active: bool) -> Result<User, UserError> {
        let user = self
            .store
            .set_user_active(id, active)
            .await?
            .ok_or_else(UserError::not_found)?;

        info!(user_id = id, active, "User activation changed: {}", user.email);
        Ok(user)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, user: NewUser) -> Result<User, UserError> {
        let created = self
            .create(NewUser {
                role: UserRole::User,
                ..user
            })
            .await?;

        if let Err(e) = self.email.send_welcome(&created).await {
            warn!(user_id = created.id, error = %e, "Failed to send welcome email");
        }

        Ok(created)
    }

    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        if self.store.get_user_by_email(&user.email).await?.is_some() {
            return Err(UserError::email_taken());
        }

        let password_hash = self.auth.hash_password(&user.password).await?;
        let created = self.store.create_user(&user, password_hash).await?;

        info!(user_id = created.id, role = %created.role, "User created: {}", created.email);
        Ok(created)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, UserError> {
        let user = self
            .store
            .verify_user_credentials(email, password)
            .await?
            .ok_or_else(|| UserError::BadRequest("Invalid email or password".to_string()))?;

        if !user.is_active {
            return Err(UserError::BadRequest(
                "User account is deactivated".to_string(),
            ));
        }

        let token = self.auth.issue_access_token(&user)?;

        info!(user_id = user.id, "User logged in: {}", user.email);
        Ok(LoginResult { user, token })
    }

    async fn get_by_id(&self, id: i32) -> Result<User, UserError> {
        self.require(id).await
    }

    async fn list(&self, query: UserQuery) -> Result<Page<User>, UserError> {
        Ok(self.store.list_users(&query).await?)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> Result<User, UserError> {
        let existing = self.require(id).await?;

        if let Some(email) = &patch.email
            && !email.trim().eq_ignore_ascii_case(&existing.email)
            && self.store.get_user_by_email(email).await?.is_some()
        {
            return Err(UserError::email_taken());
        }

        let updated = self
            .store
            .update_user(id, &patch)
            .await?
            .ok_or_else(UserError::not_found)?;

        info!(user_id = id, "User updated: {}", updated.email);
        Ok(updated)
    }

    async fn update_profile(&self, id: i32, patch: UserPatch) -> Result<User, UserError> {
        self.update(id, patch.without_privileges()).await
    }

    async fn delete(&self, id: i32) -> Result<(), UserError> {
        let user = self.require(id).await?;

        if !self.store.delete_user(id).await? {
            return Err(UserError::not_found());
        }

        info!(user_id = id, "User deleted: {}", user.email);
        Ok(())
    }

    async fn change_password(
        &self,
        id: i32,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        let user = self.require(id).await?;

        if self
            .store
            .verify_user_credentials(&user.email, old_password)
            .await?
            .is_none()
        {
            return Err(UserError::BadRequest("Invalid old password".to_string()));
        }

        let password_hash = self.auth.hash_password(new_password).await?;
        self.store.update_user_password_hash(id, password_hash).await?;

        info!(user_id = id, "Password changed for user: {}", user.email);
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<bool, UserError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(true);
        };

        let Some(stamp) = self.store.get_user_credential_stamp(user.id).await? else {
            warn!(user_id = user.id, "Stored password hash is unreadable; no reset issued");
            return Ok(true);
        };

        let token = self.auth.issue_reset_token(&user, &stamp)?;
        match self
            .email
            .send_password_reset(&user, &token, self.auth.reset_ttl_minutes())
            .await
        {
            Ok(()) => info!(user_id = user.id, "Password reset email sent"),
            Err(e) => warn!(user_id = user.id, error = %e, "Failed to send password reset email"),
        }

        Ok(true)
    }

    async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        let claims = self.auth.verify_reset_token(token)?;
        let user = self.require(claims.sub).await?;

        let current = self.store.get_user_credential_stamp(user.id).await?;
        if claims.stamp.is_none() || claims.stamp != current {
            warn!(user_id = user.id, "Rejected reset token issued for an older password");
            return Err(UserError::Unauthorized(
                "Invalid or expired reset token".to_string(),
            ));
        }

        let password_hash = self.auth.hash_password(new_password).await?;
        self.store
            .update_user_password_hash(user.id, password_hash)
            .await?;

        info!(user_id = user.id, "Password reset completed: {}", user.email);
        Ok(())
    }

    async fn deactivate(&self, id: i32) -> Result<User, UserError> {
        self.set_active(id, false).await
    }

    async fn activate(&self, id: i32) -> Result<User, UserError> {
        self.set_active(id, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{self, RecordingMailer};

    async fn service() -> (SeaOrmUserService, Arc<RecordingMailer>) {
        let store = test_support::store().await;
        let mailer = Arc::new(RecordingMailer::default());
        let service = SeaOrmUserService::new(
            store,
            Arc::new(test_support::auth()),
            Arc::new(EmailService::new(mailer.clone(), "http://localhost:3000")),
        );
        (service, mailer)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "Secret123".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            role: UserRole::Admin,
        }
    }

    #[tokio::test]
    async fn test_register_forces_user_role_and_sends_welcome() {
        let (service, mailer) = service().await;

        let user = service.register(new_user("a@x.com")).await.unwrap();

        assert_eq!(user.role, UserRole::User);
        assert_eq!(mailer.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_case_insensitive() {
        let (service, _) = service().await;
        service.register(new_user("a@x.com")).await.unwrap();

        let err = service.register(new_user("A@X.COM")).await.unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_rules() {
        let (service, _) = service().await;
        let user = service.register(new_user("a@x.com")).await.unwrap();

        let ok = service.login("a@x.com", "Secret123").await.unwrap();
        assert_eq!(ok.user.id, user.id);
        assert!(!ok.token.is_empty());

        let wrong = service.login("a@x.com", "Wrong123").await.unwrap_err();
        assert!(matches!(wrong, UserError::BadRequest(ref m) if m == "Invalid email or password"));

        service.deactivate(user.id).await.unwrap();
        let inactive = service.login("a@x.com", "Secret123").await.unwrap_err();
        assert!(matches!(inactive, UserError::BadRequest(ref m) if m == "User account is deactivated"));
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let (service, _) = service().await;
        let user = service.register(new_user("a@x.com")).await.unwrap();

        use sea_orm::EntityTrait;
        let model = crate::entities::prelude::Users::find_by_id(user.id)
            .one(&service.store.conn)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(model.password_hash, "Secret123");
        assert!(model.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_change_password_checks_old_password() {
        let (service, _) = service().await;
        let user = service.register(new_user("a@x.com")).await.unwrap();

        let err = service
            .change_password(user.id, "Nope1234", "Newpass123")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::BadRequest(ref m) if m == "Invalid old password"));

        service
            .change_password(user.id, "Secret123", "Newpass123")
            .await
            .unwrap();
        assert!(service.login("a@x.com", "Newpass123").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_never_reveals_unknown_email() {
        let (service, mailer) = service().await;

        assert!(service.reset_password("ghost@x.com").await.unwrap());
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let (service, mailer) = service().await;
        service.register(new_user("a@x.com")).await.unwrap();
        mailer.clear().await;

        assert!(service.reset_password("a@x.com").await.unwrap());
        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);

        let token = test_support::reset_token_from(&sent[0].html_body);
        service
            .confirm_password_reset(&token, "Fresh1234")
            .await
            .unwrap();
        assert!(service.login("a@x.com", "Fresh1234").await.is_ok());

        let replayed = service
            .confirm_password_reset(&token, "Other1234")
            .await
            .unwrap_err();
        assert!(matches!(replayed, UserError::Unauthorized(_)));
        assert!(service.login("a@x.com", "Fresh1234").await.is_ok());

        let err = service
            .confirm_password_reset("bogus", "Fresh1234")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_update_profile_cannot_escalate() {
        let (service, _) = service().await;
        let user = service.register(new_user("a@x.com")).await.unwrap();

        let updated = service
            .update_profile(
                user.id,
                UserPatch {
                    first_name: Some("Anna".to_string()),
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Anna");
        assert_eq!(updated.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let (service, _) = service().await;
        service.register(new_user("a@x.com")).await.unwrap();
        let b = service.register(new_user("b@x.com")).await.unwrap();

        let err = service
            .update(
                b.id,
                UserPatch {
                    email: Some("A@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let (service, _) = service().await;

        assert!(matches!(service.get_by_id(99).await, Err(UserError::NotFound(_))));
        assert!(matches!(service.delete(99).await, Err(UserError::NotFound(_))));
        assert!(matches!(service.activate(99).await, Err(UserError::NotFound(_))));
    }
}
