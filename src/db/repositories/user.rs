use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tokio::task;
use tracing::warn;

use crate::config::SecurityConfig;
use crate::entities::{prelude::*, users};
use crate::models::user::{NewUser, User, UserPatch, UserQuery, UserRole, UserSortField};
use crate::models::{Page, SortOrder};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        let role = model.role.parse::<UserRole>().unwrap_or_else(|e| {
            warn!(user_id = model.id, "{e}; treating account as a regular user");
            UserRole::default()
        });

        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user: &NewUser, password_hash: String) -> Result<User> {
        let now = crate::db::now();

        let model = users::ActiveModel {
            email: Set(user.email.trim().to_lowercase()),
            password_hash: Set(password_hash),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            role: Set(user.role.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Case-insensitive lookup.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self.find_model_by_email(email).await?;
        Ok(user.map(User::from))
    }

    async fn find_model_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    /// Looks the account up by email and checks the password against the
    /// stored hash. `None` covers both an unknown email and a wrong password.
    /// Note: This uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_model_by_email(email).await? else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    pub async fn list(&self, query: &UserQuery) -> Result<Page<User>> {
        let mut select = Users::find();

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let search = search.trim();
            select = select.filter(
                Condition::any()
                    .add(users::Column::Email.contains(search))
                    .add(users::Column::FirstName.contains(search))
                    .add(users::Column::LastName.contains(search)),
            );
        } else if let Some(role) = query.role {
            select = select.filter(users::Column::Role.eq(role.as_str()));
        }

        if let Some(active) = query.is_active {
            select = select.filter(users::Column::IsActive.eq(active));
        }

        let column = match query.page.sort_by {
            UserSortField::Email => users::Column::Email,
            UserSortField::FirstName => users::Column::FirstName,
            UserSortField::LastName => users::Column::LastName,
            UserSortField::CreatedAt => users::Column::CreatedAt,
            UserSortField::Role => users::Column::Role,
        };
        let order = match query.page.sort_order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        select = select
            .order_by(column, order.clone())
            .order_by(users::Column::Id, order);

        let paginator = select.paginate(&self.conn, query.page.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page.page - 1).await?;

        Ok(Page {
            items: items.into_iter().map(User::from).collect(),
            page: query.page.page,
            limit: query.page.limit,
            total,
        })
    }

    pub async fn update(&self, id: i32, patch: &UserPatch) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(email) = &patch.email {
            active.email = Set(email.trim().to_lowercase());
        }
        if let Some(first_name) = &patch.first_name {
            active.first_name = Set(first_name.clone());
        }
        if let Some(last_name) = &patch.last_name {
            active.last_name = Set(last_name.clone());
        }
        if let Some(role) = patch.role {
            active.role = Set(role.as_str().to_string());
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(crate::db::now());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user")?;
        Ok(Some(User::from(model)))
    }

    pub async fn update_password_hash(&self, id: i32, password_hash: String) -> Result<bool> {
        let Some(user) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(crate::db::now());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Salt of the stored password hash. It changes every time the password does.
    pub async fn credential_stamp(&self, id: i32) -> Result<Option<String>> {
        let Some(user) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        Ok(credential_stamp(&user.password_hash))
    }

    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<Option<User>> {
        self.update(
            id,
            &UserPatch {
                is_active: Some(is_active),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Extract the salt from a PHC hash string.
#[must_use]
pub fn credential_stamp(password_hash: &str) -> Option<String> {
    PasswordHash::new(password_hash)
        .ok()
        .and_then(|hash| hash.salt.map(|salt| salt.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn test_hash_password_produces_argon2id_phc() {
        let hash = hash_password("Secret123", &cheap_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, hash_password("Secret123", &cheap_params()).unwrap());
    }

    #[test]
    fn test_hash_password_rejects_bad_params() {
        let params = SecurityConfig {
            argon2_memory_cost_kib: 1,
            ..cheap_params()
        };
        assert!(hash_password("Secret123", &params).is_err());
    }

    #[test]
    fn test_credential_stamp_changes_with_each_hash() {
        let first = hash_password("Secret123", &cheap_params()).unwrap();
        let second = hash_password("Secret123", &cheap_params()).unwrap();

        let stamp = credential_stamp(&first).unwrap();
        assert!(first.contains(&stamp));
        assert_ne!(Some(stamp), credential_stamp(&second));
        assert_eq!(credential_stamp("not-a-phc-string"), None);
    }
}
