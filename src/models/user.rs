use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{PageRequest, SortField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
    Moderator,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "moderator" => Ok(Self::Moderator),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Account as exposed to clients. The password hash never leaves the
/// repository layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Profile edits may not touch privileges.
    #[must_use]
    pub fn without_privileges(self) -> Self {
        Self {
            role: None,
            is_active: None,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortField {
    Email,
    FirstName,
    LastName,
    #[default]
    CreatedAt,
    Role,
}

impl SortField for UserSortField {
    const ALLOWED: &'static [&'static str] = &["email", "firstName", "lastName", "createdAt", "role"];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(Self::Email),
            "firstName" => Some(Self::FirstName),
            "lastName" => Some(Self::LastName),
            "createdAt" => Some(Self::CreatedAt),
            "role" => Some(Self::Role),
            _ => None,
        }
    }
}

/// Listing filters. `search` and `role` are mutually exclusive; when both are
/// supplied the free-text search wins.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub page: PageRequest<UserSortField>,
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [UserRole::User, UserRole::Admin, UserRole::Moderator] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_profile_patch_strips_privileges() {
        let patch = UserPatch {
            first_name: Some("Ada".to_string()),
            role: Some(UserRole::Admin),
            is_active: Some(false),
            ..Default::default()
        }
        .without_privileges();

        assert_eq!(patch.first_name.as_deref(), Some("Ada"));
        assert!(patch.role.is_none());
        assert!(patch.is_active.is_none());
    }
}
