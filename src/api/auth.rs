use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::models::user::{User, UserRole};
use crate::services::UserError;

pub const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

pub const STAFF: &[UserRole] = &[UserRole::Admin, UserRole::Moderator];

/// The account behind the bearer token, loaded fresh for every request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))
    }
}

/// Requires `Authorization: Bearer <jwt>` and an active account.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = {
        let token = extract_bearer(request.headers())
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;
        state.auth().verify_access_token(token)?
    };

    let user = state
        .users()
        .get_by_id(claims.sub)
        .await
        .map_err(|e| match e {
            UserError::NotFound(_) => ApiError::Unauthorized("User not found".to_string()),
            other => other.into(),
        })?;

    if !user.is_active {
        return Err(ApiError::Forbidden(
            "User account is deactivated".to_string(),
        ));
    }

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Must run after [`auth_middleware`].
pub async fn role_gate(
    State(allowed): State<&'static [UserRole]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = request
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(user)| user.role)
        .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;

    if !allowed.contains(&role) {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(extract_bearer(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_role_sets() {
        assert!(ADMIN_ONLY.contains(&UserRole::Admin));
        assert!(!ADMIN_ONLY.contains(&UserRole::Moderator));
        assert!(STAFF.contains(&UserRole::Moderator));
        assert!(!STAFF.contains(&UserRole::User));
    }
}
