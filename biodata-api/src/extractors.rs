//! Authentication gate and role policy.
//!
//! Every credential failure answers 401; a known caller without the needed
//! role answers 403. The role always comes from the user row, never from the
//! token, so a role change applies on the caller's next request.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use biodata_shared::errors::{AppError, AppResult, ErrorCode};
use biodata_shared::middleware::{decode_access_token, extract_bearer_token};
use biodata_shared::types::UserRole;

use crate::models::User;
use crate::AppState;

/// The caller's full user row.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = decode_access_token(&token, &state.config.jwt_secret)?;

        let user = state
            .store
            .find_user(claims.sub)?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "User profile not found"))?;

        Ok(Self(user))
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(AuthUser::from(user))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePolicy {
    AdminOnly,
    AdminOrParent,
}

impl RolePolicy {
    pub fn allows(self, role: UserRole) -> bool {
        match self {
            RolePolicy::AdminOnly => role == UserRole::Admin,
            RolePolicy::AdminOrParent => matches!(role, UserRole::Admin | UserRole::ParentRelative),
        }
    }

    pub fn check(self, user: &AuthUser) -> AppResult<()> {
        if self.allows(user.role) {
            Ok(())
        } else {
            tracing::debug!(user_id = %user.id, role = %user.role, policy = ?self, "role check failed");
            Err(AppError::new(ErrorCode::InsufficientPermissions, "Insufficient permissions"))
        }
    }
}

/// Require Admin role
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        RolePolicy::AdminOnly.check(&user)?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: UserRole) -> AuthUser {
        AuthUser {
            id: Uuid::now_v7(),
            email: "caller@example.com".into(),
            role,
        }
    }

    #[test]
    fn admin_only_admits_admins() {
        assert!(RolePolicy::AdminOnly.allows(UserRole::Admin));
        assert!(!RolePolicy::AdminOnly.allows(UserRole::ParentRelative));
        assert!(!RolePolicy::AdminOnly.allows(UserRole::Candidate));
    }

    #[test]
    fn admin_or_parent_excludes_candidates() {
        assert!(RolePolicy::AdminOrParent.allows(UserRole::Admin));
        assert!(RolePolicy::AdminOrParent.allows(UserRole::ParentRelative));
        assert!(!RolePolicy::AdminOrParent.allows(UserRole::Candidate));
    }

    #[test]
    fn failed_check_is_forbidden() {
        let err = RolePolicy::AdminOnly.check(&caller(UserRole::ParentRelative)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientPermissions);
        assert_eq!(err.to_string(), "Insufficient permissions");
        assert!(RolePolicy::AdminOnly.check(&caller(UserRole::Admin)).is_ok());
    }
}
