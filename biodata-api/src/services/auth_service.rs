use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use biodata_shared::errors::{AppError, AppResult, ErrorCode};
use biodata_shared::types::auth::{TokenPair, UserRole};

use crate::config::AppConfig;
use crate::models::{NewUser, User};
use crate::services::token_service;
use crate::store::Store;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub session: TokenPair,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// First failing rule, checked in field order.
fn first_violation(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    ["email", "password"]
        .iter()
        .filter_map(|name| fields.get(name))
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".to_string())
}

pub fn register(store: &dyn Store, config: &AppConfig, req: RegisterRequest) -> AppResult<AuthSession> {
    let req = RegisterRequest {
        email: normalize_email(&req.email),
        password: req.password,
    };
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, first_violation(&e)))?;

    if store.find_user_by_email(&req.email)?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "Email already registered"));
    }

    let password_hash = hash_password(&req.password)?;
    let user = store
        .insert_user(NewUser {
            email: req.email,
            password_hash,
            role: UserRole::ParentRelative,
        })
        .map_err(|e| e.on_unique_violation(ErrorCode::EmailAlreadyExists, "Email already registered"))?;

    tracing::info!(user_id = %user.id, email = %user.email, "verification email not sent: no mail transport configured");

    let session = token_service::issue_session(store, config, &user)?;
    tracing::info!(user_id = %user.id, email = %user.email, "user registered");

    Ok(AuthSession { user, session })
}

pub fn login(store: &dyn Store, config: &AppConfig, req: LoginRequest) -> AppResult<AuthSession> {
    let invalid = || AppError::new(ErrorCode::InvalidCredentials, "Invalid email or password");

    let user = store
        .find_user_by_email(&normalize_email(&req.email))?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let session = token_service::issue_session(store, config, &user)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(AuthSession { user, session })
}

/// Revokes every refresh token of the user. Store failures are logged only.
pub fn logout(store: &dyn Store, user_id: uuid::Uuid) {
    match store.revoke_user_refresh_tokens(user_id, Utc::now()) {
        Ok(revoked) => tracing::info!(user_id = %user_id, revoked, "user logged out"),
        Err(e) => tracing::error!(user_id = %user_id, error = %e, "failed to revoke refresh tokens on logout"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn register_lowercases_email_and_assigns_parent_role() {
        let store = MemoryStore::new();
        let config = AppConfig::default();
        let session = register(&store, &config, register_req("  Amina@Example.COM ", "password123")).unwrap();

        assert_eq!(session.user.email, "amina@example.com");
        assert_eq!(session.user.role, UserRole::ParentRelative);
        assert!(!session.user.email_verified);
        assert_eq!(session.session.token_type, "Bearer");
    }

    #[test]
    fn register_rejects_bad_input_and_duplicates() {
        let store = MemoryStore::new();
        let config = AppConfig::default();

        let err = register(&store, &config, register_req("not-an-email", "password123")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");

        let err = register(&store, &config, register_req("a@example.com", "short")).unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters long");

        register(&store, &config, register_req("a@example.com", "password123")).unwrap();
        let err = register(&store, &config, register_req("A@example.com", "password123")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmailAlreadyExists);
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn login_checks_password() {
        let store = MemoryStore::new();
        let config = AppConfig::default();
        register(&store, &config, register_req("b@example.com", "password123")).unwrap();

        let ok = login(&store, &config, LoginRequest { email: "B@example.com".into(), password: "password123".into() });
        assert!(ok.is_ok());

        for (email, password) in [("b@example.com", "wrong-password"), ("nobody@example.com", "password123")] {
            let err = login(&store, &config, LoginRequest { email: email.into(), password: password.into() }).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidCredentials);
            assert_eq!(err.to_string(), "Invalid email or password");
        }
    }

    #[test]
    fn refresh_rotates_once_and_logout_revokes() {
        let store = MemoryStore::new();
        let config = AppConfig::default();
        let session = register(&store, &config, register_req("c@example.com", "password123")).unwrap();

        let (_, rotated) = token_service::rotate_session(&store, &config, &session.session.refresh_token).unwrap();
        let reused = token_service::rotate_session(&store, &config, &session.session.refresh_token).unwrap_err();
        assert_eq!(reused.code(), ErrorCode::RefreshTokenRevoked);

        logout(&store, session.user.id);
        let err = token_service::rotate_session(&store, &config, &rotated.refresh_token).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RefreshTokenRevoked);
    }
}
