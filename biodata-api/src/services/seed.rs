use biodata_shared::errors::{AppResult, ErrorCode};
use biodata_shared::types::UserRole;

use crate::config::AppConfig;
use crate::models::NewUser;
use crate::services::auth_service;
use crate::store::Store;

/// Makes sure the configured admin account exists and holds the ADMIN role.
pub fn ensure_admin(store: &dyn Store, config: &AppConfig) -> AppResult<()> {
    let Some(email) = config.admin_email.as_deref().map(auth_service::normalize_email) else {
        tracing::debug!("no admin email configured, skipping admin seed");
        return Ok(());
    };

    if let Some(user) = store.find_user_by_email(&email)? {
        if user.role != UserRole::Admin {
            store.set_user_role(user.id, UserRole::Admin)?;
            tracing::info!(user_id = %user.id, email = %email, "existing account promoted to admin");
        }
        return Ok(());
    }

    let Some(password) = config.admin_password.as_deref() else {
        tracing::warn!(email = %email, "admin account missing and no admin password configured, not creating it");
        return Ok(());
    };

    let user = store
        .insert_user(NewUser {
            email: email.clone(),
            password_hash: auth_service::hash_password(password)?,
            role: UserRole::Admin,
        })
        .map_err(|e| e.on_unique_violation(ErrorCode::EmailAlreadyExists, "Email already registered"))?;

    tracing::info!(user_id = %user.id, email = %email, "admin account created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn config(email: Option<&str>, password: Option<&str>) -> AppConfig {
        AppConfig {
            admin_email: email.map(String::from),
            admin_password: password.map(String::from),
            ..AppConfig::default()
        }
    }

    #[test]
    fn creates_missing_admin() {
        let store = MemoryStore::new();
        ensure_admin(&store, &config(Some("Root@Example.com"), Some("admin-password"))).unwrap();

        let admin = store.find_user_by_email("root@example.com").unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(auth_service::verify_password("admin-password", &admin.password_hash).unwrap());

        // Running again is a no-op.
        ensure_admin(&store, &config(Some("root@example.com"), Some("admin-password"))).unwrap();
        assert_eq!(store.count_users().unwrap(), 1);
    }

    #[test]
    fn promotes_existing_account() {
        let store = MemoryStore::new();
        store
            .insert_user(NewUser {
                email: "lead@example.com".into(),
                password_hash: "x".into(),
                role: UserRole::ParentRelative,
            })
            .unwrap();

        ensure_admin(&store, &config(Some("lead@example.com"), None)).unwrap();
        let user = store.find_user_by_email("lead@example.com").unwrap().unwrap();
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn skips_without_password_or_email() {
        let store = MemoryStore::new();
        ensure_admin(&store, &config(Some("root@example.com"), None)).unwrap();
        ensure_admin(&store, &config(None, Some("pw"))).unwrap();
        assert_eq!(store.count_users().unwrap(), 0);
    }
}
