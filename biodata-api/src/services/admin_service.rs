use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use biodata_shared::errors::{AppError, AppResult, ErrorCode};
use biodata_shared::types::UserRole;

use crate::models::{AdminActionEntry, AdminActionKind, PendingProfile, Profile, ProfileStatus, Stats, User, UserSummary};
use crate::services::audit;
use crate::store::Store;

/// How many audit records the dashboard shows.
pub const RECENT_ACTIONS_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Tells apart a missing profile from one that left PENDING after a failed
/// conditional write.
fn review_failure(store: &dyn Store, id: Uuid) -> AppError {
    match store.find_profile(id) {
        Ok(Some(_)) => AppError::new(ErrorCode::ProfileNotPending, "Profile is not pending approval"),
        Ok(None) => AppError::new(ErrorCode::ProfileNotFound, "Profile not found"),
        Err(e) => e,
    }
}

pub fn pending_profiles(store: &dyn Store) -> AppResult<Vec<PendingProfile>> {
    store.list_pending_profiles()
}

pub fn approve_profile(store: &dyn Store, admin_id: Uuid, id: Uuid, req: ApproveRequest) -> AppResult<Profile> {
    let profile = store
        .approve_pending_profile(id, Utc::now())?
        .ok_or_else(|| review_failure(store, id))?;

    tracing::info!(profile_id = %id, admin_id = %admin_id, "profile approved");
    audit::record(store, AdminActionKind::ApproveProfile, admin_id, Some(id), None, non_blank(req.notes));

    Ok(profile)
}

pub fn reject_profile(store: &dyn Store, admin_id: Uuid, id: Uuid, req: RejectRequest) -> AppResult<Profile> {
    let reason = non_blank(req.reason)
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, "Rejection reason is required"))?;

    let profile = store
        .reject_pending_profile(id, &reason)?
        .ok_or_else(|| review_failure(store, id))?;

    tracing::info!(profile_id = %id, admin_id = %admin_id, reason = %reason, "profile rejected");
    audit::record(
        store,
        AdminActionKind::RejectProfile,
        admin_id,
        Some(id),
        Some(reason),
        non_blank(req.notes),
    );

    Ok(profile)
}

/// Six independent counts; they are not read from one snapshot.
pub fn stats(store: &dyn Store) -> AppResult<Stats> {
    Ok(Stats {
        total_users: store.count_users()?,
        total_profiles: store.count_profiles(None)?,
        pending_profiles: store.count_profiles(Some(ProfileStatus::Pending))?,
        approved_profiles: store.count_profiles(Some(ProfileStatus::Approved))?,
        rejected_profiles: store.count_profiles(Some(ProfileStatus::Rejected))?,
        active_interests: store.count_active_interests()?,
    })
}

pub fn list_users(store: &dyn Store) -> AppResult<Vec<UserSummary>> {
    Ok(store.list_users()?.into_iter().map(UserSummary::from).collect())
}

/// Roles an admin may hand out.
pub fn assignable_role(raw: &str) -> AppResult<UserRole> {
    match raw.parse::<UserRole>() {
        Ok(role @ (UserRole::Admin | UserRole::ParentRelative)) => Ok(role),
        _ => Err(AppError::new(ErrorCode::InvalidRole, "Invalid role")),
    }
}

pub fn update_user_role(store: &dyn Store, admin_id: Uuid, user_id: Uuid, req: UpdateRoleRequest) -> AppResult<User> {
    let role = assignable_role(&req.role)?;

    let user = store
        .set_user_role(user_id, role)?
        .ok_or_else(|| AppError::new(ErrorCode::AccountNotFound, "User not found"))?;

    tracing::info!(user_id = %user_id, admin_id = %admin_id, role = %role, "user role updated");
    audit::record(
        store,
        AdminActionKind::UpdateUserRole,
        admin_id,
        None,
        None,
        Some(format!("Changed role of user {user_id} to {role}")),
    );

    Ok(user)
}

pub fn recent_actions(store: &dyn Store) -> AppResult<Vec<AdminActionEntry>> {
    store.list_admin_actions(RECENT_ACTIONS_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::services::profile_service::{create_profile, withdraw_profile};
    use crate::store::MemoryStore;
    use crate::validation::example_biodata;

    struct Fixture {
        store: MemoryStore,
        admin: User,
        parent: User,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let admin = store
            .insert_user(NewUser { email: "admin@example.com".into(), password_hash: "x".into(), role: UserRole::Admin })
            .unwrap();
        let parent = store
            .insert_user(NewUser { email: "parent@example.com".into(), password_hash: "x".into(), role: UserRole::ParentRelative })
            .unwrap();
        Fixture { store, admin, parent }
    }

    fn submit(f: &Fixture) -> Profile {
        create_profile(&f.store, f.parent.id, &example_biodata(), Utc::now().date_naive()).unwrap()
    }

    #[test]
    fn approval_publishes_and_is_audited() {
        let f = fixture();
        let profile = submit(&f);

        let approved = approve_profile(&f.store, f.admin.id, profile.id, ApproveRequest { notes: Some("looks good".into()) }).unwrap();
        assert_eq!(approved.status, ProfileStatus::Approved);
        assert!(approved.published_at.is_some());

        let actions = recent_actions(&f.store).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action.action, AdminActionKind::ApproveProfile);
        assert_eq!(actions[0].action.notes.as_deref(), Some("looks good"));
        assert_eq!(actions[0].admin.email, "admin@example.com");
        assert_eq!(actions[0].profile.as_ref().map(|p| p.id), Some(profile.id));
    }

    #[test]
    fn review_requires_pending_status() {
        let f = fixture();
        let approved = submit(&f);
        approve_profile(&f.store, f.admin.id, approved.id, ApproveRequest::default()).unwrap();

        let reject = || RejectRequest { reason: Some("duplicate".into()), notes: None };
        for outcome in [
            approve_profile(&f.store, f.admin.id, approved.id, ApproveRequest::default()),
            reject_profile(&f.store, f.admin.id, approved.id, reject()),
        ] {
            let err = outcome.unwrap_err();
            assert_eq!(err.code(), ErrorCode::ProfileNotPending);
            assert_eq!(err.to_string(), "Profile is not pending approval");
        }

        withdraw_profile(&f.store, approved.id, f.parent.id).unwrap();
        let err = reject_profile(&f.store, f.admin.id, approved.id, reject()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileNotPending);

        let err = approve_profile(&f.store, f.admin.id, Uuid::now_v7(), ApproveRequest::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileNotFound);
    }

    #[test]
    fn rejection_needs_a_reason() {
        let f = fixture();
        let profile = submit(&f);

        let err = reject_profile(&f.store, f.admin.id, profile.id, RejectRequest { reason: Some("  ".into()), notes: None }).unwrap_err();
        assert_eq!(err.to_string(), "Rejection reason is required");

        let rejected = reject_profile(
            &f.store,
            f.admin.id,
            profile.id,
            RejectRequest { reason: Some("Missing education details".into()), notes: None },
        )
        .unwrap();
        assert_eq!(rejected.status, ProfileStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Missing education details"));
    }

    #[test]
    fn audit_failure_does_not_fail_the_review() {
        let f = fixture();
        let profile = submit(&f);
        f.store.fail_admin_actions(true);

        let approved = approve_profile(&f.store, f.admin.id, profile.id, ApproveRequest::default()).unwrap();
        assert_eq!(approved.status, ProfileStatus::Approved);
        assert!(recent_actions(&f.store).unwrap().is_empty());
    }

    #[test]
    fn only_admin_and_parent_roles_are_assignable() {
        let f = fixture();
        let updated = update_user_role(&f.store, f.admin.id, f.parent.id, UpdateRoleRequest { role: "ADMIN".into() }).unwrap();
        assert_eq!(updated.role, UserRole::Admin);

        for role in ["CANDIDATE", "admin", ""] {
            let err = update_user_role(&f.store, f.admin.id, f.parent.id, UpdateRoleRequest { role: role.into() }).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidRole, "{role}");
        }

        let err = update_user_role(&f.store, f.admin.id, Uuid::now_v7(), UpdateRoleRequest { role: "ADMIN".into() }).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountNotFound);

        let actions = recent_actions(&f.store).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action.action, AdminActionKind::UpdateUserRole);
    }

    #[test]
    fn stats_count_each_bucket() {
        let f = fixture();
        let profile = submit(&f);
        approve_profile(&f.store, f.admin.id, profile.id, ApproveRequest::default()).unwrap();

        assert_eq!(
            stats(&f.store).unwrap(),
            Stats {
                total_users: 2,
                total_profiles: 1,
                pending_profiles: 0,
                approved_profiles: 1,
                rejected_profiles: 0,
                active_interests: 0,
            }
        );
    }
}
