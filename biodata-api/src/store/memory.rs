use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use biodata_shared::errors::{AppError, AppResult, ErrorCode};
use biodata_shared::types::UserRole;

use crate::models::{
    AdminAction, AdminActionEntry, Interest, NewAdminAction, NewInterest, NewProfile,
    NewRefreshToken, NewUser, PendingProfile, Profile, ProfileFields, ProfileFilter, ProfileRef,
    ProfileStatus, RefreshToken, Submitter, User, UserIdentity,
};

use super::Store;

/// In-process store with the same uniqueness and conditional-write rules as
/// the Postgres schema. Rows are kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_admin_actions: AtomicBool,
    offline: AtomicBool,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: Vec<RefreshToken>,
    profiles: Vec<Profile>,
    interests: Vec<Interest>,
    admin_actions: Vec<AdminAction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every audit-log insert fail until switched back.
    pub fn fail_admin_actions(&self, fail: bool) {
        self.fail_admin_actions.store(fail, Ordering::SeqCst);
    }

    /// Makes `ping` fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::internal("memory store lock poisoned"))
    }
}

fn unique_violation(constraint: &str) -> AppError {
    AppError::Database(diesel::result::Error::DatabaseError(
        DatabaseErrorKind::UniqueViolation,
        Box::new(format!("duplicate key value violates unique constraint \"{constraint}\"")),
    ))
}

impl Store for MemoryStore {
    fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut t = self.tables()?;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(unique_violation("users_email_key"));
        }
        let now = Utc::now();
        let row = User {
            id: Uuid::now_v7(),
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            email_verified: false,
            created_at: now,
            updated_at: now,
        };
        t.users.push(row.clone());
        Ok(row)
    }

    fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.email == email).cloned())
    }

    fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.tables()?.users.iter().rev().cloned().collect())
    }

    fn set_user_role(&self, id: Uuid, role: UserRole) -> AppResult<Option<User>> {
        let mut t = self.tables()?;
        Ok(t.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.role = role;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    fn insert_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken> {
        let mut t = self.tables()?;
        if t.refresh_tokens.iter().any(|r| r.token_hash == token.token_hash) {
            return Err(unique_violation("refresh_tokens_token_hash_key"));
        }
        let row = RefreshToken {
            id: Uuid::now_v7(),
            user_id: token.user_id,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        };
        t.refresh_tokens.push(row.clone());
        Ok(row)
    }

    fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self
            .tables()?
            .refresh_tokens
            .iter()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    fn revoke_refresh_token(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let mut t = self.tables()?;
        match t.refresh_tokens.iter_mut().find(|r| r.id == id && r.revoked_at.is_none()) {
            Some(token) => {
                token.revoked_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn revoke_user_refresh_tokens(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<usize> {
        let mut t = self.tables()?;
        let mut revoked = 0;
        for token in t
            .refresh_tokens
            .iter_mut()
            .filter(|r| r.user_id == user_id && r.revoked_at.is_none())
        {
            token.revoked_at = Some(at);
            revoked += 1;
        }
        Ok(revoked)
    }

    fn insert_profile(&self, profile: NewProfile) -> AppResult<Profile> {
        let mut t = self.tables()?;
        if t.profiles.iter().any(|p| {
            p.submitted_by_id == profile.submitted_by_id && p.status != ProfileStatus::Withdrawn
        }) {
            return Err(unique_violation("profiles_one_live_per_user"));
        }
        let now = Utc::now();
        let row = Profile {
            id: Uuid::now_v7(),
            submitted_by_id: profile.submitted_by_id,
            status: profile.status,
            rejection_reason: None,
            published_at: None,
            fields: profile.fields,
            created_at: now,
            updated_at: now,
        };
        t.profiles.push(row.clone());
        Ok(row)
    }

    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.tables()?.profiles.iter().find(|p| p.id == id).cloned())
    }

    fn find_latest_profile_by_owner(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self
            .tables()?
            .profiles
            .iter()
            .rev()
            .find(|p| p.submitted_by_id == user_id)
            .cloned())
    }

    fn find_approved_profile_by_owner(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self
            .tables()?
            .profiles
            .iter()
            .find(|p| p.submitted_by_id == user_id && p.status == ProfileStatus::Approved)
            .cloned())
    }

    fn list_approved_profiles(&self, filter: &ProfileFilter, today: NaiveDate) -> AppResult<Vec<Profile>> {
        Ok(self
            .tables()?
            .profiles
            .iter()
            .rev()
            .filter(|p| p.status == ProfileStatus::Approved && filter.matches(p, today))
            .cloned()
            .collect())
    }

    fn list_pending_profiles(&self) -> AppResult<Vec<PendingProfile>> {
        let t = self.tables()?;
        Ok(t.profiles
            .iter()
            .filter(|p| p.status == ProfileStatus::Pending)
            .filter_map(|p| {
                let user = t.users.iter().find(|u| u.id == p.submitted_by_id)?;
                Some(PendingProfile {
                    profile: p.clone(),
                    submitted_by: Submitter {
                        id: user.id,
                        email: user.email.clone(),
                        created_at: user.created_at,
                    },
                })
            })
            .collect())
    }

    fn resubmit_profile(&self, id: Uuid, fields: ProfileFields) -> AppResult<Option<Profile>> {
        let mut t = self.tables()?;
        Ok(t.profiles
            .iter_mut()
            .find(|p| p.id == id && p.status != ProfileStatus::Withdrawn)
            .map(|p| {
                p.fields = fields;
                p.status = ProfileStatus::Pending;
                p.rejection_reason = None;
                p.published_at = None;
                p.updated_at = Utc::now();
                p.clone()
            }))
    }

    fn withdraw_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let mut t = self.tables()?;
        Ok(t.profiles.iter_mut().find(|p| p.id == id).map(|p| {
            p.status = ProfileStatus::Withdrawn;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    fn approve_pending_profile(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Profile>> {
        let mut t = self.tables()?;
        Ok(t.profiles
            .iter_mut()
            .find(|p| p.id == id && p.status == ProfileStatus::Pending)
            .map(|p| {
                p.status = ProfileStatus::Approved;
                p.published_at = Some(at);
                p.updated_at = at;
                p.clone()
            }))
    }

    fn reject_pending_profile(&self, id: Uuid, reason: &str) -> AppResult<Option<Profile>> {
        let mut t = self.tables()?;
        Ok(t.profiles
            .iter_mut()
            .find(|p| p.id == id && p.status == ProfileStatus::Pending)
            .map(|p| {
                p.status = ProfileStatus::Rejected;
                p.rejection_reason = Some(reason.to_string());
                p.updated_at = Utc::now();
                p.clone()
            }))
    }

    fn insert_interest(&self, interest: NewInterest) -> AppResult<Interest> {
        let mut t = self.tables()?;
        if t.interests.iter().any(|i| {
            i.is_active
                && i.interested_user_id == interest.interested_user_id
                && i.target_profile_id == interest.target_profile_id
        }) {
            return Err(unique_violation("interests_one_active_per_pair"));
        }
        let now = Utc::now();
        let row = Interest {
            id: Uuid::now_v7(),
            interested_user_id: interest.interested_user_id,
            target_profile_id: interest.target_profile_id,
            is_active: true,
            notes: interest.notes,
            created_at: now,
            updated_at: now,
        };
        t.interests.push(row.clone());
        Ok(row)
    }

    fn find_interest(&self, id: Uuid) -> AppResult<Option<Interest>> {
        Ok(self.tables()?.interests.iter().find(|i| i.id == id).cloned())
    }

    fn find_active_interest(&self, user_id: Uuid, profile_id: Uuid) -> AppResult<Option<Interest>> {
        Ok(self
            .tables()?
            .interests
            .iter()
            .find(|i| i.is_active && i.interested_user_id == user_id && i.target_profile_id == profile_id)
            .cloned())
    }

    fn deactivate_interest(&self, id: Uuid) -> AppResult<Option<Interest>> {
        let mut t = self.tables()?;
        Ok(t.interests.iter_mut().find(|i| i.id == id).map(|i| {
            i.is_active = false;
            i.updated_at = Utc::now();
            i.clone()
        }))
    }

    fn list_active_interests_by(&self, user_id: Uuid) -> AppResult<Vec<(Interest, Profile)>> {
        let t = self.tables()?;
        Ok(t.interests
            .iter()
            .rev()
            .filter(|i| i.is_active && i.interested_user_id == user_id)
            .filter_map(|i| {
                let profile = t.profiles.iter().find(|p| p.id == i.target_profile_id)?;
                Some((i.clone(), profile.clone()))
            })
            .collect())
    }

    fn list_active_interests_in(&self, profile_id: Uuid) -> AppResult<Vec<(Interest, User)>> {
        let t = self.tables()?;
        Ok(t.interests
            .iter()
            .rev()
            .filter(|i| i.is_active && i.target_profile_id == profile_id)
            .filter_map(|i| {
                let user = t.users.iter().find(|u| u.id == i.interested_user_id)?;
                Some((i.clone(), user.clone()))
            })
            .collect())
    }

    fn insert_admin_action(&self, action: NewAdminAction) -> AppResult<AdminAction> {
        if self.fail_admin_actions.load(Ordering::SeqCst) {
            return Err(AppError::internal("admin_actions insert failed"));
        }
        let mut t = self.tables()?;
        let row = AdminAction {
            id: Uuid::now_v7(),
            action: action.action,
            reason: action.reason,
            notes: action.notes,
            admin_id: action.admin_id,
            profile_id: action.profile_id,
            created_at: Utc::now(),
        };
        t.admin_actions.push(row.clone());
        Ok(row)
    }

    fn list_admin_actions(&self, limit: i64) -> AppResult<Vec<AdminActionEntry>> {
        let t = self.tables()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(t.admin_actions
            .iter()
            .rev()
            .filter_map(|a| {
                let admin = t.users.iter().find(|u| u.id == a.admin_id)?;
                let profile = a
                    .profile_id
                    .and_then(|id| t.profiles.iter().find(|p| p.id == id))
                    .map(|p| ProfileRef { id: p.id, name: p.fields.name.clone() });
                Some(AdminActionEntry {
                    action: a.clone(),
                    admin: UserIdentity { id: admin.id, email: admin.email.clone() },
                    profile,
                })
            })
            .take(limit)
            .collect())
    }

    fn count_users(&self) -> AppResult<i64> {
        Ok(self.tables()?.users.len() as i64)
    }

    fn count_profiles(&self, status: Option<ProfileStatus>) -> AppResult<i64> {
        let t = self.tables()?;
        let count = t
            .profiles
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .count();
        Ok(count as i64)
    }

    fn count_active_interests(&self) -> AppResult<i64> {
        Ok(self.tables()?.interests.iter().filter(|i| i.is_active).count() as i64)
    }

    fn ping(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::new(ErrorCode::ServiceUnavailable, "Database unavailable"));
        }
        Ok(())
    }
}
