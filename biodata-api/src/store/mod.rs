//! Persistence seam. Services take `&dyn Store`; `PgStore` backs the binary
//! and `MemoryStore` backs the tests.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use biodata_shared::errors::AppResult;
use biodata_shared::types::UserRole;

use crate::models::{
    AdminAction, AdminActionEntry, Interest, NewAdminAction, NewInterest, NewProfile,
    NewRefreshToken, NewUser, PendingProfile, Profile, ProfileFields, ProfileFilter,
    ProfileStatus, RefreshToken, User,
};

/// Storage operations the service needs.
///
/// Inserts that break a uniqueness rule (email, one live profile per user,
/// one active interest per pair) fail with a unique-violation database error.
/// Conditional writes return `None` when the row is absent or the condition
/// no longer holds; callers re-read to tell the two apart.
pub trait Store: Send + Sync {
    // Users
    fn insert_user(&self, user: NewUser) -> AppResult<User>;
    fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Newest first.
    fn list_users(&self) -> AppResult<Vec<User>>;
    fn set_user_role(&self, id: Uuid, role: UserRole) -> AppResult<Option<User>>;

    // Refresh tokens
    fn insert_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken>;
    fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>>;
    /// Revokes one token if it is not revoked yet.
    fn revoke_refresh_token(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;
    fn revoke_user_refresh_tokens(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<usize>;

    // Profiles
    fn insert_profile(&self, profile: NewProfile) -> AppResult<Profile>;
    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;
    /// Most recently created profile of the user, any status.
    fn find_latest_profile_by_owner(&self, user_id: Uuid) -> AppResult<Option<Profile>>;
    fn find_approved_profile_by_owner(&self, user_id: Uuid) -> AppResult<Option<Profile>>;
    /// APPROVED profiles matching `filter`, newest first.
    fn list_approved_profiles(&self, filter: &ProfileFilter, today: chrono::NaiveDate) -> AppResult<Vec<Profile>>;
    /// PENDING profiles with their submitter, oldest first.
    fn list_pending_profiles(&self) -> AppResult<Vec<PendingProfile>>;
    /// Overwrites the biodata of a non-withdrawn profile and puts it back to
    /// PENDING, clearing any earlier review outcome.
    fn resubmit_profile(&self, id: Uuid, fields: ProfileFields) -> AppResult<Option<Profile>>;
    fn withdraw_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;
    /// PENDING -> APPROVED, stamping `published_at`.
    fn approve_pending_profile(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Profile>>;
    /// PENDING -> REJECTED with a reason.
    fn reject_pending_profile(&self, id: Uuid, reason: &str) -> AppResult<Option<Profile>>;

    // Interests
    fn insert_interest(&self, interest: NewInterest) -> AppResult<Interest>;
    fn find_interest(&self, id: Uuid) -> AppResult<Option<Interest>>;
    fn find_active_interest(&self, user_id: Uuid, profile_id: Uuid) -> AppResult<Option<Interest>>;
    fn deactivate_interest(&self, id: Uuid) -> AppResult<Option<Interest>>;
    /// Active interests expressed by the user with their target profile, newest first.
    fn list_active_interests_by(&self, user_id: Uuid) -> AppResult<Vec<(Interest, Profile)>>;
    /// Active interests targeting the profile with the interested user, newest first.
    fn list_active_interests_in(&self, profile_id: Uuid) -> AppResult<Vec<(Interest, User)>>;

    // Audit log
    fn insert_admin_action(&self, action: NewAdminAction) -> AppResult<AdminAction>;
    /// Newest first.
    fn list_admin_actions(&self, limit: i64) -> AppResult<Vec<AdminActionEntry>>;

    // Counters
    fn count_users(&self) -> AppResult<i64>;
    fn count_profiles(&self, status: Option<ProfileStatus>) -> AppResult<i64>;
    fn count_active_interests(&self) -> AppResult<i64>;

    fn ping(&self) -> AppResult<()>;
}
