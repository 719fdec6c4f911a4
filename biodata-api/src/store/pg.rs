use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use uuid::Uuid;

use biodata_shared::clients::db::DbPool;
use biodata_shared::errors::{AppError, AppResult, ErrorCode};
use biodata_shared::types::UserRole;

use crate::models::{
    AdminAction, AdminActionEntry, Interest, NewAdminAction, NewInterest, NewProfile,
    NewRefreshToken, NewUser, PendingProfile, Profile, ProfileFields, ProfileFilter, ProfileRef,
    ProfileStatus, RefreshToken, Submitter, User, UserIdentity,
};
use crate::schema::{admin_actions, interests, profiles, refresh_tokens, users};

use super::Store;

type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> AppResult<PgPooled> {
        self.pool.get().map_err(|e| {
            tracing::error!(error = %e, "database connection checkout failed");
            AppError::new(ErrorCode::ServiceUnavailable, "Database unavailable")
        })
    }
}

/// `%term%` for ILIKE with the pattern metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl Store for PgStore {
    fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut conn = self.conn()?;
        let user = diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)?;
        Ok(user)
    }

    fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut conn = self.conn()?;
        let user = users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }

    fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let mut conn = self.conn()?;
        let user = users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> AppResult<Vec<User>> {
        let mut conn = self.conn()?;
        let list = users::table
            .order(users::created_at.desc())
            .select(User::as_select())
            .load(&mut conn)?;
        Ok(list)
    }

    fn set_user_role(&self, id: Uuid, role: UserRole) -> AppResult<Option<User>> {
        let mut conn = self.conn()?;
        let user = diesel::update(users::table.find(id))
            .set((users::role.eq(role), users::updated_at.eq(Utc::now())))
            .returning(User::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(user)
    }

    fn insert_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken> {
        let mut conn = self.conn()?;
        let token = diesel::insert_into(refresh_tokens::table)
            .values(&token)
            .returning(RefreshToken::as_returning())
            .get_result(&mut conn)?;
        Ok(token)
    }

    fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        let mut conn = self.conn()?;
        let token = refresh_tokens::table
            .filter(refresh_tokens::token_hash.eq(token_hash))
            .select(RefreshToken::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(token)
    }

    fn revoke_refresh_token(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::id.eq(id))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set(refresh_tokens::revoked_at.eq(Some(at)))
        .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn revoke_user_refresh_tokens(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<usize> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::user_id.eq(user_id))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set(refresh_tokens::revoked_at.eq(Some(at)))
        .execute(&mut conn)?;
        Ok(updated)
    }

    fn insert_profile(&self, profile: NewProfile) -> AppResult<Profile> {
        let mut conn = self.conn()?;
        let profile = diesel::insert_into(profiles::table)
            .values(&profile)
            .returning(Profile::as_returning())
            .get_result(&mut conn)?;
        Ok(profile)
    }

    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let profile = profiles::table
            .find(id)
            .select(Profile::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(profile)
    }

    fn find_latest_profile_by_owner(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let profile = profiles::table
            .filter(profiles::submitted_by_id.eq(user_id))
            .order(profiles::created_at.desc())
            .select(Profile::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(profile)
    }

    fn find_approved_profile_by_owner(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let profile = profiles::table
            .filter(profiles::submitted_by_id.eq(user_id))
            .filter(profiles::status.eq(ProfileStatus::Approved))
            .select(Profile::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(profile)
    }

    fn list_approved_profiles(&self, filter: &ProfileFilter, today: NaiveDate) -> AppResult<Vec<Profile>> {
        let mut conn = self.conn()?;
        let mut query = profiles::table
            .filter(profiles::status.eq(ProfileStatus::Approved))
            .order(profiles::created_at.desc())
            .select(Profile::as_select())
            .into_boxed();

        if let Some(gender) = filter.gender {
            query = query.filter(profiles::gender.eq(gender));
        }
        if let Some(latest) = filter.born_on_or_before(today) {
            query = query.filter(profiles::date_of_birth.le(latest));
        }
        if let Some(earliest) = filter.born_after(today) {
            query = query.filter(profiles::date_of_birth.gt(earliest));
        }
        if let Some(education) = &filter.education {
            query = query.filter(profiles::education_degree.ilike(like_pattern(education)));
        }
        if let Some(country) = &filter.country {
            let pattern = like_pattern(country);
            query = query.filter(
                profiles::current_residence
                    .ilike(pattern.clone())
                    .or(profiles::citizenship.ilike(pattern)),
            );
        }
        if let Some(status) = filter.immigration_status {
            query = query.filter(profiles::immigration_status.eq(status));
        }
        if let Some(practice) = filter.religious_practice {
            query = query.filter(profiles::religious_practice.eq(practice));
        }
        if let Some(marital) = filter.marital_status {
            query = query.filter(profiles::marital_status.eq(marital));
        }

        Ok(query.load(&mut conn)?)
    }

    fn list_pending_profiles(&self) -> AppResult<Vec<PendingProfile>> {
        let mut conn = self.conn()?;
        let rows = profiles::table
            .inner_join(users::table)
            .filter(profiles::status.eq(ProfileStatus::Pending))
            .order(profiles::created_at.asc())
            .select((Profile::as_select(), (users::id, users::email, users::created_at)))
            .load::<(Profile, (Uuid, String, DateTime<Utc>))>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(profile, (id, email, created_at))| PendingProfile {
                profile,
                submitted_by: Submitter { id, email, created_at },
            })
            .collect())
    }

    fn resubmit_profile(&self, id: Uuid, fields: ProfileFields) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let profile = diesel::update(
            profiles::table
                .filter(profiles::id.eq(id))
                .filter(profiles::status.ne(ProfileStatus::Withdrawn)),
        )
        .set((
            &fields,
            profiles::status.eq(ProfileStatus::Pending),
            profiles::rejection_reason.eq(None::<String>),
            profiles::published_at.eq(None::<DateTime<Utc>>),
            profiles::updated_at.eq(Utc::now()),
        ))
        .returning(Profile::as_returning())
        .get_result(&mut conn)
        .optional()?;
        Ok(profile)
    }

    fn withdraw_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let profile = diesel::update(profiles::table.find(id))
            .set((
                profiles::status.eq(ProfileStatus::Withdrawn),
                profiles::updated_at.eq(Utc::now()),
            ))
            .returning(Profile::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(profile)
    }

    fn approve_pending_profile(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let profile = diesel::update(
            profiles::table
                .filter(profiles::id.eq(id))
                .filter(profiles::status.eq(ProfileStatus::Pending)),
        )
        .set((
            profiles::status.eq(ProfileStatus::Approved),
            profiles::published_at.eq(Some(at)),
            profiles::updated_at.eq(at),
        ))
        .returning(Profile::as_returning())
        .get_result(&mut conn)
        .optional()?;
        Ok(profile)
    }

    fn reject_pending_profile(&self, id: Uuid, reason: &str) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let profile = diesel::update(
            profiles::table
                .filter(profiles::id.eq(id))
                .filter(profiles::status.eq(ProfileStatus::Pending)),
        )
        .set((
            profiles::status.eq(ProfileStatus::Rejected),
            profiles::rejection_reason.eq(Some(reason)),
            profiles::updated_at.eq(Utc::now()),
        ))
        .returning(Profile::as_returning())
        .get_result(&mut conn)
        .optional()?;
        Ok(profile)
    }

    fn insert_interest(&self, interest: NewInterest) -> AppResult<Interest> {
        let mut conn = self.conn()?;
        let interest = diesel::insert_into(interests::table)
            .values(&interest)
            .returning(Interest::as_returning())
            .get_result(&mut conn)?;
        Ok(interest)
    }

    fn find_interest(&self, id: Uuid) -> AppResult<Option<Interest>> {
        let mut conn = self.conn()?;
        let interest = interests::table
            .find(id)
            .select(Interest::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(interest)
    }

    fn find_active_interest(&self, user_id: Uuid, profile_id: Uuid) -> AppResult<Option<Interest>> {
        let mut conn = self.conn()?;
        let interest = interests::table
            .filter(interests::interested_user_id.eq(user_id))
            .filter(interests::target_profile_id.eq(profile_id))
            .filter(interests::is_active.eq(true))
            .select(Interest::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(interest)
    }

    fn deactivate_interest(&self, id: Uuid) -> AppResult<Option<Interest>> {
        let mut conn = self.conn()?;
        let interest = diesel::update(interests::table.find(id))
            .set((
                interests::is_active.eq(false),
                interests::updated_at.eq(Utc::now()),
            ))
            .returning(Interest::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(interest)
    }

    fn list_active_interests_by(&self, user_id: Uuid) -> AppResult<Vec<(Interest, Profile)>> {
        let mut conn = self.conn()?;
        let rows = interests::table
            .inner_join(profiles::table)
            .filter(interests::interested_user_id.eq(user_id))
            .filter(interests::is_active.eq(true))
            .order(interests::created_at.desc())
            .select((Interest::as_select(), Profile::as_select()))
            .load::<(Interest, Profile)>(&mut conn)?;
        Ok(rows)
    }

    fn list_active_interests_in(&self, profile_id: Uuid) -> AppResult<Vec<(Interest, User)>> {
        let mut conn = self.conn()?;
        let rows = interests::table
            .inner_join(users::table)
            .filter(interests::target_profile_id.eq(profile_id))
            .filter(interests::is_active.eq(true))
            .order(interests::created_at.desc())
            .select((Interest::as_select(), User::as_select()))
            .load::<(Interest, User)>(&mut conn)?;
        Ok(rows)
    }

    fn insert_admin_action(&self, action: NewAdminAction) -> AppResult<AdminAction> {
        let mut conn = self.conn()?;
        let action = diesel::insert_into(admin_actions::table)
            .values(&action)
            .returning(AdminAction::as_returning())
            .get_result(&mut conn)?;
        Ok(action)
    }

    fn list_admin_actions(&self, limit: i64) -> AppResult<Vec<AdminActionEntry>> {
        let mut conn = self.conn()?;
        let rows = admin_actions::table
            .inner_join(users::table)
            .left_join(profiles::table)
            .order(admin_actions::created_at.desc())
            .limit(limit)
            .select((
                AdminAction::as_select(),
                (users::id, users::email),
                (profiles::id, profiles::name).nullable(),
            ))
            .load::<(AdminAction, (Uuid, String), Option<(Uuid, String)>)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(action, (admin_id, admin_email), profile)| AdminActionEntry {
                action,
                admin: UserIdentity { id: admin_id, email: admin_email },
                profile: profile.map(|(id, name)| ProfileRef { id, name }),
            })
            .collect())
    }

    fn count_users(&self) -> AppResult<i64> {
        let mut conn = self.conn()?;
        Ok(users::table.count().get_result(&mut conn)?)
    }

    fn count_profiles(&self, status: Option<ProfileStatus>) -> AppResult<i64> {
        let mut conn = self.conn()?;
        let count = match status {
            Some(status) => profiles::table
                .filter(profiles::status.eq(status))
                .count()
                .get_result(&mut conn)?,
            None => profiles::table.count().get_result(&mut conn)?,
        };
        Ok(count)
    }

    fn count_active_interests(&self) -> AppResult<i64> {
        let mut conn = self.conn()?;
        Ok(interests::table
            .filter(interests::is_active.eq(true))
            .count()
            .get_result(&mut conn)?)
    }

    fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("canada"), "%canada%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
