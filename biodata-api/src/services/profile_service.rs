use chrono::NaiveDate;
use serde_json::Value;
use uuid::Uuid;

use biodata_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewProfile, Profile, ProfileFilter, ProfileStatus};
use crate::store::Store;
use crate::validation::validate_biodata;

/// Largest age accepted by the listing filters.
const MAX_FILTER_AGE: u32 = 120;

fn not_found() -> AppError {
    AppError::new(ErrorCode::ProfileNotFound, "Profile not found")
}

fn withdrawn() -> AppError {
    AppError::new(ErrorCode::ProfileWithdrawn, "Profile has been withdrawn")
}

/// Validates the biodata and files it as a PENDING profile. A user holds at
/// most one profile that is not withdrawn.
pub fn create_profile(store: &dyn Store, user_id: Uuid, body: &Value, today: NaiveDate) -> AppResult<Profile> {
    let fields = validate_biodata(body, today)?;

    let already = || AppError::new(ErrorCode::ProfileAlreadyExists, "User already has a profile");
    let live = store
        .find_latest_profile_by_owner(user_id)?
        .filter(|p| p.status != ProfileStatus::Withdrawn);
    if live.is_some() {
        return Err(already());
    }

    let profile = store
        .insert_profile(NewProfile {
            submitted_by_id: user_id,
            status: ProfileStatus::Pending,
            fields,
        })
        .map_err(|e| e.on_unique_violation(ErrorCode::ProfileAlreadyExists, "User already has a profile"))?;

    tracing::info!(profile_id = %profile.id, user_id = %user_id, "profile submitted for review");
    Ok(profile)
}

pub fn list_approved(store: &dyn Store, filter: &ProfileFilter, today: NaiveDate) -> AppResult<Vec<Profile>> {
    if filter.min_age.max(filter.max_age).is_some_and(|age| age > MAX_FILTER_AGE) {
        return Err(AppError::validation(format!("Age filters must be at most {MAX_FILTER_AGE}")));
    }
    if let (Some(min), Some(max)) = (filter.min_age, filter.max_age) {
        if min > max {
            return Err(AppError::validation("minAge cannot be greater than maxAge"));
        }
    }
    store.list_approved_profiles(filter, today)
}

/// Anyone may read an APPROVED profile; every other status reads as absent.
pub fn get_public(store: &dyn Store, id: Uuid) -> AppResult<Profile> {
    store
        .find_profile(id)?
        .filter(|p| p.status == ProfileStatus::Approved)
        .ok_or_else(not_found)
}

pub fn get_own(store: &dyn Store, user_id: Uuid) -> AppResult<Option<Profile>> {
    store.find_latest_profile_by_owner(user_id)
}

/// Replaces the biodata and sends the profile back to review.
pub fn update_profile(
    store: &dyn Store,
    id: Uuid,
    user_id: Uuid,
    body: &Value,
    today: NaiveDate,
) -> AppResult<Profile> {
    let fields = validate_biodata(body, today)?;

    let existing = store.find_profile(id)?.ok_or_else(not_found)?;
    if !existing.is_owned_by(user_id) {
        return Err(AppError::new(ErrorCode::NotProfileOwner, "Not authorized to update this profile"));
    }
    if existing.status == ProfileStatus::Withdrawn {
        return Err(withdrawn());
    }

    match store.resubmit_profile(id, fields)? {
        Some(profile) => {
            tracing::info!(
                profile_id = %profile.id,
                user_id = %user_id,
                previous_status = %existing.status,
                "profile updated and resubmitted for review"
            );
            Ok(profile)
        }
        // Withdrawn between the read and the write.
        None => match store.find_profile(id)? {
            Some(_) => Err(withdrawn()),
            None => Err(not_found()),
        },
    }
}

/// Withdrawal is terminal; withdrawing again returns the profile unchanged.
pub fn withdraw_profile(store: &dyn Store, id: Uuid, user_id: Uuid) -> AppResult<Profile> {
    let existing = store.find_profile(id)?.ok_or_else(not_found)?;
    if !existing.is_owned_by(user_id) {
        return Err(AppError::new(ErrorCode::NotProfileOwner, "Not authorized to delete this profile"));
    }
    if existing.status == ProfileStatus::Withdrawn {
        return Ok(existing);
    }

    let profile = store.withdraw_profile(id)?.ok_or_else(not_found)?;
    tracing::info!(profile_id = %profile.id, user_id = %user_id, "profile withdrawn");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::store::MemoryStore;
    use crate::validation::example_biodata;
    use chrono::Utc;
    use serde_json::json;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn approve(store: &MemoryStore, id: Uuid) -> Profile {
        store.approve_pending_profile(id, Utc::now()).unwrap().unwrap()
    }

    #[test]
    fn second_live_profile_is_a_conflict() {
        let store = MemoryStore::new();
        let user = Uuid::now_v7();
        let first = create_profile(&store, user, &example_biodata(), today()).unwrap();
        assert_eq!(first.status, ProfileStatus::Pending);
        assert_eq!(first.submitted_by_id, user);

        let err = create_profile(&store, user, &example_biodata(), today()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileAlreadyExists);
        assert_eq!(err.to_string(), "User already has a profile");

        withdraw_profile(&store, first.id, user).unwrap();
        let second = create_profile(&store, user, &example_biodata(), today()).unwrap();
        assert_eq!(get_own(&store, user).unwrap().unwrap().id, second.id);
    }

    #[test]
    fn invalid_biodata_is_rejected_before_any_write() {
        let store = MemoryStore::new();
        let mut body = example_biodata();
        body["name"] = json!("X");
        let err = create_profile(&store, Uuid::now_v7(), &body, today()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(store.count_profiles(None).unwrap(), 0);
    }

    #[test]
    fn only_approved_profiles_are_public() {
        let store = MemoryStore::new();
        let owner = Uuid::now_v7();
        let profile = create_profile(&store, owner, &example_biodata(), today()).unwrap();

        assert_eq!(get_public(&store, profile.id).unwrap_err().code(), ErrorCode::ProfileNotFound);
        approve(&store, profile.id);
        assert_eq!(get_public(&store, profile.id).unwrap().id, profile.id);

        withdraw_profile(&store, profile.id, owner).unwrap();
        assert_eq!(get_public(&store, profile.id).unwrap_err().code(), ErrorCode::ProfileNotFound);

        let other = Uuid::now_v7();
        let rejected = create_profile(&store, other, &example_biodata(), today()).unwrap();
        store.reject_pending_profile(rejected.id, "Incomplete").unwrap().unwrap();
        assert_eq!(get_public(&store, rejected.id).unwrap_err().code(), ErrorCode::ProfileNotFound);
    }

    #[test]
    fn update_resets_review_state() {
        let store = MemoryStore::new();
        let owner = Uuid::now_v7();
        let profile = create_profile(&store, owner, &example_biodata(), today()).unwrap();
        let approved = approve(&store, profile.id);
        assert!(approved.published_at.is_some());

        let mut body = example_biodata();
        body["gender"] = json!("FEMALE");
        let updated = update_profile(&store, profile.id, owner, &body, today()).unwrap();
        assert_eq!(updated.status, ProfileStatus::Pending);
        assert_eq!(updated.published_at, None);
        assert_eq!(updated.fields.gender, Gender::Female);

        store.reject_pending_profile(profile.id, "Incomplete").unwrap().unwrap();
        let updated = update_profile(&store, profile.id, owner, &example_biodata(), today()).unwrap();
        assert_eq!(updated.status, ProfileStatus::Pending);
        assert_eq!(updated.rejection_reason, None);
    }

    #[test]
    fn only_the_owner_may_change_a_profile() {
        let store = MemoryStore::new();
        let owner = Uuid::now_v7();
        let stranger = Uuid::now_v7();
        let profile = create_profile(&store, owner, &example_biodata(), today()).unwrap();

        let err = update_profile(&store, profile.id, stranger, &example_biodata(), today()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotProfileOwner);
        let err = withdraw_profile(&store, profile.id, stranger).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotProfileOwner);

        let err = update_profile(&store, Uuid::now_v7(), owner, &example_biodata(), today()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileNotFound);
    }

    #[test]
    fn withdrawal_is_terminal_and_idempotent() {
        let store = MemoryStore::new();
        let owner = Uuid::now_v7();
        let profile = create_profile(&store, owner, &example_biodata(), today()).unwrap();

        let first = withdraw_profile(&store, profile.id, owner).unwrap();
        let second = withdraw_profile(&store, profile.id, owner).unwrap();
        assert_eq!(first.status, ProfileStatus::Withdrawn);
        assert_eq!(second.status, ProfileStatus::Withdrawn);
        assert_eq!(first.updated_at, second.updated_at);

        let err = update_profile(&store, profile.id, owner, &example_biodata(), today()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileWithdrawn);
        assert_eq!(err.to_string(), "Profile has been withdrawn");
    }

    #[test]
    fn listing_applies_filters() {
        let store = MemoryStore::new();
        let mut female = example_biodata();
        female["gender"] = json!("FEMALE");
        female["currentResidence"] = json!("Toronto, Canada");

        let a = create_profile(&store, Uuid::now_v7(), &example_biodata(), today()).unwrap();
        let b = create_profile(&store, Uuid::now_v7(), &female, today()).unwrap();
        let pending = create_profile(&store, Uuid::now_v7(), &female, today()).unwrap();
        approve(&store, a.id);
        approve(&store, b.id);

        let all = list_approved(&store, &ProfileFilter::default(), today()).unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert!(!ids.contains(&pending.id));

        let filter = ProfileFilter {
            gender: Some(Gender::Female),
            country: Some("canada".into()),
            ..Default::default()
        };
        let matched = list_approved(&store, &filter, today()).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, b.id);

        let too_old = ProfileFilter { min_age: Some(90), ..Default::default() };
        assert!(list_approved(&store, &too_old, today()).unwrap().is_empty());

        let inverted = ProfileFilter { min_age: Some(40), max_age: Some(30), ..Default::default() };
        assert_eq!(list_approved(&store, &inverted, today()).unwrap_err().code(), ErrorCode::ValidationError);
    }

    #[test]
    fn age_filters_are_capped() {
        let store = MemoryStore::new();
        let huge = ProfileFilter { max_age: Some(100_000), ..Default::default() };
        let err = list_approved(&store, &huge, today()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let huge_min = ProfileFilter { min_age: Some(u32::MAX), ..Default::default() };
        assert!(list_approved(&store, &huge_min, today()).is_err());

        let widest = ProfileFilter { min_age: Some(0), max_age: Some(120), ..Default::default() };
        assert!(list_approved(&store, &widest, today()).unwrap().is_empty());
    }
}
