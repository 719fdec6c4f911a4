use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use biodata_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Interest, InterestWithProfile, InterestWithUser, NewInterest, Profile, ProfileStatus, UserIdentity};
use crate::store::Store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressInterestRequest {
    pub profile_id: Uuid,
    pub notes: Option<String>,
}

fn approved_profile_of(store: &dyn Store, user_id: Uuid) -> AppResult<Profile> {
    store
        .find_approved_profile_by_owner(user_id)?
        .ok_or_else(|| AppError::new(ErrorCode::NoApprovedProfile, "No approved profile found"))
}

pub fn express_interest(store: &dyn Store, user_id: Uuid, req: ExpressInterestRequest) -> AppResult<Interest> {
    let profile = store
        .find_profile(req.profile_id)?
        .filter(|p| p.status == ProfileStatus::Approved)
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "Profile not found or not approved"))?;

    if profile.is_owned_by(user_id) {
        return Err(AppError::new(
            ErrorCode::CannotExpressInterestInOwnProfile,
            "Cannot express interest in your own profile",
        ));
    }

    let duplicate = "Interest already expressed for this profile";
    if store.find_active_interest(user_id, profile.id)?.is_some() {
        return Err(AppError::new(ErrorCode::InterestAlreadyExists, duplicate));
    }

    let notes = req.notes.filter(|n| !n.trim().is_empty());
    let interest = store
        .insert_interest(NewInterest {
            interested_user_id: user_id,
            target_profile_id: profile.id,
            notes,
        })
        .map_err(|e| e.on_unique_violation(ErrorCode::InterestAlreadyExists, duplicate))?;

    tracing::info!(interest_id = %interest.id, user_id = %user_id, profile_id = %profile.id, "interest expressed");
    Ok(interest)
}

/// Soft-deletes the interest; the row stays with `is_active = false`.
pub fn withdraw_interest(store: &dyn Store, id: Uuid, user_id: Uuid) -> AppResult<Interest> {
    let not_found = || AppError::new(ErrorCode::InterestNotFound, "Interest not found");

    let interest = store.find_interest(id)?.ok_or_else(not_found)?;
    if interest.interested_user_id != user_id {
        return Err(AppError::new(ErrorCode::NotInterestOwner, "Not authorized to withdraw this interest"));
    }

    let interest = store.deactivate_interest(id)?.ok_or_else(not_found)?;
    tracing::info!(interest_id = %interest.id, user_id = %user_id, "interest withdrawn");
    Ok(interest)
}

pub fn list_mine(store: &dyn Store, user_id: Uuid, today: NaiveDate) -> AppResult<Vec<InterestWithProfile>> {
    Ok(store
        .list_active_interests_by(user_id)?
        .into_iter()
        .map(|(interest, profile)| InterestWithProfile {
            interest,
            profile: profile.summary(today),
        })
        .collect())
}

pub fn list_received(store: &dyn Store, user_id: Uuid) -> AppResult<Vec<InterestWithUser>> {
    let own = approved_profile_of(store, user_id)?;
    Ok(store
        .list_active_interests_in(own.id)?
        .into_iter()
        .map(|(interest, user)| InterestWithUser {
            interest,
            interested_user: UserIdentity { id: user.id, email: user.email },
        })
        .collect())
}

/// Interests the caller expressed whose target's owner has an active interest
/// in the caller's approved profile.
pub fn list_mutual(store: &dyn Store, user_id: Uuid, today: NaiveDate) -> AppResult<Vec<InterestWithProfile>> {
    let own = approved_profile_of(store, user_id)?;

    let mut mutual = Vec::new();
    for (interest, target) in store.list_active_interests_by(user_id)? {
        if store.find_active_interest(target.submitted_by_id, own.id)?.is_some() {
            mutual.push(InterestWithProfile {
                interest,
                profile: target.summary(today),
            });
        }
    }
    Ok(mutual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::services::profile_service::create_profile;
    use crate::store::MemoryStore;
    use crate::validation::example_biodata;
    use biodata_shared::types::UserRole;
    use chrono::Utc;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn approved_profile(store: &MemoryStore, owner: Uuid) -> Profile {
        let profile = create_profile(store, owner, &example_biodata(), today()).unwrap();
        store.approve_pending_profile(profile.id, Utc::now()).unwrap().unwrap()
    }

    fn express(store: &MemoryStore, user: Uuid, profile: Uuid) -> AppResult<Interest> {
        express_interest(store, user, ExpressInterestRequest { profile_id: profile, notes: None })
    }

    #[test]
    fn express_requires_an_approved_foreign_profile() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let pending = create_profile(&store, alice, &example_biodata(), today()).unwrap();

        let err = express(&store, bob, pending.id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProfileNotFound);

        let approved = store.approve_pending_profile(pending.id, Utc::now()).unwrap().unwrap();
        let err = express(&store, alice, approved.id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotExpressInterestInOwnProfile);

        let interest = express(&store, bob, approved.id).unwrap();
        assert!(interest.is_active);
    }

    #[test]
    fn duplicate_active_interest_is_a_conflict() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let profile = approved_profile(&store, alice);

        let first = express(&store, bob, profile.id).unwrap();
        let err = express(&store, bob, profile.id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InterestAlreadyExists);

        withdraw_interest(&store, first.id, bob).unwrap();
        assert!(express(&store, bob, profile.id).is_ok());
    }

    #[test]
    fn withdraw_is_soft_and_owner_only() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let profile = approved_profile(&store, alice);
        let interest = express(&store, bob, profile.id).unwrap();

        let err = withdraw_interest(&store, interest.id, alice).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotInterestOwner);
        let err = withdraw_interest(&store, Uuid::now_v7(), bob).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InterestNotFound);

        let withdrawn = withdraw_interest(&store, interest.id, bob).unwrap();
        assert!(!withdrawn.is_active);
        assert!(store.find_interest(interest.id).unwrap().is_some());
        assert!(list_mine(&store, bob, today()).unwrap().is_empty());
    }

    #[test]
    fn received_needs_an_approved_profile() {
        let store = MemoryStore::new();
        let alice = Uuid::now_v7();
        let bob = store
            .insert_user(NewUser {
                email: "bob@example.com".into(),
                password_hash: "x".into(),
                role: UserRole::ParentRelative,
            })
            .unwrap();

        let err = list_received(&store, alice).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoApprovedProfile);
        assert_eq!(err.to_string(), "No approved profile found");

        let profile = approved_profile(&store, alice);
        express(&store, bob.id, profile.id).unwrap();
        let received = list_received(&store, alice).unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].interested_user.email, "bob@example.com");
    }

    #[test]
    fn mutual_requires_reverse_interest_from_target_owner() {
        let store = MemoryStore::new();
        let (alice, bob, carol) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let alice_profile = approved_profile(&store, alice);
        let bob_profile = approved_profile(&store, bob);
        let carol_profile = approved_profile(&store, carol);

        // Alice likes Bob and Carol; only Carol likes Alice back.
        express(&store, alice, bob_profile.id).unwrap();
        express(&store, alice, carol_profile.id).unwrap();
        express(&store, carol, alice_profile.id).unwrap();

        let mutual = list_mutual(&store, alice, today()).unwrap();
        assert_eq!(mutual.len(), 1);
        assert_eq!(mutual[0].profile.id, carol_profile.id);

        let bob_mutual = list_mutual(&store, bob, today()).unwrap();
        assert!(bob_mutual.is_empty());
    }
}
