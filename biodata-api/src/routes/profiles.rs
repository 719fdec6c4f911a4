use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use biodata_shared::errors::AppResult;
use biodata_shared::types::ApiResponse;
use biodata_shared::{AppJson, AppPath, AppQuery};

use crate::extractors::{AuthUser, RolePolicy};
use crate::models::{Profile, ProfileFilter};
use crate::services::profile_service;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_profiles).post(create_profile))
        .route("/my", get(my_profile))
        .route("/:id", get(get_profile).put(update_profile).delete(withdraw_profile))
}

pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    AppQuery(filter): AppQuery<ProfileFilter>,
) -> AppResult<Json<ApiResponse<Vec<Profile>>>> {
    let profiles = profile_service::list_approved(state.store.as_ref(), &filter, Utc::now().date_naive())?;
    Ok(Json(ApiResponse::ok(profiles)))
}

pub async fn create_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<Value>,
) -> AppResult<(StatusCode, Json<ApiResponse<Profile>>)> {
    RolePolicy::AdminOrParent.check(&user)?;
    let profile = profile_service::create_profile(state.store.as_ref(), user.id, &body, Utc::now().date_naive())?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            profile,
            "Profile created successfully and submitted for review",
        )),
    ))
}

pub async fn my_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Option<Profile>>>> {
    let profile = profile_service::get_own(state.store.as_ref(), user.id)?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = profile_service::get_public(state.store.as_ref(), id)?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<Value>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    RolePolicy::AdminOrParent.check(&user)?;
    let profile = profile_service::update_profile(state.store.as_ref(), id, user.id, &body, Utc::now().date_naive())?;
    Ok(Json(ApiResponse::ok_with_message(
        profile,
        "Profile updated successfully and resubmitted for review",
    )))
}

pub async fn withdraw_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = profile_service::withdraw_profile(state.store.as_ref(), id, user.id)?;
    Ok(Json(ApiResponse::ok_with_message(profile, "Profile withdrawn successfully")))
}
