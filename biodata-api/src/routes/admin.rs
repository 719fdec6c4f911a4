use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use std::sync::Arc;
use uuid::Uuid;

use biodata_shared::errors::AppResult;
use biodata_shared::types::ApiResponse;
use biodata_shared::{AppJson, AppPath};

use crate::extractors::AdminUser;
use crate::models::{AdminActionEntry, PendingProfile, Profile, Stats, User, UserSummary};
use crate::services::admin_service::{self, ApproveRequest, RejectRequest, UpdateRoleRequest};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profiles/pending", get(pending_profiles))
        .route("/profiles/:id/approve", post(approve_profile))
        .route("/profiles/:id/reject", post(reject_profile))
        .route("/stats", get(stats))
        .route("/users", get(list_users))
        .route("/users/:id/role", patch(update_user_role))
        .route("/actions", get(admin_actions))
}

pub async fn pending_profiles(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<PendingProfile>>>> {
    let profiles = admin_service::pending_profiles(state.store.as_ref())?;
    Ok(Json(ApiResponse::ok(profiles)))
}

/// The body is optional; it only carries reviewer notes.
pub async fn approve_profile(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    body: Option<AppJson<ApproveRequest>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let req = body.map(|AppJson(req)| req).unwrap_or_default();
    let profile = admin_service::approve_profile(state.store.as_ref(), admin.id, id, req)?;
    Ok(Json(ApiResponse::ok_with_message(profile, "Profile approved successfully")))
}

pub async fn reject_profile(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<RejectRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = admin_service::reject_profile(state.store.as_ref(), admin.id, id, req)?;
    Ok(Json(ApiResponse::ok_with_message(profile, "Profile rejected successfully")))
}

pub async fn stats(_admin: AdminUser, State(state): State<Arc<AppState>>) -> AppResult<Json<ApiResponse<Stats>>> {
    let stats = admin_service::stats(state.store.as_ref())?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn list_users(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<UserSummary>>>> {
    let users = admin_service::list_users(state.store.as_ref())?;
    Ok(Json(ApiResponse::ok(users)))
}

pub async fn update_user_role(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = admin_service::update_user_role(state.store.as_ref(), admin.id, id, req)?;
    Ok(Json(ApiResponse::ok_with_message(user, "User role updated successfully")))
}

pub async fn admin_actions(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<AdminActionEntry>>>> {
    let actions = admin_service::recent_actions(state.store.as_ref())?;
    Ok(Json(ApiResponse::ok(actions)))
}
