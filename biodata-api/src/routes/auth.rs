use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use biodata_shared::errors::AppResult;
use biodata_shared::types::ApiResponse;
use biodata_shared::AppJson;

use crate::extractors::{AuthUser, CurrentUser};
use crate::models::User;
use crate::services::auth_service::{self, AuthSession, LoginRequest, RegisterRequest};
use crate::services::token_service;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthSession>>)> {
    let session = auth_service::register(state.store.as_ref(), &state.config, req)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            session,
            "Account created successfully. Please check your email to verify your account.",
        )),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthSession>>> {
    let session = auth_service::login(state.store.as_ref(), &state.config, req)?;
    Ok(Json(ApiResponse::ok_with_message(session, "Login successful")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RefreshRequest>,
) -> AppResult<Json<ApiResponse<AuthSession>>> {
    let (user, session) = token_service::rotate_session(state.store.as_ref(), &state.config, &req.refresh_token)?;
    Ok(Json(ApiResponse::ok(AuthSession { user, session })))
}

pub async fn logout(user: AuthUser, State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    auth_service::logout(state.store.as_ref(), user.id);
    Json(ApiResponse::message("Logged out successfully"))
}

pub async fn profile(CurrentUser(user): CurrentUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(user))
}
