use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use biodata_shared::errors::AppResult;
use biodata_shared::types::ApiResponse;
use biodata_shared::{AppJson, AppPath};

use crate::extractors::AuthUser;
use crate::models::{Interest, InterestWithProfile, InterestWithUser};
use crate::services::interest_service::{self, ExpressInterestRequest};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(express_interest))
        .route("/:id", delete(withdraw_interest))
        .route("/my", get(my_interests))
        .route("/received", get(received_interests))
        .route("/mutual", get(mutual_interests))
}

pub async fn express_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ExpressInterestRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Interest>>)> {
    let interest = interest_service::express_interest(state.store.as_ref(), user.id, req)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(interest, "Interest expressed successfully")),
    ))
}

pub async fn withdraw_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Interest>>> {
    let interest = interest_service::withdraw_interest(state.store.as_ref(), id, user.id)?;
    Ok(Json(ApiResponse::ok_with_message(interest, "Interest withdrawn successfully")))
}

pub async fn my_interests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<InterestWithProfile>>>> {
    let interests = interest_service::list_mine(state.store.as_ref(), user.id, Utc::now().date_naive())?;
    Ok(Json(ApiResponse::ok(interests)))
}

pub async fn received_interests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<InterestWithUser>>>> {
    let interests = interest_service::list_received(state.store.as_ref(), user.id)?;
    Ok(Json(ApiResponse::ok(interests)))
}

pub async fn mutual_interests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<InterestWithProfile>>>> {
    let interests = interest_service::list_mutual(state.store.as_ref(), user.id, Utc::now().date_naive())?;
    Ok(Json(ApiResponse::ok(interests)))
}
