use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use biodata_shared::types::{ApiResponse, HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Liveness probe with a database round trip.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let database = match state.store.ping() {
        Ok(()) => HealthCheck {
            name: "database".to_string(),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            HealthCheck {
                name: "database".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some("database unreachable".to_string()),
            }
        }
    };

    let response = HealthResponse::healthy("biodata-api", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![database]);

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(ApiResponse::ok(response))).into_response()
}
