pub mod config;
pub mod extractors;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use biodata_shared::errors::{AppError, ErrorCode};
use biodata_shared::middleware::metrics_middleware;

use config::AppConfig;
use store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self { store, config }
    }
}

/// Assembles the HTTP surface: `/health` plus everything under `/api`.
pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let origin: HeaderValue = state.config.frontend_url.parse()?;

    let api = Router::new()
        .nest("/auth", routes::auth::router())
        .nest("/profiles", routes::profiles::router())
        .nest("/interests", routes::interests::router())
        .nest("/admin", routes::admin::router());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .fallback(endpoint_not_found)
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(axum::middleware::map_response(timeout_envelope))
        .layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(AllowMethods::list([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ]))
                .allow_headers(AllowHeaders::list([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                ]))
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

async fn endpoint_not_found() -> AppError {
    AppError::new(ErrorCode::EndpointNotFound, "Endpoint not found")
}

/// `TimeoutLayer` answers 408 with an empty body; give it the error envelope.
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        AppError::new(ErrorCode::RequestTimeout, "Request timed out").into_response()
    } else {
        response
    }
}
