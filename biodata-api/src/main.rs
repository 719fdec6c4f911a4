use axum::routing::get;
use std::sync::Arc;

use biodata_api::config::AppConfig;
use biodata_api::services::seed;
use biodata_api::store::PgStore;
use biodata_api::{build_router, AppState};
use biodata_shared::clients::db::create_pool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    biodata_shared::middleware::init_tracing("biodata-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = create_pool(&config.database_url, config.db_pool_size, config.store_timeout())?;
    let store = Arc::new(PgStore::new(pool));

    seed::ensure_admin(store.as_ref(), &config)?;

    let metrics_handle = biodata_shared::middleware::init_metrics()?;

    let state = Arc::new(AppState::new(store, config));
    let app = build_router(state)?
        .route("/metrics", get(move || std::future::ready(metrics_handle.render())));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "biodata-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
