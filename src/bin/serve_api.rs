//! Read-side API server: by-date article queries plus /health and /metrics.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use btcheck::api::{create_router, AppState};
use btcheck::metrics::Metrics;
use btcheck::store::ArticleStore;
use btcheck::config;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    btcheck::init_tracing();

    let database_url = config::read_side_database_url()?;
    let timezone = config::reference_timezone()?;

    // Lazy pool: the server comes up even if the database is briefly down;
    // queries report failures individually.
    let store = ArticleStore::connect_lazy(&database_url)?;
    let metrics = Metrics::init();

    let state = AppState {
        store: Arc::new(store),
        timezone,
    };
    let app = create_router(state).merge(metrics.router());

    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "api server listening");
    axum::serve(listener, app).await.context("serving api")?;
    Ok(())
}
