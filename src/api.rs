// src/api.rs
//! Read-side HTTP API: single-day article queries over the stored rows.
//! No business logic beyond SQL projection and the date filter.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::snapshot::{build_payload, NewsPayload};
use crate::store::ArticleStore;
use crate::window::DailyWindow;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ArticleStore>,
    pub timezone: Tz,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/by-date", get(by_date))
        .layer(cors)
        .with_state(state)
}

fn default_limit() -> i64 {
    20
}

#[derive(Deserialize)]
struct ByDateQuery {
    /// Calendar date in the reference timezone, `YYYY-MM-DD`.
    date: NaiveDate,
    #[serde(default = "default_limit")]
    limit: i64,
}

/// Articles whose `published_at`, viewed in the reference timezone, falls on
/// the requested date. Newest first.
async fn by_date(
    State(state): State<AppState>,
    Query(q): Query<ByDateQuery>,
) -> Result<Json<NewsPayload>, (StatusCode, Json<serde_json::Value>)> {
    let window = DailyWindow::for_date(state.timezone, q.date);
    let limit = q.limit.clamp(1, 200);

    match state.store.published_between(&window, limit).await {
        Ok(rows) => Ok(Json(build_payload(rows, state.timezone, Utc::now()))),
        Err(e) => {
            // Generic body only; details stay in the log.
            tracing::error!(error = ?e, date = %q.date, "by-date query failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "query failed" })),
            ))
        }
    }
}
