pub mod categories;
pub mod materials;
pub mod notifications;
pub mod returns;
pub mod units;

use axum::extract::State;
use axum::{http::StatusCode, Json};
use serde_json::json;
use tracing::info;

use crate::error::AppResult;
use crate::{seed, AppState};

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "warehouse-service" })),
    )
}

// ── POST /api/seed ───────────────────────────────────────────────────────────

pub async fn seed_demo(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let materials = seed::seed_demo_data(state.catalog.as_ref(), state.records.as_ref()).await?;
    info!(materials, "Seeded demo data on request");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "seeded": true, "materials": materials })),
    ))
}
