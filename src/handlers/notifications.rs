use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{error::AppResult, AppState};

pub async fn list_notifications(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let center = state.notifications.read().await;
    let entries = center.list();
    let unread = center.unread_count();
    let count = entries.len();
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": entries,
            "count": count,
            "unread": unread,
        })),
    ))
}

// ── On-demand sweep ───────────────────────────────────────────────────────────

pub async fn check_now(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let raised = crate::run_reorder_sweep(&state).await?;
    info!(raised, "Ran on-demand reorder check");
    let center = state.notifications.read().await;
    let entries = center.list();
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "raised": raised,
            "data": entries,
        })),
    ))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    state.notifications.write().await.mark_read(id)?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "read": true, "id": id })),
    ))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    state.notifications.write().await.mark_all_read()?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "read": true }))))
}

pub async fn dismiss(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    state.notifications.write().await.dismiss(id)?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "dismissed": true, "id": id })),
    ))
}

pub async fn dismiss_all(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    state.notifications.write().await.dismiss_all()?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "dismissed": true })),
    ))
}
