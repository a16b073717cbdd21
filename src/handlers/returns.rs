use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{InspectReturn, LogFilter, RegisterReturn, RepairDecision, ReturnFilter},
    AppState,
};

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_returns(
    State(state): State<AppState>,
    Query(filter): Query<ReturnFilter>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let page = state.records.list_returns(&filter).await?;
    let elapsed = start.elapsed();
    let count = page.items.len();

    info!(
        count,
        total = page.total,
        elapsed_ms = elapsed.as_millis(),
        "Listed returns"
    );

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": page,
            "count": count,
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── In-repair queue ───────────────────────────────────────────────────────────

pub async fn list_in_repair(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let returns = state.records.list_in_repair().await?;
    let count = returns.len();
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": returns,
            "count": count,
        })),
    ))
}

// ── Audit log ─────────────────────────────────────────────────────────────────

pub async fn list_log(
    State(state): State<AppState>,
    Query(filter): Query<LogFilter>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let page = state.records.list_log(&filter).await?;
    let elapsed = start.elapsed();
    let count = page.items.len();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": page,
            "count": count,
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let order = state.records.get_return(id).await?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "data": order }))))
}

// ── Register ──────────────────────────────────────────────────────────────────

pub async fn register_return(
    State(state): State<AppState>,
    Json(payload): Json<RegisterReturn>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let order = state.records.register_return(payload).await?;
    info!(
        id = %order.id,
        code = %order.code,
        items = order.items.len(),
        "Registered return"
    );
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": order })),
    ))
}

// ── Inspection ────────────────────────────────────────────────────────────────

pub async fn inspect_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InspectReturn>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let order = state.records.inspect(id, payload).await?;
    info!(
        id = %id,
        code = %order.code,
        state = ?order.state,
        "Processed return inspection"
    );
    Ok((StatusCode::OK, Json(serde_json::json!({ "data": order }))))
}

// ── Repair decision ───────────────────────────────────────────────────────────

pub async fn decide_repair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RepairDecision>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let order = state.records.complete_repair(id, payload).await?;
    info!(
        id = %id,
        code = %order.code,
        state = ?order.state,
        "Resolved repair"
    );
    Ok((StatusCode::OK, Json(serde_json::json!({ "data": order }))))
}
