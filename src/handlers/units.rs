use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CreateUnit, UpdateUnit},
    AppState,
};

pub async fn list_units(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let units = state.catalog.list_units().await?;
    let count = units.len();
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": units,
            "count": count,
        })),
    ))
}

pub async fn create_unit(
    State(state): State<AppState>,
    Json(payload): Json<CreateUnit>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let unit = state.catalog.create_unit(payload).await?;
    info!(id = %unit.id, symbol = %unit.symbol, "Created unit");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": unit })),
    ))
}

pub async fn update_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUnit>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let unit = state.catalog.update_unit(id, payload).await?;
    info!(id = %id, "Updated unit");
    Ok((StatusCode::OK, Json(serde_json::json!({ "data": unit }))))
}

pub async fn delete_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    state.catalog.delete_unit(id).await?;
    info!(id = %id, "Deleted unit");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "deleted": true, "id": id })),
    ))
}
