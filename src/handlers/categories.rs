use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CreateCategory, UpdateCategory},
    AppState,
};

pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let categories = state.catalog.list_categories().await?;
    let count = categories.len();
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": categories,
            "count": count,
        })),
    ))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let category = state.catalog.create_category(payload).await?;
    info!(id = %category.id, name = %category.name, "Created category");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": category })),
    ))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategory>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let category = state.catalog.update_category(id, payload).await?;
    info!(id = %id, "Updated category");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "data": category })),
    ))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    state.catalog.delete_category(id).await?;
    info!(id = %id, "Deleted category");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "deleted": true, "id": id })),
    ))
}
