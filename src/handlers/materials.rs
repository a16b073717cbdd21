use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CreateMaterial, MaterialFilter, ReorderConfig, UpdateMaterial},
    AppState,
};

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_materials(
    State(state): State<AppState>,
    Query(filter): Query<MaterialFilter>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let page = state.catalog.list_materials(&filter).await?;
    let elapsed = start.elapsed();
    let count = page.items.len();

    info!(
        count,
        total = page.total,
        elapsed_ms = elapsed.as_millis(),
        "Listed materials"
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

// ── CSV export ────────────────────────────────────────────────────────────────

pub async fn export_materials(
    State(state): State<AppState>,
    Query(filter): Query<MaterialFilter>,
) -> Result<Response, crate::error::AppError> {
    // Export ignores paging: walk every page matching the filter.
    let mut all = Vec::new();
    let mut page_no = 1;
    loop {
        let filter = MaterialFilter {
            page: Some(page_no),
            limit: Some(500),
            ..filter.clone()
        };
        let page = state.catalog.list_materials(&filter).await?;
        let done = page_no >= page.total_pages.max(1);
        all.extend(page.items);
        if done {
            break;
        }
        page_no += 1;
    }

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "code",
        "name",
        "category",
        "unit",
        "active",
        "stock_available",
        "stock_committed",
        "stock_total",
        "minimum_stock",
        "reorder_point",
    ])
    .map_err(anyhow::Error::from)?;

    for m in &all {
        wtr.write_record([
            m.code.clone(),
            m.name.clone(),
            m.category_name.clone(),
            m.base_unit_symbol.clone(),
            m.active.to_string(),
            m.stock_available.to_string(),
            m.stock_committed.to_string(),
            m.stock_total.to_string(),
            m.reorder_config
                .map(|c| c.minimum_stock.to_string())
                .unwrap_or_default(),
            m.reorder_config
                .map(|c| c.reorder_point.to_string())
                .unwrap_or_default(),
        ])
        .map_err(anyhow::Error::from)?;
    }

    let csv = String::from_utf8(wtr.into_inner().map_err(anyhow::Error::from)?)
        .map_err(anyhow::Error::from)?;

    info!(count = all.len(), "Exported materials CSV");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"materials.csv\"",
        )
        .body(axum::body::Body::from(csv))
        .map_err(|e| crate::error::AppError::Internal(anyhow::Error::from(e)))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let material = state.catalog.get_material(id).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "data": material })),
    ))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_material(
    State(state): State<AppState>,
    Json(payload): Json<CreateMaterial>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let material = state.catalog.create_material(payload).await?;
    info!(id = %material.id, code = %material.code, "Created material");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": material })),
    ))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaterial>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let material = state.catalog.update_material(id, payload).await?;
    info!(id = %id, "Updated material");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "data": material })),
    ))
}

// ── Activate / deactivate ─────────────────────────────────────────────────────

pub async fn activate_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let material = state.catalog.set_material_active(id, true).await?;
    info!(id = %id, "Activated material");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "data": material })),
    ))
}

pub async fn deactivate_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let material = state.catalog.set_material_active(id, false).await?;
    info!(id = %id, "Deactivated material");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "data": material })),
    ))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    state.catalog.delete_material(id).await?;
    info!(id = %id, "Deleted material");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "deleted": true, "id": id })),
    ))
}

// ── Reorder configuration ─────────────────────────────────────────────────────

pub async fn set_reorder_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReorderConfig>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let material = state.catalog.set_reorder_config(id, payload).await?;
    info!(
        id = %id,
        minimum_stock = payload.minimum_stock,
        reorder_point = payload.reorder_point,
        "Updated reorder configuration"
    );
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "data": material })),
    ))
}
