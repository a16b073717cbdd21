//! PostgreSQL store. Loads domain values, runs the disposition engine, and
//! persists the outcome inside one transaction per logical call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::disposition::{self, LogDraft};
use crate::error::{AppError, AppResult};
use crate::models::{
    Category, CreateCategory, CreateMaterial, CreateUnit, Destination, InspectReturn, ItemState,
    LogEntry, LogFilter, Material, MaterialFilter, Page, RegisterReturn, ReorderConfig,
    RepairDecision, ReturnFilter, ReturnItem, ReturnOrder, ReturnState, Unit, UpdateCategory,
    UpdateMaterial, UpdateUnit,
};
use crate::store::{Catalog, RecordStore};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ── Row types ────────────────────────────────────────────────────────────────

/// Flat materials row; the nested `ReorderConfig` is assembled from the three
/// nullable threshold columns.
#[derive(sqlx::FromRow)]
struct MaterialRow {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    category_id: Uuid,
    category_name: String,
    base_unit_id: Uuid,
    base_unit_symbol: String,
    active: bool,
    stock_available: i64,
    stock_committed: i64,
    minimum_stock: Option<i64>,
    reorder_point: Option<i64>,
    alert_enabled: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MaterialRow> for Material {
    fn from(r: MaterialRow) -> Self {
        let reorder_config = match (r.minimum_stock, r.reorder_point) {
            (Some(minimum_stock), Some(reorder_point)) => Some(ReorderConfig {
                minimum_stock,
                reorder_point,
                alert_enabled: r.alert_enabled.unwrap_or(true),
            }),
            _ => None,
        };
        Material {
            id: r.id,
            code: r.code,
            name: r.name,
            description: r.description,
            category_id: r.category_id,
            category_name: r.category_name,
            base_unit_id: r.base_unit_id,
            base_unit_symbol: r.base_unit_symbol,
            active: r.active,
            stock_available: r.stock_available,
            stock_committed: r.stock_committed,
            stock_total: r.stock_available + r.stock_committed,
            reorder_config,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReturnRow {
    id: Uuid,
    code: String,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_name: Option<String>,
    customer_document: Option<String>,
    general_reason: String,
    notes: Option<String>,
    state: ReturnState,
    disposition: Option<Destination>,
    inspector: Option<String>,
    inspection_notes: Option<String>,
    decided_by: Option<String>,
    decision_comment: Option<String>,
}

impl ReturnRow {
    fn into_order(self, items: Vec<ReturnItem>) -> ReturnOrder {
        ReturnOrder {
            id: self.id,
            code: self.code,
            registered_at: self.registered_at,
            updated_at: self.updated_at,
            customer_name: self.customer_name,
            customer_document: self.customer_document,
            general_reason: self.general_reason,
            notes: self.notes,
            state: self.state,
            disposition: self.disposition,
            inspector: self.inspector,
            inspection_notes: self.inspection_notes,
            decided_by: self.decided_by,
            decision_comment: self.decision_comment,
            items,
        }
    }
}

const MATERIAL_COLUMNS: &str = r#"
    m.id, m.code, m.name, m.description,
    m.category_id, c.name AS category_name,
    m.base_unit_id, u.symbol AS base_unit_symbol,
    m.active, m.stock_available, m.stock_committed,
    m.minimum_stock, m.reorder_point, m.alert_enabled,
    m.created_at, m.updated_at
"#;

const RETURN_COLUMNS: &str = r#"
    id, code, registered_at, updated_at, customer_name, customer_document,
    general_reason, notes, state, disposition, inspector, inspection_notes,
    decided_by, decision_comment
"#;

const ITEM_COLUMNS: &str = r#"
    id, material_id, material_code, material_name, quantity, reason, notes,
    condition, inspection_result, state, destination, inspected_at
"#;

impl PgStore {
    async fn fetch_material(&self, id: Uuid) -> AppResult<Material> {
        let row = sqlx::query_as::<_, MaterialRow>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM materials m
            JOIN categories c ON c.id = m.category_id
            JOIN units u ON u.id = m.base_unit_id
            WHERE m.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))?;
        Ok(row.into())
    }

    async fn fetch_order(&self, id: Uuid) -> AppResult<ReturnOrder> {
        let row = sqlx::query_as::<_, ReturnRow>(&format!(
            "SELECT {RETURN_COLUMNS} FROM return_orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Return {} not found", id)))?;

        let items = self.fetch_items(id).await?;
        Ok(row.into_order(items))
    }

    async fn fetch_items(&self, return_id: Uuid) -> AppResult<Vec<ReturnItem>> {
        Ok(sqlx::query_as::<_, ReturnItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM return_items WHERE return_id = $1 ORDER BY ordinal"
        ))
        .bind(return_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Write back every item row and the aggregate row of an order the
    /// engine just mutated, then append the drafted movements.
    async fn persist_disposition(
        &self,
        order: &ReturnOrder,
        drafts: Vec<LogDraft>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for item in &order.items {
            sqlx::query(
                r#"
                UPDATE return_items
                SET condition         = $1,
                    inspection_result = $2,
                    state             = $3,
                    destination       = $4,
                    inspected_at      = $5
                WHERE id = $6
                "#,
            )
            .bind(item.condition)
            .bind(item.inspection_result)
            .bind(item.state)
            .bind(item.destination)
            .bind(item.inspected_at)
            .bind(item.id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE return_orders
            SET state            = $1,
                disposition      = $2,
                inspector        = $3,
                inspection_notes = $4,
                decided_by       = $5,
                decision_comment = $6,
                updated_at       = $7
            WHERE id = $8
            "#,
        )
        .bind(order.state)
        .bind(order.disposition)
        .bind(&order.inspector)
        .bind(&order.inspection_notes)
        .bind(&order.decided_by)
        .bind(&order.decision_comment)
        .bind(order.updated_at)
        .bind(order.id)
        .execute(&mut *tx)
        .await?;

        for draft in &drafts {
            insert_draft(&mut tx, order, draft).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_draft(
    tx: &mut Transaction<'_, Postgres>,
    order: &ReturnOrder,
    draft: &LogDraft,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO return_logs
            (id, return_id, return_code, item_id, material_name, kind,
             quantity, description, acted_by, at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order.id)
    .bind(&order.code)
    .bind(draft.item_id)
    .bind(&draft.material_name)
    .bind(draft.kind)
    .bind(draft.quantity)
    .bind(&draft.description)
    .bind(&draft.user)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[async_trait]
impl Catalog for PgStore {
    async fn list_materials(&self, filter: &MaterialFilter) -> AppResult<Page<Material>> {
        let (page, limit) = crate::models::paging(filter.page, filter.limit);
        let offset = page.saturating_sub(1).saturating_mul(limit);

        let rows = sqlx::query_as::<_, MaterialRow>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM materials m
            JOIN categories c ON c.id = m.category_id
            JOIN units u ON u.id = m.base_unit_id
            WHERE ($1::uuid IS NULL OR m.category_id = $1)
              AND ($2::boolean IS NULL OR m.active = $2)
              AND ($3::text IS NULL OR m.code ILIKE '%' || $3 || '%'
                                    OR m.name ILIKE '%' || $3 || '%')
            ORDER BY m.created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filter.category)
        .bind(filter.active)
        .bind(filter.search.as_deref())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM materials m
            WHERE ($1::uuid IS NULL OR m.category_id = $1)
              AND ($2::boolean IS NULL OR m.active = $2)
              AND ($3::text IS NULL OR m.code ILIKE '%' || $3 || '%'
                                    OR m.name ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(filter.category)
        .bind(filter.active)
        .bind(filter.search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let items = rows.into_iter().map(Material::from).collect();
        Ok(Page::new(items, page, limit, total as u64))
    }

    async fn get_material(&self, id: Uuid) -> AppResult<Material> {
        self.fetch_material(id).await
    }

    async fn create_material(&self, req: CreateMaterial) -> AppResult<Material> {
        if req.code.trim().is_empty() {
            return Err(AppError::Validation("code must not be empty".to_string()));
        }
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM materials WHERE code = $1)")
                .bind(&req.code)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            return Err(AppError::Validation(format!(
                "material code {} already exists",
                req.code
            )));
        }

        let id = Uuid::new_v4();
        let cfg = req.reorder_config;
        let result = sqlx::query(
            r#"
            INSERT INTO materials
                (id, code, name, description, category_id, base_unit_id, active,
                 stock_available, stock_committed, minimum_stock, reorder_point,
                 alert_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id)
        .bind(&req.code)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.category_id)
        .bind(req.base_unit_id)
        .bind(req.active)
        .bind(req.stock_available)
        .bind(req.stock_committed)
        .bind(cfg.map(|c| c.minimum_stock))
        .bind(cfg.map(|c| c.reorder_point))
        .bind(cfg.map(|c| c.alert_enabled))
        .execute(&self.pool)
        .await;

        // Foreign-key violations here mean an unknown category or unit.
        result.map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::Validation("unknown category or unit reference".to_string())
            }
            _ => AppError::Database(e),
        })?;

        self.fetch_material(id).await
    }

    async fn update_material(&self, id: Uuid, req: UpdateMaterial) -> AppResult<Material> {
        let existing = self.fetch_material(id).await?;

        if let Some(code) = &req.code {
            let (taken,): (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM materials WHERE code = $1 AND id <> $2)",
            )
            .bind(code)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            if taken {
                return Err(AppError::Validation(format!(
                    "material code {} already exists",
                    code
                )));
            }
        }

        sqlx::query(
            r#"
            UPDATE materials
            SET code            = $1,
                name            = $2,
                description     = $3,
                category_id     = $4,
                base_unit_id    = $5,
                stock_available = $6,
                stock_committed = $7,
                updated_at      = NOW()
            WHERE id = $8
            "#,
        )
        .bind(req.code.as_deref().unwrap_or(&existing.code))
        .bind(req.name.as_deref().unwrap_or(&existing.name))
        .bind(req.description.as_deref().or(existing.description.as_deref()))
        .bind(req.category_id.unwrap_or(existing.category_id))
        .bind(req.base_unit_id.unwrap_or(existing.base_unit_id))
        .bind(req.stock_available.unwrap_or(existing.stock_available))
        .bind(req.stock_committed.unwrap_or(existing.stock_committed))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::Validation("unknown category or unit reference".to_string())
            }
            _ => AppError::Database(e),
        })?;

        self.fetch_material(id).await
    }

    async fn set_material_active(&self, id: Uuid, active: bool) -> AppResult<Material> {
        let result =
            sqlx::query("UPDATE materials SET active = $1, updated_at = NOW() WHERE id = $2")
                .bind(active)
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Material {} not found", id)));
        }
        self.fetch_material(id).await
    }

    async fn delete_material(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Material {} not found", id)));
        }
        Ok(())
    }

    async fn set_reorder_config(&self, id: Uuid, cfg: ReorderConfig) -> AppResult<Material> {
        if cfg.minimum_stock < 0 || cfg.reorder_point < 0 {
            return Err(AppError::Validation(
                "reorder thresholds must not be negative".to_string(),
            ));
        }
        let result = sqlx::query(
            r#"
            UPDATE materials
            SET minimum_stock = $1, reorder_point = $2, alert_enabled = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(cfg.minimum_stock)
        .bind(cfg.reorder_point)
        .bind(cfg.alert_enabled)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Material {} not found", id)));
        }
        self.fetch_material(id).await
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, description, active FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_category(&self, req: CreateCategory) -> AppResult<Category> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        Ok(sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name, description, active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, name, description, active
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_category(&self, id: Uuid, req: UpdateCategory) -> AppResult<Category> {
        let existing = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, active FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        Ok(sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $1, description = $2, active = $3
            WHERE id = $4
            RETURNING id, name, description, active
            "#,
        )
        .bind(req.name.as_deref().unwrap_or(&existing.name))
        .bind(req.description.as_deref().or(existing.description.as_deref()))
        .bind(req.active.unwrap_or(existing.active))
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<()> {
        let (referenced,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM materials WHERE category_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if referenced {
            return Err(AppError::InvalidState(
                "category is referenced by existing materials".to_string(),
            ));
        }
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }

    async fn list_units(&self) -> AppResult<Vec<Unit>> {
        Ok(
            sqlx::query_as::<_, Unit>("SELECT id, name, symbol, active FROM units ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn create_unit(&self, req: CreateUnit) -> AppResult<Unit> {
        if req.name.trim().is_empty() || req.symbol.trim().is_empty() {
            return Err(AppError::Validation(
                "name and symbol must not be empty".to_string(),
            ));
        }
        Ok(sqlx::query_as::<_, Unit>(
            r#"
            INSERT INTO units (id, name, symbol, active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, name, symbol, active
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(&req.symbol)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_unit(&self, id: Uuid, req: UpdateUnit) -> AppResult<Unit> {
        let existing =
            sqlx::query_as::<_, Unit>("SELECT id, name, symbol, active FROM units WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Unit {} not found", id)))?;

        Ok(sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units
            SET name = $1, symbol = $2, active = $3
            WHERE id = $4
            RETURNING id, name, symbol, active
            "#,
        )
        .bind(req.name.as_deref().unwrap_or(&existing.name))
        .bind(req.symbol.as_deref().unwrap_or(&existing.symbol))
        .bind(req.active.unwrap_or(existing.active))
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_unit(&self, id: Uuid) -> AppResult<()> {
        let (referenced,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM materials WHERE base_unit_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if referenced {
            return Err(AppError::InvalidState(
                "unit is referenced by existing materials".to_string(),
            ));
        }
        let result = sqlx::query("DELETE FROM units WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Unit {} not found", id)));
        }
        Ok(())
    }
}

// ── Record store ─────────────────────────────────────────────────────────────

#[async_trait]
impl RecordStore for PgStore {
    async fn list_returns(&self, filter: &ReturnFilter) -> AppResult<Page<ReturnOrder>> {
        let (page, limit) = crate::models::paging(filter.page, filter.limit);
        let offset = page.saturating_sub(1).saturating_mul(limit);

        let rows = sqlx::query_as::<_, ReturnRow>(&format!(
            r#"
            SELECT {RETURN_COLUMNS} FROM return_orders r
            WHERE ($1::return_state IS NULL OR r.state = $1)
              AND ($2::destination IS NULL OR EXISTS (
                    SELECT 1 FROM return_items i
                    WHERE i.return_id = r.id AND i.destination = $2))
            ORDER BY r.registered_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.state)
        .bind(filter.destination)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM return_orders r
            WHERE ($1::return_state IS NULL OR r.state = $1)
              AND ($2::destination IS NULL OR EXISTS (
                    SELECT 1 FROM return_items i
                    WHERE i.return_id = r.id AND i.destination = $2))
            "#,
        )
        .bind(filter.state)
        .bind(filter.destination)
        .fetch_one(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.fetch_items(row.id).await?;
            orders.push(row.into_order(items));
        }
        Ok(Page::new(orders, page, limit, total as u64))
    }

    async fn get_return(&self, id: Uuid) -> AppResult<ReturnOrder> {
        self.fetch_order(id).await
    }

    async fn register_return(&self, req: RegisterReturn) -> AppResult<ReturnOrder> {
        let candidates = disposition::well_formed_items(&req)?;

        let ids: Vec<Uuid> = candidates.iter().map(|c| c.material_id).collect();
        let known: Vec<(Uuid, String, String)> =
            sqlx::query_as("SELECT id, code, name FROM materials WHERE id = ANY($1)")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await?;

        let items: Vec<ReturnItem> = candidates
            .iter()
            .filter_map(|entry| {
                let (_, code, name) = known.iter().find(|(id, _, _)| *id == entry.material_id)?;
                Some(ReturnItem {
                    id: Uuid::new_v4(),
                    material_id: entry.material_id,
                    material_code: code.clone(),
                    material_name: name.clone(),
                    quantity: entry.quantity,
                    reason: entry.reason.clone(),
                    notes: entry.notes.clone(),
                    condition: None,
                    inspection_result: None,
                    state: ItemState::Pending,
                    destination: None,
                    inspected_at: None,
                })
            })
            .collect();

        if items.is_empty() {
            return Err(AppError::Validation(
                "no item references a known material".to_string(),
            ));
        }

        let (counter,): (i64,) = sqlx::query_as("SELECT nextval('return_code_seq')")
            .fetch_one(&self.pool)
            .await?;
        let now = Utc::now();
        let code = disposition::return_code(now, counter as u64);
        let (order, draft) = disposition::new_order(Uuid::new_v4(), code, now, &req, items);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO return_orders
                (id, code, registered_at, updated_at, customer_name,
                 customer_document, general_reason, notes, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id)
        .bind(&order.code)
        .bind(order.registered_at)
        .bind(order.updated_at)
        .bind(&order.customer_name)
        .bind(&order.customer_document)
        .bind(&order.general_reason)
        .bind(&order.notes)
        .bind(order.state)
        .execute(&mut *tx)
        .await?;

        for (ordinal, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO return_items
                    (id, return_id, ordinal, material_id, material_code,
                     material_name, quantity, reason, notes, state)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(ordinal as i32)
            .bind(item.material_id)
            .bind(&item.material_code)
            .bind(&item.material_name)
            .bind(item.quantity)
            .bind(&item.reason)
            .bind(&item.notes)
            .bind(item.state)
            .execute(&mut *tx)
            .await?;
        }

        insert_draft(&mut tx, &order, &draft).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn inspect(&self, id: Uuid, req: InspectReturn) -> AppResult<ReturnOrder> {
        let mut order = self.fetch_order(id).await?;
        let drafts = disposition::apply_inspection(&mut order, &req, Utc::now())?;
        self.persist_disposition(&order, drafts).await?;
        Ok(order)
    }

    async fn complete_repair(
        &self,
        id: Uuid,
        decision: RepairDecision,
    ) -> AppResult<ReturnOrder> {
        let mut order = self.fetch_order(id).await?;
        let drafts = disposition::apply_repair_outcome(&mut order, &decision, Utc::now())?;
        self.persist_disposition(&order, drafts).await?;
        Ok(order)
    }

    async fn list_in_repair(&self) -> AppResult<Vec<ReturnOrder>> {
        let rows = sqlx::query_as::<_, ReturnRow>(&format!(
            r#"
            SELECT {RETURN_COLUMNS} FROM return_orders r
            WHERE EXISTS (
                SELECT 1 FROM return_items i
                WHERE i.return_id = r.id AND i.state = 'IN_REPAIR'
            )
            ORDER BY r.registered_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.fetch_items(row.id).await?;
            orders.push(row.into_order(items));
        }
        Ok(orders)
    }

    async fn list_log(&self, filter: &LogFilter) -> AppResult<Page<LogEntry>> {
        let (page, limit) = crate::models::paging(filter.page, filter.limit);
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let (from, until) = filter.bounds();

        let entries = sqlx::query_as::<_, LogEntry>(
            r#"
            SELECT id, seq, return_id, return_code, item_id, material_name,
                   kind, quantity, description, acted_by, at
            FROM return_logs
            WHERE ($1::movement_kind IS NULL OR kind = $1)
              AND ($2::timestamptz IS NULL OR at >= $2)
              AND ($3::timestamptz IS NULL OR at < $3)
            ORDER BY at DESC, seq DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.kind)
        .bind(from)
        .bind(until)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM return_logs
            WHERE ($1::movement_kind IS NULL OR kind = $1)
              AND ($2::timestamptz IS NULL OR at >= $2)
              AND ($3::timestamptz IS NULL OR at < $3)
            "#,
        )
        .bind(filter.kind)
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(entries, page, limit, total as u64))
    }
}
