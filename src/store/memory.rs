//! In-memory store. Stands in for PostgreSQL during development and demos;
//! same contracts, same disposition engine, session-durable only.

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::disposition::{self, LogDraft};
use crate::error::{AppError, AppResult};
use crate::models::{
    Category, CreateCategory, CreateMaterial, CreateUnit, InspectReturn, ItemState, LogEntry,
    LogFilter, Material, MaterialFilter, Page, RegisterReturn, ReorderConfig, RepairDecision,
    ReturnFilter, ReturnItem, ReturnOrder, Unit, UpdateCategory, UpdateMaterial, UpdateUnit,
};
use crate::store::{Catalog, RecordStore};

#[derive(Default)]
struct Inner {
    categories: IndexMap<Uuid, Category>,
    units: IndexMap<Uuid, Unit>,
    materials: IndexMap<Uuid, Material>,
    /// Insertion order = registration order.
    returns: IndexMap<Uuid, ReturnOrder>,
    /// Append-only; index order = seq order.
    logs: Vec<LogEntry>,
    seq: i64,
    return_counter: u64,
}

pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn append_drafts(&mut self, order: &ReturnOrder, drafts: Vec<LogDraft>) {
        let now = Utc::now();
        for draft in drafts {
            self.seq += 1;
            self.logs.push(LogEntry {
                id: Uuid::new_v4(),
                seq: self.seq,
                return_id: order.id,
                return_code: order.code.clone(),
                item_id: draft.item_id,
                material_name: draft.material_name,
                kind: draft.kind,
                quantity: draft.quantity,
                description: draft.description,
                user: draft.user,
                at: now,
            });
        }
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[async_trait]
impl Catalog for MemStore {
    async fn list_materials(&self, filter: &MaterialFilter) -> AppResult<Page<Material>> {
        let inner = self.inner.read().await;
        let mut all: Vec<Material> = inner
            .materials
            .values()
            .filter(|m| m.matches(filter))
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let (page, limit) = crate::models::paging(filter.page, filter.limit);
        Ok(Page::slice(all, page, limit))
    }

    async fn get_material(&self, id: Uuid) -> AppResult<Material> {
        let inner = self.inner.read().await;
        inner
            .materials
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))
    }

    async fn create_material(&self, req: CreateMaterial) -> AppResult<Material> {
        if req.code.trim().is_empty() {
            return Err(AppError::Validation("code must not be empty".to_string()));
        }
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }

        let mut inner = self.inner.write().await;
        if inner.materials.values().any(|m| m.code == req.code) {
            return Err(AppError::Validation(format!(
                "material code {} already exists",
                req.code
            )));
        }
        let category = inner
            .categories
            .get(&req.category_id)
            .ok_or_else(|| AppError::Validation(format!("unknown category {}", req.category_id)))?
            .clone();
        let unit = inner
            .units
            .get(&req.base_unit_id)
            .ok_or_else(|| AppError::Validation(format!("unknown unit {}", req.base_unit_id)))?
            .clone();

        let now = Utc::now();
        let material = Material {
            id: Uuid::new_v4(),
            code: req.code,
            name: req.name,
            description: req.description,
            category_id: category.id,
            category_name: category.name,
            base_unit_id: unit.id,
            base_unit_symbol: unit.symbol,
            active: req.active,
            stock_available: req.stock_available,
            stock_committed: req.stock_committed,
            stock_total: req.stock_available + req.stock_committed,
            reorder_config: req.reorder_config,
            created_at: now,
            updated_at: now,
        };
        inner.materials.insert(material.id, material.clone());
        Ok(material)
    }

    async fn update_material(&self, id: Uuid, req: UpdateMaterial) -> AppResult<Material> {
        let mut inner = self.inner.write().await;

        // Existence first, so the error taxonomy matches the database store.
        if !inner.materials.contains_key(&id) {
            return Err(AppError::NotFound(format!("Material {} not found", id)));
        }

        if let Some(code) = &req.code {
            if inner.materials.values().any(|m| m.id != id && &m.code == code) {
                return Err(AppError::Validation(format!(
                    "material code {} already exists",
                    code
                )));
            }
        }
        let category = match req.category_id {
            Some(cat_id) => Some(
                inner
                    .categories
                    .get(&cat_id)
                    .ok_or_else(|| AppError::Validation(format!("unknown category {}", cat_id)))?
                    .clone(),
            ),
            None => None,
        };
        let unit = match req.base_unit_id {
            Some(unit_id) => Some(
                inner
                    .units
                    .get(&unit_id)
                    .ok_or_else(|| AppError::Validation(format!("unknown unit {}", unit_id)))?
                    .clone(),
            ),
            None => None,
        };

        let material = inner
            .materials
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))?;

        if let Some(code) = req.code {
            material.code = code;
        }
        if let Some(name) = req.name {
            material.name = name;
        }
        if req.description.is_some() {
            material.description = req.description;
        }
        if let Some(category) = category {
            material.category_id = category.id;
            material.category_name = category.name;
        }
        if let Some(unit) = unit {
            material.base_unit_id = unit.id;
            material.base_unit_symbol = unit.symbol;
        }
        if let Some(stock) = req.stock_available {
            material.stock_available = stock;
        }
        if let Some(stock) = req.stock_committed {
            material.stock_committed = stock;
        }
        material.stock_total = material.stock_available + material.stock_committed;
        material.updated_at = Utc::now();
        Ok(material.clone())
    }

    async fn set_material_active(&self, id: Uuid, active: bool) -> AppResult<Material> {
        let mut inner = self.inner.write().await;
        let material = inner
            .materials
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))?;
        material.active = active;
        material.updated_at = Utc::now();
        Ok(material.clone())
    }

    async fn delete_material(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .materials
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))
    }

    async fn set_reorder_config(&self, id: Uuid, cfg: ReorderConfig) -> AppResult<Material> {
        if cfg.minimum_stock < 0 || cfg.reorder_point < 0 {
            return Err(AppError::Validation(
                "reorder thresholds must not be negative".to_string(),
            ));
        }
        let mut inner = self.inner.write().await;
        let material = inner
            .materials
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))?;
        material.reorder_config = Some(cfg);
        material.updated_at = Utc::now();
        Ok(material.clone())
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let mut all: Vec<Category> =
            self.inner.read().await.categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn create_category(&self, req: CreateCategory) -> AppResult<Category> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            active: true,
        };
        self.inner
            .write()
            .await
            .categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, req: UpdateCategory) -> AppResult<Category> {
        let mut inner = self.inner.write().await;
        let category = inner
            .categories
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;
        if let Some(name) = req.name {
            category.name = name;
        }
        if req.description.is_some() {
            category.description = req.description;
        }
        if let Some(active) = req.active {
            category.active = active;
        }
        let updated = category.clone();
        // Keep denormalized names in sync.
        for material in inner.materials.values_mut() {
            if material.category_id == id {
                material.category_name = updated.name.clone();
            }
        }
        Ok(updated)
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if inner.materials.values().any(|m| m.category_id == id) {
            return Err(AppError::InvalidState(
                "category is referenced by existing materials".to_string(),
            ));
        }
        inner
            .categories
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn list_units(&self) -> AppResult<Vec<Unit>> {
        let mut all: Vec<Unit> = self.inner.read().await.units.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn create_unit(&self, req: CreateUnit) -> AppResult<Unit> {
        if req.name.trim().is_empty() || req.symbol.trim().is_empty() {
            return Err(AppError::Validation(
                "name and symbol must not be empty".to_string(),
            ));
        }
        let unit = Unit {
            id: Uuid::new_v4(),
            name: req.name,
            symbol: req.symbol,
            active: true,
        };
        self.inner.write().await.units.insert(unit.id, unit.clone());
        Ok(unit)
    }

    async fn update_unit(&self, id: Uuid, req: UpdateUnit) -> AppResult<Unit> {
        let mut inner = self.inner.write().await;
        let unit = inner
            .units
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Unit {} not found", id)))?;
        if let Some(name) = req.name {
            unit.name = name;
        }
        if let Some(symbol) = req.symbol {
            unit.symbol = symbol;
        }
        if let Some(active) = req.active {
            unit.active = active;
        }
        let updated = unit.clone();
        for material in inner.materials.values_mut() {
            if material.base_unit_id == id {
                material.base_unit_symbol = updated.symbol.clone();
            }
        }
        Ok(updated)
    }

    async fn delete_unit(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if inner.materials.values().any(|m| m.base_unit_id == id) {
            return Err(AppError::InvalidState(
                "unit is referenced by existing materials".to_string(),
            ));
        }
        inner
            .units
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Unit {} not found", id)))
    }
}

// ── Record store ─────────────────────────────────────────────────────────────

#[async_trait]
impl RecordStore for MemStore {
    async fn list_returns(&self, filter: &ReturnFilter) -> AppResult<Page<ReturnOrder>> {
        let inner = self.inner.read().await;
        let all: Vec<ReturnOrder> = inner
            .returns
            .values()
            .rev() // newest first
            .filter(|r| filter.state.map_or(true, |s| r.state == s))
            .filter(|r| filter.destination.map_or(true, |d| r.has_destination(d)))
            .cloned()
            .collect();
        let (page, limit) = crate::models::paging(filter.page, filter.limit);
        Ok(Page::slice(all, page, limit))
    }

    async fn get_return(&self, id: Uuid) -> AppResult<ReturnOrder> {
        let inner = self.inner.read().await;
        inner
            .returns
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Return {} not found", id)))
    }

    async fn register_return(&self, req: RegisterReturn) -> AppResult<ReturnOrder> {
        let candidates = disposition::well_formed_items(&req)?;

        let mut inner = self.inner.write().await;
        let items: Vec<ReturnItem> = candidates
            .into_iter()
            .filter_map(|entry| {
                // Items referencing unknown materials are dropped like any
                // other malformed item.
                let material = inner.materials.get(&entry.material_id)?;
                Some(ReturnItem {
                    id: Uuid::new_v4(),
                    material_id: material.id,
                    material_code: material.code.clone(),
                    material_name: material.name.clone(),
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

        inner.return_counter += 1;
        let now = Utc::now();
        let code = disposition::return_code(now, inner.return_counter);
        let (order, draft) = disposition::new_order(Uuid::new_v4(), code, now, &req, items);

        inner.append_drafts(&order, vec![draft]);
        inner.returns.insert(order.id, order.clone());
        Ok(order)
    }

    async fn inspect(&self, id: Uuid, req: InspectReturn) -> AppResult<ReturnOrder> {
        let mut inner = self.inner.write().await;
        let mut order = inner
            .returns
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Return {} not found", id)))?;

        let drafts = disposition::apply_inspection(&mut order, &req, Utc::now())?;

        inner.append_drafts(&order, drafts);
        inner.returns.insert(order.id, order.clone());
        Ok(order)
    }

    async fn complete_repair(
        &self,
        id: Uuid,
        decision: RepairDecision,
    ) -> AppResult<ReturnOrder> {
        let mut inner = self.inner.write().await;
        let mut order = inner
            .returns
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Return {} not found", id)))?;

        let drafts = disposition::apply_repair_outcome(&mut order, &decision, Utc::now())?;

        inner.append_drafts(&order, drafts);
        inner.returns.insert(order.id, order.clone());
        Ok(order)
    }

    async fn list_in_repair(&self) -> AppResult<Vec<ReturnOrder>> {
        let inner = self.inner.read().await;
        Ok(inner
            .returns
            .values()
            .rev()
            .filter(|r| r.has_item_in_repair())
            .cloned()
            .collect())
    }

    async fn list_log(&self, filter: &LogFilter) -> AppResult<Page<LogEntry>> {
        let inner = self.inner.read().await;
        let all: Vec<LogEntry> = inner
            .logs
            .iter()
            .rev() // appended in seq order, displayed newest first
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        let (page, limit) = crate::models::paging(filter.page, filter.limit);
        Ok(Page::slice(all, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        InspectItem, InspectionResult, MovementKind, PhysicalCondition, RepairOutcome, ReturnState,
    };

    async fn store_with_materials(n: usize) -> (MemStore, Vec<Material>) {
        let store = MemStore::new();
        let category = store
            .create_category(CreateCategory {
                name: "Smartphones".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let unit = store
            .create_unit(CreateUnit {
                name: "Unidad".to_string(),
                symbol: "und".to_string(),
            })
            .await
            .unwrap();

        let mut materials = Vec::new();
        for i in 0..n {
            materials.push(
                store
                    .create_material(CreateMaterial {
                        code: format!("MAT-{:03}", i),
                        name: format!("Material {}", i),
                        description: None,
                        category_id: category.id,
                        base_unit_id: unit.id,
                        active: true,
                        stock_available: 100,
                        stock_committed: 0,
                        reorder_config: None,
                    })
                    .await
                    .unwrap(),
            );
        }
        (store, materials)
    }

    fn register_request(materials: &[Material]) -> RegisterReturn {
        RegisterReturn {
            customer_name: Some("Juan Pérez".to_string()),
            customer_document: Some("12345678".to_string()),
            general_reason: "Producto defectuoso".to_string(),
            notes: None,
            user: Some("mesa-ayuda".to_string()),
            items: vec![
                crate::models::RegisterReturnItem {
                    material_id: materials[0].id,
                    quantity: 1,
                    reason: "No enciende".to_string(),
                    notes: None,
                },
                crate::models::RegisterReturnItem {
                    material_id: materials[1].id,
                    quantity: 2,
                    reason: "Pantalla dañada".to_string(),
                    notes: None,
                },
            ],
        }
    }

    fn inspect_request(order: &ReturnOrder) -> InspectReturn {
        InspectReturn {
            inspector: Some("ana".to_string()),
            notes: None,
            items: vec![
                InspectItem {
                    item_id: order.items[0].id,
                    condition: Some(PhysicalCondition::Good),
                    result: Some(InspectionResult::FitForRestock),
                },
                InspectItem {
                    item_id: order.items[1].id,
                    condition: Some(PhysicalCondition::Damaged),
                    result: Some(InspectionResult::Repairable),
                },
            ],
        }
    }

    async fn log_count(store: &MemStore) -> u64 {
        store.list_log(&LogFilter::default()).await.unwrap().total
    }

    #[tokio::test]
    async fn register_creates_received_return_with_one_register_movement() {
        let (store, materials) = store_with_materials(2).await;
        let order = store
            .register_return(register_request(&materials))
            .await
            .unwrap();

        assert_eq!(order.state, ReturnState::Received);
        assert_eq!(order.items.len(), 2);
        assert!(order.items.iter().all(|i| i.state == ItemState::Pending));
        assert_eq!(order.items[0].material_code, materials[0].code);

        let log = store.list_log(&LogFilter::default()).await.unwrap();
        assert_eq!(log.total, 1);
        assert_eq!(log.items[0].kind, MovementKind::Register);
        assert_eq!(log.items[0].return_code, order.code);
    }

    #[tokio::test]
    async fn items_with_unknown_material_are_dropped() {
        let (store, materials) = store_with_materials(2).await;
        let mut req = register_request(&materials);
        req.items[1].material_id = Uuid::new_v4(); // never created
        let order = store.register_return(req).await.unwrap();
        assert_eq!(order.items.len(), 1);
    }

    #[tokio::test]
    async fn register_fails_when_no_item_survives() {
        let (store, _) = store_with_materials(0).await;
        let req = RegisterReturn {
            customer_name: None,
            customer_document: None,
            general_reason: "Producto defectuoso".to_string(),
            notes: None,
            user: None,
            items: vec![crate::models::RegisterReturnItem {
                material_id: Uuid::new_v4(),
                quantity: 1,
                reason: "x".to_string(),
                notes: None,
            }],
        };
        assert!(matches!(
            store.register_return(req).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(log_count(&store).await, 0, "no movement on failed register");
    }

    #[tokio::test]
    async fn full_disposition_workflow() {
        let (store, materials) = store_with_materials(2).await;
        let order = store
            .register_return(register_request(&materials))
            .await
            .unwrap();
        assert_eq!(log_count(&store).await, 1);

        // Inspection: item 0 fit for restock, item 1 repairable.
        let order = store.inspect(order.id, inspect_request(&order)).await.unwrap();
        assert_eq!(order.state, ReturnState::RepairPending);
        assert_eq!(order.items[0].state, ItemState::Restocked);
        assert_eq!(order.items[1].state, ItemState::InRepair);
        assert_eq!(
            log_count(&store).await,
            4,
            "two INSPECT movements plus one REPAIR added"
        );

        let in_repair = store.list_in_repair().await.unwrap();
        assert_eq!(in_repair.len(), 1);

        // Repair completes with a restock.
        let decision = RepairDecision {
            item_id: order.items[1].id,
            outcome: RepairOutcome::Restock,
            user: Some("carlos".to_string()),
            comment: None,
        };
        let order = store.complete_repair(order.id, decision).await.unwrap();
        assert_eq!(order.state, ReturnState::Completed);
        assert_eq!(order.items[1].state, ItemState::Restocked);
        assert_eq!(log_count(&store).await, 6, "RESTOCK plus COMPLETE added");

        let log = store.list_log(&LogFilter::default()).await.unwrap();
        assert_eq!(log.items[0].kind, MovementKind::Complete, "newest first");
        assert_eq!(log.items[1].kind, MovementKind::Restock);
        assert!(store.list_in_repair().await.unwrap().is_empty());

        // Second completion on the same item must be rejected.
        let again = RepairDecision {
            item_id: order.items[1].id,
            outcome: RepairOutcome::Restock,
            user: None,
            comment: None,
        };
        assert!(matches!(
            store.complete_repair(order.id, again).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn failed_inspection_leaves_store_untouched() {
        let (store, materials) = store_with_materials(2).await;
        let order = store
            .register_return(register_request(&materials))
            .await
            .unwrap();

        let mut req = inspect_request(&order);
        req.items[1].result = None;
        assert!(matches!(
            store.inspect(order.id, req).await,
            Err(AppError::Validation(_))
        ));

        let reloaded = store.get_return(order.id).await.unwrap();
        assert_eq!(reloaded.state, ReturnState::Received);
        assert!(reloaded.items.iter().all(|i| i.state == ItemState::Pending));
        assert_eq!(log_count(&store).await, 1, "only the REGISTER movement");
    }

    #[tokio::test]
    async fn list_returns_filters_by_state_and_destination() {
        let (store, materials) = store_with_materials(2).await;
        let first = store
            .register_return(register_request(&materials))
            .await
            .unwrap();
        let second = store
            .register_return(register_request(&materials))
            .await
            .unwrap();
        store.inspect(first.id, inspect_request(&first)).await.unwrap();

        let received = store
            .list_returns(&ReturnFilter {
                state: Some(ReturnState::Received),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(received.total, 1);
        assert_eq!(received.items[0].id, second.id);

        let repairing = store
            .list_returns(&ReturnFilter {
                destination: Some(crate::models::Destination::Repair),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(repairing.total, 1);
        assert_eq!(repairing.items[0].id, first.id);

        let cancelled = store
            .list_returns(&ReturnFilter {
                state: Some(ReturnState::Cancelled),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cancelled.total, 0, "no match is an empty page, not an error");
    }

    #[tokio::test]
    async fn log_filter_by_kind() {
        let (store, materials) = store_with_materials(2).await;
        let order = store
            .register_return(register_request(&materials))
            .await
            .unwrap();
        store.inspect(order.id, inspect_request(&order)).await.unwrap();

        let inspections = store
            .list_log(&LogFilter {
                kind: Some(MovementKind::Inspect),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(inspections.total, 2);
    }

    #[tokio::test]
    async fn routing_an_item_to_repair_leaves_a_repair_movement() {
        let (store, materials) = store_with_materials(2).await;
        let order = store
            .register_return(register_request(&materials))
            .await
            .unwrap();
        store.inspect(order.id, inspect_request(&order)).await.unwrap();

        let repairs = store
            .list_log(&LogFilter {
                kind: Some(MovementKind::Repair),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(repairs.total, 1);
        assert_eq!(repairs.items[0].item_id, Some(order.items[1].id));
    }

    #[tokio::test]
    async fn get_return_not_found() {
        let (store, _) = store_with_materials(0).await;
        assert!(matches!(
            store.get_return(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn updating_unknown_material_is_not_found_even_with_taken_code() {
        let (store, materials) = store_with_materials(1).await;
        let result = store
            .update_material(
                Uuid::new_v4(),
                crate::models::UpdateMaterial {
                    code: Some(materials[0].code.clone()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn categories_and_units_list_alphabetically() {
        let store = MemStore::new();
        for name in ["Tablets", "Accesorios Móviles", "Smartphones"] {
            store
                .create_category(CreateCategory {
                    name: name.to_string(),
                    description: None,
                })
                .await
                .unwrap();
        }
        for (name, symbol) in [("Unidad", "und"), ("Caja", "caja"), ("Metro", "m")] {
            store
                .create_unit(CreateUnit {
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                })
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Accesorios Móviles", "Smartphones", "Tablets"]);

        let units: Vec<String> = store
            .list_units()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(units, vec!["Caja", "Metro", "Unidad"]);
    }

    #[tokio::test]
    async fn category_with_materials_cannot_be_deleted() {
        let (store, materials) = store_with_materials(1).await;
        let err = store.delete_category(materials[0].category_id).await;
        assert!(matches!(err, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn duplicate_material_code_is_rejected() {
        let (store, materials) = store_with_materials(1).await;
        let result = store
            .create_material(CreateMaterial {
                code: materials[0].code.clone(),
                name: "Otro".to_string(),
                description: None,
                category_id: materials[0].category_id,
                base_unit_id: materials[0].base_unit_id,
                active: true,
                stock_available: 0,
                stock_committed: 0,
                reorder_config: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
