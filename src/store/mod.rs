//! Storage seams. Two implementations exist — PostgreSQL and in-memory —
//! and exactly one is selected at composition time in `main`; business logic
//! never branches on which one it got.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Category, CreateCategory, CreateMaterial, CreateUnit, InspectReturn, LogEntry, LogFilter,
    Material, MaterialFilter, Page, RegisterReturn, ReorderConfig, RepairDecision, ReturnFilter,
    ReturnOrder, Unit, UpdateCategory, UpdateMaterial, UpdateUnit,
};

pub use memory::MemStore;
pub use postgres::PgStore;

/// Material catalog: the materials/categories/units the warehouse manages.
/// The reorder sweep reads stock figures through this seam and nothing else.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_materials(&self, filter: &MaterialFilter) -> AppResult<Page<Material>>;
    async fn get_material(&self, id: Uuid) -> AppResult<Material>;
    async fn create_material(&self, req: CreateMaterial) -> AppResult<Material>;
    async fn update_material(&self, id: Uuid, req: UpdateMaterial) -> AppResult<Material>;
    /// Reversible visibility toggle, distinct from permanent deletion.
    async fn set_material_active(&self, id: Uuid, active: bool) -> AppResult<Material>;
    /// Permanent removal. Callers are expected to have confirmed this.
    async fn delete_material(&self, id: Uuid) -> AppResult<()>;
    async fn set_reorder_config(&self, id: Uuid, cfg: ReorderConfig) -> AppResult<Material>;

    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn create_category(&self, req: CreateCategory) -> AppResult<Category>;
    async fn update_category(&self, id: Uuid, req: UpdateCategory) -> AppResult<Category>;
    async fn delete_category(&self, id: Uuid) -> AppResult<()>;

    async fn list_units(&self) -> AppResult<Vec<Unit>>;
    async fn create_unit(&self, req: CreateUnit) -> AppResult<Unit>;
    async fn update_unit(&self, id: Uuid, req: UpdateUnit) -> AppResult<Unit>;
    async fn delete_unit(&self, id: Uuid) -> AppResult<()>;
}

/// Record store for returns and their audit log. All disposition logic runs
/// through `crate::disposition`; implementations only load, apply and
/// persist.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Ordered by registration timestamp descending. No match ⇒ empty page.
    async fn list_returns(&self, filter: &ReturnFilter) -> AppResult<Page<ReturnOrder>>;
    async fn get_return(&self, id: Uuid) -> AppResult<ReturnOrder>;
    async fn register_return(&self, req: RegisterReturn) -> AppResult<ReturnOrder>;
    async fn inspect(&self, id: Uuid, req: InspectReturn) -> AppResult<ReturnOrder>;
    async fn complete_repair(&self, id: Uuid, decision: RepairDecision) -> AppResult<ReturnOrder>;
    /// Returns holding at least one item currently in repair.
    async fn list_in_repair(&self) -> AppResult<Vec<ReturnOrder>>;
    /// Ordered by timestamp descending, seq as tie-break.
    async fn list_log(&self, filter: &LogFilter) -> AppResult<Page<LogEntry>>;
}
