use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Warehouse material. Category and unit names are denormalized for display;
/// the catalog store keeps them in sync on create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub category_name: String,
    pub base_unit_id: Uuid,
    pub base_unit_symbol: String,
    pub active: bool,
    pub stock_available: i64,
    pub stock_committed: i64,
    pub stock_total: i64,
    pub reorder_config: Option<ReorderConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock thresholds driving the reorder sweep. `reorder_point` fires a
/// warning, `minimum_stock` escalates it to critical.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReorderConfig {
    pub minimum_stock: i64,
    pub reorder_point: i64,
    #[serde(default = "default_true")]
    pub alert_enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
    pub symbol: String,
    pub active: bool,
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateMaterial {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub base_unit_id: Uuid,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub stock_available: i64,
    #[serde(default)]
    pub stock_committed: i64,
    pub reorder_config: Option<ReorderConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMaterial {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub base_unit_id: Option<Uuid>,
    pub stock_available: Option<i64>,
    pub stock_committed: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUnit {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUnit {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub active: Option<bool>,
}

// ── Query parameters ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterialFilter {
    pub category: Option<Uuid>,
    pub active: Option<bool>,
    /// Case-insensitive substring match on code or name.
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl Material {
    /// True when this material should appear in the reorder sweep at all.
    pub fn reorder_alerting(&self) -> bool {
        match self.reorder_config {
            Some(cfg) => cfg.alert_enabled && self.stock_available <= cfg.reorder_point,
            None => false,
        }
    }

    pub fn matches(&self, filter: &MaterialFilter) -> bool {
        if let Some(cat) = filter.category {
            if self.category_id != cat {
                return false;
            }
        }
        if let Some(active) = filter.active {
            if self.active != active {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            if !self.code.to_lowercase().contains(&needle)
                && !self.name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(stock: i64, cfg: Option<ReorderConfig>) -> Material {
        Material {
            id: Uuid::new_v4(),
            code: "CEL-SAM-S24-256-BLK".to_string(),
            name: "Samsung Galaxy S24 256GB Negro".to_string(),
            description: None,
            category_id: Uuid::new_v4(),
            category_name: "Smartphones".to_string(),
            base_unit_id: Uuid::new_v4(),
            base_unit_symbol: "und".to_string(),
            active: true,
            stock_available: stock,
            stock_committed: 0,
            stock_total: stock,
            reorder_config: cfg,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_reorder_config_never_alerts() {
        assert!(!material(0, None).reorder_alerting());
    }

    #[test]
    fn stock_at_reorder_point_alerts() {
        let cfg = ReorderConfig {
            minimum_stock: 3,
            reorder_point: 10,
            alert_enabled: true,
        };
        assert!(material(10, Some(cfg)).reorder_alerting());
        assert!(!material(11, Some(cfg)).reorder_alerting());
    }

    #[test]
    fn disabled_alert_flag_suppresses() {
        let cfg = ReorderConfig {
            minimum_stock: 3,
            reorder_point: 10,
            alert_enabled: false,
        };
        assert!(!material(1, Some(cfg)).reorder_alerting());
    }

    #[test]
    fn search_filter_matches_code_and_name_case_insensitive() {
        let m = material(5, None);
        let by_code = MaterialFilter {
            search: Some("cel-sam".to_string()),
            ..Default::default()
        };
        let by_name = MaterialFilter {
            search: Some("galaxy".to_string()),
            ..Default::default()
        };
        let miss = MaterialFilter {
            search: Some("iphone".to_string()),
            ..Default::default()
        };
        assert!(m.matches(&by_code));
        assert!(m.matches(&by_name));
        assert!(!m.matches(&miss));
    }
}
