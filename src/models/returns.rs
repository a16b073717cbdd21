use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── State machines ───────────────────────────────────────────────────────────
//
// Wire and database values keep the warehouse vocabulary the operators use
// (REINTEGRO / REPARACION / ELIMINACION, EN_REPARACION); everything else is
// plain SCREAMING_SNAKE_CASE.

/// Aggregate state of a return. Derived from item states, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "return_state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnState {
    Received,
    #[serde(rename = "EN_REPARACION")]
    #[sqlx(rename = "EN_REPARACION")]
    RepairPending,
    Completed,
    Cancelled,
}

impl ReturnState {
    /// Terminal returns accept no further dispositions.
    pub fn is_closed(self) -> bool {
        matches!(self, ReturnState::Completed | ReturnState::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "item_state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    Pending,
    Restocked,
    InRepair,
    Discarded,
}

/// Physical assessment recorded at inspection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "physical_condition")]
pub enum PhysicalCondition {
    #[serde(rename = "BUENO")]
    #[sqlx(rename = "BUENO")]
    Good,
    #[serde(rename = "DANIADO")]
    #[sqlx(rename = "DANIADO")]
    Damaged,
    #[serde(rename = "NO_RECUPERABLE")]
    #[sqlx(rename = "NO_RECUPERABLE")]
    Unrecoverable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "inspection_result")]
pub enum InspectionResult {
    #[serde(rename = "APTO_REINTEGRO")]
    #[sqlx(rename = "APTO_REINTEGRO")]
    FitForRestock,
    #[serde(rename = "REPARABLE")]
    #[sqlx(rename = "REPARABLE")]
    Repairable,
    #[serde(rename = "NO_REPARABLE")]
    #[sqlx(rename = "NO_REPARABLE")]
    Unrepairable,
}

/// Where an inspected item physically goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "destination")]
pub enum Destination {
    #[serde(rename = "REINTEGRO")]
    #[sqlx(rename = "REINTEGRO")]
    Restock,
    #[serde(rename = "REPARACION")]
    #[sqlx(rename = "REPARACION")]
    Repair,
    #[serde(rename = "ELIMINACION")]
    #[sqlx(rename = "ELIMINACION")]
    Disposal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "movement_kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Register,
    Inspect,
    Restock,
    Repair,
    Discard,
    Complete,
}

impl InspectionResult {
    pub fn as_str(self) -> &'static str {
        match self {
            InspectionResult::FitForRestock => "APTO_REINTEGRO",
            InspectionResult::Repairable => "REPARABLE",
            InspectionResult::Unrepairable => "NO_REPARABLE",
        }
    }
}

impl Destination {
    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Restock => "REINTEGRO",
            Destination::Repair => "REPARACION",
            Destination::Disposal => "ELIMINACION",
        }
    }
}

/// Outcome chosen when a repaired item leaves the workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairOutcome {
    Restock,
    Discard,
}

// ── Entities ─────────────────────────────────────────────────────────────────

/// One customer return event. Owns its items; item order is registration
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnOrder {
    pub id: Uuid,
    pub code: String,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_document: Option<String>,
    pub general_reason: String,
    pub notes: Option<String>,
    pub state: ReturnState,
    /// Single shared destination of all items, when there is one.
    pub disposition: Option<Destination>,
    pub inspector: Option<String>,
    pub inspection_notes: Option<String>,
    pub decided_by: Option<String>,
    pub decision_comment: Option<String>,
    pub items: Vec<ReturnItem>,
}

impl ReturnOrder {
    pub fn item(&self, item_id: Uuid) -> Option<&ReturnItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: Uuid) -> Option<&mut ReturnItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    pub fn has_item_in_repair(&self) -> bool {
        self.items.iter().any(|i| i.state == ItemState::InRepair)
    }

    pub fn has_destination(&self, destination: Destination) -> bool {
        self.items.iter().any(|i| i.destination == Some(destination))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReturnItem {
    pub id: Uuid,
    pub material_id: Uuid,
    pub material_code: String,
    pub material_name: String,
    pub quantity: i32,
    pub reason: String,
    pub notes: Option<String>,
    pub condition: Option<PhysicalCondition>,
    pub inspection_result: Option<InspectionResult>,
    pub state: ItemState,
    pub destination: Option<Destination>,
    pub inspected_at: Option<DateTime<Utc>>,
}

/// Append-only audit movement. `seq` is a store-wide monotonic counter that
/// keeps same-timestamp entries in a stable display order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: Uuid,
    pub seq: i64,
    pub return_id: Uuid,
    pub return_code: String,
    pub item_id: Option<Uuid>,
    pub material_name: Option<String>,
    pub kind: MovementKind,
    pub quantity: Option<i32>,
    pub description: String,
    // "user" is reserved in Postgres; the column is acted_by.
    #[sqlx(rename = "acted_by")]
    pub user: String,
    pub at: DateTime<Utc>,
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterReturn {
    pub customer_name: Option<String>,
    pub customer_document: Option<String>,
    pub general_reason: String,
    pub notes: Option<String>,
    pub user: Option<String>,
    pub items: Vec<RegisterReturnItem>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterReturnItem {
    pub material_id: Uuid,
    pub quantity: i32,
    pub reason: String,
    pub notes: Option<String>,
}

impl RegisterReturnItem {
    /// Well-formed per the registration contract; the material reference is
    /// checked against the catalog separately.
    pub fn is_well_formed(&self) -> bool {
        self.quantity > 0 && !self.reason.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct InspectReturn {
    pub inspector: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<InspectItem>,
}

/// Condition and result are optional at the DTO level so an incomplete entry
/// surfaces as a ValidationError naming the item, not a deserialize failure.
#[derive(Debug, Deserialize)]
pub struct InspectItem {
    pub item_id: Uuid,
    pub condition: Option<PhysicalCondition>,
    pub result: Option<InspectionResult>,
}

#[derive(Debug, Deserialize)]
pub struct RepairDecision {
    pub item_id: Uuid,
    pub outcome: RepairOutcome,
    pub user: Option<String>,
    pub comment: Option<String>,
}

// ── Query parameters ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ReturnFilter {
    pub state: Option<ReturnState>,
    pub destination: Option<Destination>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogFilter {
    pub kind: Option<MovementKind>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl LogFilter {
    /// Inclusive date bounds expanded to an UTC half-open instant range.
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let from = self
            .date_from
            .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
        let until = self.date_to.and_then(|d| d.succ_opt()).map(|d| {
            d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
        });
        (from, until)
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(kind) = self.kind {
            if entry.kind != kind {
                return false;
            }
        }
        let (from, until) = self.bounds();
        if let Some(from) = from {
            if entry.at < from {
                return false;
            }
        }
        if let Some(until) = until {
            if entry.at >= until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_keep_warehouse_vocabulary() {
        assert_eq!(
            serde_json::to_value(ReturnState::RepairPending).unwrap(),
            "EN_REPARACION"
        );
        assert_eq!(
            serde_json::to_value(InspectionResult::FitForRestock).unwrap(),
            "APTO_REINTEGRO"
        );
        assert_eq!(
            serde_json::to_value(Destination::Disposal).unwrap(),
            "ELIMINACION"
        );
        assert_eq!(serde_json::to_value(ItemState::InRepair).unwrap(), "IN_REPAIR");
    }

    #[test]
    fn closed_states() {
        assert!(ReturnState::Completed.is_closed());
        assert!(ReturnState::Cancelled.is_closed());
        assert!(!ReturnState::Received.is_closed());
        assert!(!ReturnState::RepairPending.is_closed());
    }

    #[test]
    fn register_item_well_formedness() {
        let ok = RegisterReturnItem {
            material_id: Uuid::new_v4(),
            quantity: 1,
            reason: "No enciende".to_string(),
            notes: None,
        };
        assert!(ok.is_well_formed());

        let zero_qty = RegisterReturnItem { quantity: 0, ..clone_item(&ok) };
        let blank_reason = RegisterReturnItem {
            reason: "   ".to_string(),
            ..clone_item(&ok)
        };
        assert!(!zero_qty.is_well_formed());
        assert!(!blank_reason.is_well_formed());
    }

    fn clone_item(i: &RegisterReturnItem) -> RegisterReturnItem {
        RegisterReturnItem {
            material_id: i.material_id,
            quantity: i.quantity,
            reason: i.reason.clone(),
            notes: i.notes.clone(),
        }
    }

    #[test]
    fn log_filter_date_bounds_are_inclusive() {
        let entry = |at: DateTime<Utc>| LogEntry {
            id: Uuid::new_v4(),
            seq: 0,
            return_id: Uuid::new_v4(),
            return_code: "DEV-2026-0001".to_string(),
            item_id: None,
            material_name: None,
            kind: MovementKind::Register,
            quantity: None,
            description: "registro".to_string(),
            user: "sistema".to_string(),
            at,
        };
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let filter = LogFilter {
            date_from: Some(day),
            date_to: Some(day),
            ..Default::default()
        };

        let start = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let late = day.and_hms_opt(23, 59, 59).unwrap().and_utc();
        let next = start + chrono::Duration::days(1);

        assert!(filter.matches(&entry(start)));
        assert!(filter.matches(&entry(late)));
        assert!(!filter.matches(&entry(next)));
    }

    #[test]
    fn log_filter_kind_is_exact() {
        let filter = LogFilter {
            kind: Some(MovementKind::Inspect),
            ..Default::default()
        };
        let mut e = LogEntry {
            id: Uuid::new_v4(),
            seq: 0,
            return_id: Uuid::new_v4(),
            return_code: "DEV-2026-0001".to_string(),
            item_id: None,
            material_name: None,
            kind: MovementKind::Inspect,
            quantity: None,
            description: String::new(),
            user: "sistema".to_string(),
            at: Utc::now(),
        };
        assert!(filter.matches(&e));
        e.kind = MovementKind::Register;
        assert!(!filter.matches(&e));
    }
}
