//! The returns disposition state machine.
//!
//! Every transition a return or one of its items can take is decided here,
//! once, on plain domain values. Both store implementations load a
//! `ReturnOrder`, run one of these functions, and persist whatever came out —
//! the engine itself never touches storage. All validation happens before the
//! first mutation, so an `Err` means the order was left untouched.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Destination, InspectReturn, InspectionResult, ItemState, MovementKind, RegisterReturn,
    RegisterReturnItem, RepairDecision, RepairOutcome, ReturnItem, ReturnOrder, ReturnState,
};

/// Actor recorded on movements when the caller did not name one.
pub const SYSTEM_USER: &str = "sistema";

/// An audit movement the engine wants appended. The store assigns identity,
/// the monotonic `seq` and the final timestamp; drafts are emitted in the
/// exact order they must appear.
#[derive(Debug, Clone)]
pub struct LogDraft {
    pub item_id: Option<Uuid>,
    pub material_name: Option<String>,
    pub kind: MovementKind,
    pub quantity: Option<i32>,
    pub description: String,
    pub user: String,
}

// ── Transition functions ─────────────────────────────────────────────────────

/// Total mapping from inspection result to destination. There is no unmapped
/// case.
pub fn destination_for(result: InspectionResult) -> Destination {
    match result {
        InspectionResult::FitForRestock => Destination::Restock,
        InspectionResult::Repairable => Destination::Repair,
        InspectionResult::Unrepairable => Destination::Disposal,
    }
}

/// Item state an inspected item lands in, given its destination.
pub fn state_for(destination: Destination) -> ItemState {
    match destination {
        Destination::Restock => ItemState::Restocked,
        Destination::Repair => ItemState::InRepair,
        Destination::Disposal => ItemState::Discarded,
    }
}

/// Aggregate return state, derived from the item states and nothing else.
pub fn derive_state(order: &ReturnOrder) -> ReturnState {
    if order.has_item_in_repair() {
        ReturnState::RepairPending
    } else if order.items.iter().all(|i| i.state == ItemState::Pending) {
        ReturnState::Received
    } else {
        ReturnState::Completed
    }
}

fn derive_disposition(order: &ReturnOrder) -> Option<Destination> {
    let first = order.items.first().and_then(|i| i.destination)?;
    order
        .items
        .iter()
        .all(|i| i.destination == Some(first))
        .then_some(first)
}

// ── Registration ─────────────────────────────────────────────────────────────

/// Registration-side validation: non-empty general reason, and the subset of
/// items that are well-formed. Malformed items are silently dropped; it is a
/// ValidationError only when none survive. The store still has to check each
/// material reference against the catalog.
pub fn well_formed_items(req: &RegisterReturn) -> AppResult<Vec<&RegisterReturnItem>> {
    if req.general_reason.trim().is_empty() {
        return Err(AppError::Validation(
            "general_reason must not be empty".to_string(),
        ));
    }
    let items: Vec<_> = req.items.iter().filter(|i| i.is_well_formed()).collect();
    if items.is_empty() {
        return Err(AppError::Validation(
            "at least one item with a valid material, quantity > 0 and a reason is required"
                .to_string(),
        ));
    }
    Ok(items)
}

/// Sequential human-readable code, e.g. `DEV-2026-0007`.
pub fn return_code(now: DateTime<Utc>, counter: u64) -> String {
    format!("DEV-{}-{:04}", now.year(), counter)
}

/// Assemble a freshly registered return plus its REGISTER movement.
pub fn new_order(
    id: Uuid,
    code: String,
    now: DateTime<Utc>,
    req: &RegisterReturn,
    items: Vec<ReturnItem>,
) -> (ReturnOrder, LogDraft) {
    let order = ReturnOrder {
        id,
        code,
        registered_at: now,
        updated_at: now,
        customer_name: req.customer_name.clone(),
        customer_document: req.customer_document.clone(),
        general_reason: req.general_reason.clone(),
        notes: req.notes.clone(),
        state: ReturnState::Received,
        disposition: None,
        inspector: None,
        inspection_notes: None,
        decided_by: None,
        decision_comment: None,
        items,
    };
    let draft = LogDraft {
        item_id: None,
        material_name: None,
        kind: MovementKind::Register,
        quantity: Some(order.items.iter().map(|i| i.quantity).sum()),
        description: format!(
            "Return {} registered with {} item(s): {}",
            order.code,
            order.items.len(),
            order.general_reason
        ),
        user: req.user.clone().unwrap_or_else(|| SYSTEM_USER.to_string()),
    };
    (order, draft)
}

// ── Inspection ───────────────────────────────────────────────────────────────

/// Apply a full inspection batch. Validates the entire batch first — return
/// open, no duplicate or foreign item ids, condition and result present on
/// every entry, every pending item covered, no item inspected twice — then
/// mutates items in submission order and emits one INSPECT draft per item, a
/// REPAIR draft for every item routed to the workshop, plus a COMPLETE draft
/// when the return closes outright.
pub fn apply_inspection(
    order: &mut ReturnOrder,
    req: &InspectReturn,
    now: DateTime<Utc>,
) -> AppResult<Vec<LogDraft>> {
    if order.state.is_closed() {
        return Err(AppError::InvalidState(format!(
            "return {} is already closed",
            order.code
        )));
    }

    let mut seen: Vec<Uuid> = Vec::with_capacity(req.items.len());
    for entry in &req.items {
        if seen.contains(&entry.item_id) {
            return Err(AppError::Validation(format!(
                "item {} submitted more than once",
                entry.item_id
            )));
        }
        seen.push(entry.item_id);

        let item = order.item(entry.item_id).ok_or_else(|| {
            AppError::Validation(format!(
                "item {} does not belong to return {}",
                entry.item_id, order.code
            ))
        })?;
        if item.state != ItemState::Pending {
            return Err(AppError::InvalidState(format!(
                "item {} was already inspected",
                entry.item_id
            )));
        }
        if entry.condition.is_none() {
            return Err(AppError::Validation(format!(
                "item {} is missing its physical condition",
                entry.item_id
            )));
        }
        if entry.result.is_none() {
            return Err(AppError::Validation(format!(
                "item {} is missing its inspection result",
                entry.item_id
            )));
        }
    }

    if let Some(missing) = order
        .items
        .iter()
        .find(|i| i.state == ItemState::Pending && !seen.contains(&i.id))
    {
        return Err(AppError::Validation(format!(
            "inspection must cover every pending item; item {} is missing",
            missing.id
        )));
    }

    // All checks passed; from here on every mutation applies.
    let user = req
        .inspector
        .clone()
        .unwrap_or_else(|| SYSTEM_USER.to_string());
    let mut drafts = Vec::with_capacity(req.items.len() + 1);

    for entry in &req.items {
        // Presence of both fields was checked above.
        let result = entry.result.unwrap_or(InspectionResult::Unrepairable);
        let condition = entry
            .condition
            .unwrap_or(crate::models::PhysicalCondition::Unrecoverable);
        let destination = destination_for(result);

        let item = order
            .item_mut(entry.item_id)
            .ok_or_else(|| AppError::NotFound(format!("item {}", entry.item_id)))?;
        item.condition = Some(condition);
        item.inspection_result = Some(result);
        item.destination = Some(destination);
        item.state = state_for(destination);
        item.inspected_at = Some(now);

        drafts.push(LogDraft {
            item_id: Some(item.id),
            material_name: Some(item.material_name.clone()),
            kind: MovementKind::Inspect,
            quantity: Some(item.quantity),
            description: format!(
                "{} inspected: {} -> {}",
                item.material_name,
                result.as_str(),
                destination.as_str()
            ),
            user: user.clone(),
        });
        // Entering the workshop is its own movement.
        if destination == Destination::Repair {
            drafts.push(LogDraft {
                item_id: Some(item.id),
                material_name: Some(item.material_name.clone()),
                kind: MovementKind::Repair,
                quantity: Some(item.quantity),
                description: format!("{} sent to repair", item.material_name),
                user: user.clone(),
            });
        }
    }

    order.inspector = req.inspector.clone().or(order.inspector.take());
    if req.notes.is_some() {
        order.inspection_notes = req.notes.clone();
    }
    order.state = derive_state(order);
    order.disposition = derive_disposition(order);
    order.updated_at = now;

    if order.state == ReturnState::Completed {
        drafts.push(complete_draft(order, &user));
    }

    Ok(drafts)
}

// ── Repair completion ────────────────────────────────────────────────────────

/// Resolve one in-repair item. When the last item leaves IN_REPAIR the return
/// itself completes and a COMPLETE movement is appended.
pub fn apply_repair_outcome(
    order: &mut ReturnOrder,
    decision: &RepairDecision,
    now: DateTime<Utc>,
) -> AppResult<Vec<LogDraft>> {
    let user = decision
        .user
        .clone()
        .unwrap_or_else(|| SYSTEM_USER.to_string());

    let item = order
        .item(decision.item_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "item {} does not exist in return {}",
                decision.item_id, order.code
            ))
        })?;
    if item.state != ItemState::InRepair {
        return Err(AppError::InvalidState(format!(
            "item {} is not in repair",
            decision.item_id
        )));
    }

    let (state, destination, kind, verb) = match decision.outcome {
        RepairOutcome::Restock => (
            ItemState::Restocked,
            Destination::Restock,
            MovementKind::Restock,
            "restocked",
        ),
        RepairOutcome::Discard => (
            ItemState::Discarded,
            Destination::Disposal,
            MovementKind::Discard,
            "discarded",
        ),
    };

    let item = order
        .item_mut(decision.item_id)
        .ok_or_else(|| AppError::NotFound(format!("item {}", decision.item_id)))?;
    item.state = state;
    item.destination = Some(destination);

    let mut drafts = vec![LogDraft {
        item_id: Some(item.id),
        material_name: Some(item.material_name.clone()),
        kind,
        quantity: Some(item.quantity),
        description: format!("{} repair finished, item {}", item.material_name, verb),
        user: user.clone(),
    }];

    order.decided_by = decision.user.clone().or(order.decided_by.take());
    if decision.comment.is_some() {
        order.decision_comment = decision.comment.clone();
    }
    order.state = derive_state(order);
    order.disposition = derive_disposition(order);
    order.updated_at = now;

    if order.state == ReturnState::Completed {
        drafts.push(complete_draft(order, &user));
    }

    Ok(drafts)
}

fn complete_draft(order: &ReturnOrder, user: &str) -> LogDraft {
    LogDraft {
        item_id: None,
        material_name: None,
        kind: MovementKind::Complete,
        quantity: None,
        description: format!("Return {} completed", order.code),
        user: user.to_string(),
    }
}
