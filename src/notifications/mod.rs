//! Reorder notifications. A periodic sweep (and an on-demand endpoint)
//! evaluates catalog stock against each material's thresholds and raises at
//! most one live notification per material. State survives restarts through
//! a small JSON file next to the process.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Stock at or below the reorder point.
    Warning,
    /// Stock at or below the minimum.
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderNotification {
    pub id: Uuid,
    pub material_id: Uuid,
    pub material_code: String,
    pub material_name: String,
    pub severity: Severity,
    pub stock_available: i64,
    pub minimum_stock: i64,
    pub reorder_point: i64,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NotificationCenter {
    path: PathBuf,
    entries: Vec<ReorderNotification>,
}

impl NotificationCenter {
    /// Loads persisted notifications, starting empty when the file does not
    /// exist yet. A corrupt file is discarded rather than blocking startup.
    pub fn load(path: PathBuf) -> AppResult<Self> {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Discarding unreadable notification file");
                    Vec::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(AppError::Internal(anyhow::Error::new(err).context(
                    format!("reading notification file {}", path.display()),
                )))
            }
        };
        Ok(Self { path, entries })
    }

    fn persist(&self) -> AppResult<()> {
        let raw = serde_json::to_string_pretty(&self.entries)
            .context("serializing notifications")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing notification file {}", self.path.display()))?;
        Ok(())
    }

    /// Evaluates the given materials and raises notifications for those
    /// alerting. Materials that already carry a live notification are
    /// skipped, so repeated sweeps never duplicate. Returns how many were
    /// raised.
    pub fn evaluate(&mut self, materials: &[Material]) -> AppResult<usize> {
        let mut raised = 0;
        for material in materials {
            let Some(cfg) = material.reorder_config else {
                continue;
            };
            if !material.reorder_alerting() {
                continue;
            }
            if self.entries.iter().any(|n| n.material_id == material.id) {
                continue;
            }

            let severity = if material.stock_available <= cfg.minimum_stock {
                Severity::Critical
            } else {
                Severity::Warning
            };
            let message = match severity {
                Severity::Critical => format!(
                    "{} ({}) is at {} units, at or below its minimum of {}",
                    material.name, material.code, material.stock_available, cfg.minimum_stock
                ),
                Severity::Warning => format!(
                    "{} ({}) is at {} units, at or below its reorder point of {}",
                    material.name, material.code, material.stock_available, cfg.reorder_point
                ),
            };
            debug!(material = %material.code, severity = ?severity, "Raising reorder notification");
            self.entries.push(ReorderNotification {
                id: Uuid::new_v4(),
                material_id: material.id,
                material_code: material.code.clone(),
                material_name: material.name.clone(),
                severity,
                stock_available: material.stock_available,
                minimum_stock: cfg.minimum_stock,
                reorder_point: cfg.reorder_point,
                message,
                read: false,
                created_at: Utc::now(),
            });
            raised += 1;
        }
        if raised > 0 {
            self.persist()?;
        }
        Ok(raised)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<ReorderNotification> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&mut self, id: Uuid) -> AppResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;
        entry.read = true;
        self.persist()
    }

    pub fn mark_all_read(&mut self) -> AppResult<()> {
        for entry in &mut self.entries {
            entry.read = true;
        }
        self.persist()
    }

    /// Removes the notification. The next sweep may raise a fresh one if the
    /// material is still alerting.
    pub fn dismiss(&mut self, id: Uuid) -> AppResult<()> {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        if self.entries.len() == before {
            return Err(AppError::NotFound(format!("Notification {} not found", id)));
        }
        self.persist()
    }

    pub fn dismiss_all(&mut self) -> AppResult<()> {
        self.entries.clear();
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReorderConfig;

    fn material(stock: i64, minimum: i64, reorder: i64) -> Material {
        Material {
            id: Uuid::new_v4(),
            code: "CEL-TEST-001".to_string(),
            name: "Test phone".to_string(),
            description: None,
            category_id: Uuid::new_v4(),
            category_name: "Smartphones".to_string(),
            base_unit_id: Uuid::new_v4(),
            base_unit_symbol: "ud".to_string(),
            active: true,
            stock_available: stock,
            stock_committed: 0,
            stock_total: stock,
            reorder_config: Some(ReorderConfig {
                minimum_stock: minimum,
                reorder_point: reorder,
                alert_enabled: true,
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn center() -> (NotificationCenter, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let center = NotificationCenter::load(dir.path().join("notifications.json")).unwrap();
        (center, dir)
    }

    #[test]
    fn evaluate_raises_warning_between_thresholds() {
        let (mut center, _dir) = center();
        let raised = center.evaluate(&[material(5, 3, 10)]).unwrap();
        assert_eq!(raised, 1);
        let entries = center.list();
        assert_eq!(entries[0].severity, Severity::Warning);
    }

    #[test]
    fn evaluate_raises_critical_at_minimum() {
        let (mut center, _dir) = center();
        center.evaluate(&[material(3, 3, 10)]).unwrap();
        assert_eq!(center.list()[0].severity, Severity::Critical);
    }

    #[test]
    fn evaluate_skips_healthy_and_unconfigured_materials() {
        let (mut center, _dir) = center();
        let mut unconfigured = material(1, 3, 10);
        unconfigured.reorder_config = None;
        let raised = center
            .evaluate(&[material(50, 3, 10), unconfigured])
            .unwrap();
        assert_eq!(raised, 0, "neither material should alert");
    }

    #[test]
    fn repeated_sweeps_do_not_duplicate() {
        let (mut center, _dir) = center();
        let m = material(2, 3, 10);
        assert_eq!(center.evaluate(std::slice::from_ref(&m)).unwrap(), 1);
        assert_eq!(center.evaluate(std::slice::from_ref(&m)).unwrap(), 0);
        assert_eq!(center.list().len(), 1);
    }

    #[test]
    fn dismiss_allows_a_later_sweep_to_raise_again() {
        let (mut center, _dir) = center();
        let m = material(2, 3, 10);
        center.evaluate(std::slice::from_ref(&m)).unwrap();
        let id = center.list()[0].id;
        center.dismiss(id).unwrap();
        assert!(center.list().is_empty());
        assert_eq!(center.evaluate(std::slice::from_ref(&m)).unwrap(), 1);
    }

    #[test]
    fn read_state_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifications.json");
        let mut center = NotificationCenter::load(path.clone()).unwrap();
        center.evaluate(&[material(2, 3, 10)]).unwrap();
        center.mark_all_read().unwrap();

        let reloaded = NotificationCenter::load(path).unwrap();
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.unread_count(), 0);
    }

    #[test]
    fn mark_read_unknown_id_is_not_found() {
        let (mut center, _dir) = center();
        let err = center.mark_read(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
