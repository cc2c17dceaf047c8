use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::migrations;
use crate::models::{PersistedState, Report, Snapshot};
use crate::storage::{
    KeyValueStore, LEGACY_REPORTS_KEY, LEGACY_SNAPSHOTS_KEY, PERSISTED_STATE_KEY, RECOVERY_KEY,
};

/// Counts of what a backup import brought in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub reports_count: usize,
    pub snapshots_count: usize,
}

/// Versioned store for every report and snapshot.
///
/// The whole state lives in one blob under [`PERSISTED_STATE_KEY`]. It is
/// loaded (and migrated) on first access, cached, and written back in full
/// after every mutation.
pub struct PersistenceStore<S: KeyValueStore> {
    storage: Arc<S>,
    state: Mutex<Option<PersistedState>>,
}

impl<S: KeyValueStore> PersistenceStore<S> {
    /// Create a new PersistenceStore; nothing is read until first access
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            state: Mutex::new(None),
        }
    }

    /// The underlying key-value store
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    // ==================== Reports ====================

    pub async fn get_reports(&self) -> AppResult<Vec<Report>> {
        self.read(|state| state.reports.clone()).await
    }

    pub async fn get_report_by_id(&self, id: &str) -> AppResult<Option<Report>> {
        self.read(|state| state.find_report(id).cloned()).await
    }

    /// Insert or replace a report by id
    pub async fn save_report(&self, report: Report) -> AppResult<()> {
        debug!("Saving report {}", report.id);
        self.mutate(|state| state.upsert_report(report)).await
    }

    /// Delete a report together with all of its snapshots
    pub async fn delete_report(&self, id: &str) -> AppResult<()> {
        debug!("Deleting report {} and its snapshots", id);
        self.mutate(|state| state.remove_report(id)).await
    }

    // ==================== Snapshots ====================

    /// Snapshots of a report, newest first
    pub async fn get_snapshots_by_report(&self, report_id: &str) -> AppResult<Vec<Snapshot>> {
        self.read(|state| state.snapshots_for_report(report_id)).await
    }

    pub async fn get_snapshot_by_id(&self, id: &str) -> AppResult<Option<Snapshot>> {
        self.read(|state| state.find_snapshot(id).cloned()).await
    }

    /// Insert or replace a snapshot by id
    pub async fn save_snapshot(&self, snapshot: Snapshot) -> AppResult<()> {
        debug!("Saving snapshot {} for report {}", snapshot.id, snapshot.report_id);
        self.mutate(|state| state.upsert_snapshot(snapshot)).await
    }

    pub async fn delete_snapshot(&self, id: &str) -> AppResult<()> {
        debug!("Deleting snapshot {}", id);
        self.mutate(|state| state.remove_snapshot(id)).await
    }

    // ==================== Backup ====================

    /// Serialize the whole current state, schema version included
    pub async fn export_data(&self) -> AppResult<String> {
        let mut guard = self.state.lock().await;
        let state = self.loaded(&mut guard).await?;
        Ok(serde_json::to_string_pretty(state)?)
    }

    /// Replace the whole state with a backup.
    ///
    /// All-or-nothing: the backup is parsed, migrated and checked in full
    /// before a single write swaps it in. Any failure leaves the stored
    /// state untouched.
    pub async fn import_data(&self, text: &str) -> AppResult<ImportSummary> {
        let parsed: Value = serde_json::from_str(text).map_err(|e| {
            warn!("Rejected backup: not valid JSON ({})", e);
            AppError::MalformedInput(e.to_string())
        })?;

        let candidate = prepare_import(parsed)?;
        check_identities(&candidate)?;

        let migrated = migrations::try_migrate(&candidate).map_err(|e| {
            warn!("Rejected backup: {}", e);
            AppError::ValidationFailed(e.to_string())
        })?;
        let next = PersistedState::from_value(migrated).map_err(|e| {
            warn!("Rejected backup: {}", e);
            AppError::ValidationFailed(format!("Backup does not match the data model: {}", e))
        })?;

        let summary = ImportSummary {
            reports_count: next.reports.len(),
            snapshots_count: next.snapshots.len(),
        };

        let mut guard = self.state.lock().await;
        self.loaded(&mut guard).await?;
        self.persist(&next).await?;
        *guard = Some(next);

        info!(
            "Imported backup with {} reports and {} snapshots",
            summary.reports_count, summary.snapshots_count
        );
        Ok(summary)
    }

    /// Drop the cache and load again from storage
    pub async fn reload(&self) -> AppResult<()> {
        let mut guard = self.state.lock().await;
        *guard = None;
        self.loaded(&mut guard).await?;
        Ok(())
    }

    // ==================== Internals ====================

    async fn read<T>(&self, f: impl FnOnce(&PersistedState) -> T) -> AppResult<T> {
        let mut guard = self.state.lock().await;
        let state = self.loaded(&mut guard).await?;
        Ok(f(state))
    }

    /// Apply a change to a copy, persist it, then swap it into the cache
    async fn mutate(&self, f: impl FnOnce(&mut PersistedState)) -> AppResult<()> {
        let mut guard = self.state.lock().await;
        let mut next = self.loaded(&mut guard).await?.clone();
        f(&mut next);
        self.persist(&next).await?;
        *guard = Some(next);
        Ok(())
    }

    async fn loaded<'a>(
        &self,
        slot: &'a mut Option<PersistedState>,
    ) -> AppResult<&'a mut PersistedState> {
        let state = match slot.take() {
            Some(state) => state,
            None => self.initialize().await?,
        };
        Ok(slot.insert(state))
    }

    async fn persist(&self, state: &PersistedState) -> AppResult<()> {
        let blob = serde_json::to_string(state)?;
        self.storage.set(PERSISTED_STATE_KEY, &blob).await.map_err(|e| {
            error!("Failed to persist state: {}", e);
            AppError::from(e)
        })
    }

    async fn initialize(&self) -> AppResult<PersistedState> {
        info!("Loading persisted state...");

        let (raw, legacy_consumed) = match self.read_current().await? {
            Some(raw) => (raw, false),
            None => match self.read_legacy().await? {
                Some(raw) => {
                    info!("Found legacy data, migrating to the versioned format");
                    (raw, true)
                }
                None => (Value::Null, false),
            },
        };

        let migrated = migrations::apply_migrations(&raw);
        let (state, skipped) = PersistedState::from_value_lenient(&migrated);

        if !skipped.is_empty() {
            for record in &skipped {
                warn!("Skipping undecodable {}", record);
            }
            // Raw source, for recovering the skipped records
            self.storage.set(RECOVERY_KEY, &raw.to_string()).await?;
            warn!(
                "Skipped {} records; original data saved under {}",
                skipped.len(),
                RECOVERY_KEY
            );
        }

        self.persist(&state).await?;

        if legacy_consumed && skipped.is_empty() {
            self.storage.remove(LEGACY_REPORTS_KEY).await?;
            self.storage.remove(LEGACY_SNAPSHOTS_KEY).await?;
            info!("Removed legacy storage keys");
        }

        info!(
            "Loaded {} reports and {} snapshots (schema version {})",
            state.reports.len(),
            state.snapshots.len(),
            state.schema_version
        );
        Ok(state)
    }

    async fn read_current(&self) -> AppResult<Option<Value>> {
        let Some(text) = self.storage.get(PERSISTED_STATE_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Stored state is not valid JSON ({}), trying legacy data", e);
                Ok(None)
            }
        }
    }

    /// Assemble an unversioned blob from the two pre-versioning keys
    async fn read_legacy(&self) -> AppResult<Option<Value>> {
        let reports = self.storage.get(LEGACY_REPORTS_KEY).await?;
        let snapshots = self.storage.get(LEGACY_SNAPSHOTS_KEY).await?;
        if reports.is_none() && snapshots.is_none() {
            return Ok(None);
        }

        let parse = |key: &str, text: Option<String>| -> Value {
            text.and_then(|t| match serde_json::from_str(&t) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring unreadable legacy data under {} ({})", key, e);
                    None
                }
            })
            .unwrap_or_else(|| json!([]))
        };

        Ok(Some(json!({
            "reports": parse(LEGACY_REPORTS_KEY, reports),
            "snapshots": parse(LEGACY_SNAPSHOTS_KEY, snapshots),
        })))
    }
}

/// Shape a parsed backup into something the pipeline can take.
///
/// Backups without a schema version are treated as legacy and wrapped.
fn prepare_import(parsed: Value) -> AppResult<Value> {
    let Value::Object(mut object) = parsed else {
        return Err(AppError::ValidationFailed(
            "Backup must be a JSON object".to_string(),
        ));
    };

    for field in ["reports", "snapshots"] {
        if !object.get(field).map_or(false, Value::is_array) {
            return Err(AppError::ValidationFailed(format!(
                "Backup field '{}' must be an array",
                field
            )));
        }
    }

    if object.contains_key("schemaVersion") {
        return Ok(Value::Object(object));
    }

    let mut legacy = Map::new();
    for field in ["reports", "snapshots"] {
        if let Some(items) = object.remove(field) {
            legacy.insert(field.to_string(), items);
        }
    }
    Ok(Value::Object(legacy))
}

fn non_empty_str<'a>(entry: &'a Value, field: &str) -> Option<&'a str> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Every report needs an id; every snapshot needs an id and a report id
fn check_identities(candidate: &Value) -> AppResult<()> {
    let empty = Vec::new();
    let reports = candidate["reports"].as_array().unwrap_or(&empty);
    let snapshots = candidate["snapshots"].as_array().unwrap_or(&empty);

    for (index, report) in reports.iter().enumerate() {
        if !report.is_object() || non_empty_str(report, "id").is_none() {
            return Err(AppError::ValidationFailed(format!(
                "Report at index {} has no id",
                index
            )));
        }
    }

    for (index, snapshot) in snapshots.iter().enumerate() {
        if !snapshot.is_object() || non_empty_str(snapshot, "id").is_none() {
            return Err(AppError::ValidationFailed(format!(
                "Snapshot at index {} has no id",
                index
            )));
        }
        if non_empty_str(snapshot, "reportId").is_none() {
            return Err(AppError::ValidationFailed(format!(
                "Snapshot at index {} has no report id",
                index
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_import_wraps_legacy() {
        let prepared = prepare_import(json!({"reports": [], "snapshots": [], "other": 1})).unwrap();
        assert_eq!(prepared, json!({"reports": [], "snapshots": []}));
    }

    #[test]
    fn test_prepare_import_keeps_versioned() {
        let input = json!({"schemaVersion": 1, "reports": [], "snapshots": []});
        assert_eq!(prepare_import(input.clone()).unwrap(), input);
    }

    #[test]
    fn test_prepare_import_rejects_non_arrays() {
        assert!(prepare_import(json!([1])).is_err());
        assert!(prepare_import(json!({"reports": {}, "snapshots": []})).is_err());
        assert!(prepare_import(json!({"reports": []})).is_err());
    }

    #[test]
    fn test_check_identities() {
        assert!(check_identities(&json!({"reports": [{"id": "r"}], "snapshots": []})).is_ok());
        assert!(check_identities(&json!({"reports": [{"id": ""}], "snapshots": []})).is_err());
        assert!(check_identities(&json!({"reports": [7], "snapshots": []})).is_err());
        assert!(
            check_identities(&json!({"reports": [], "snapshots": [{"id": "s", "reportId": 3}]}))
                .is_err()
        );
    }
}
