//! The single durable unit: every report and snapshot, tagged with a schema version

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::report::Report;
use super::snapshot::Snapshot;

/// Current schema version. Bump when the persisted shape changes and register
/// the matching transform in `crate::migrations`.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Full persisted application state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub schema_version: u32,
    pub reports: Vec<Report>,
    pub snapshots: Vec<Snapshot>,
}

impl PersistedState {
    /// Empty state at the current schema version
    pub fn empty() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            reports: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Build the typed state from a migrated, validated JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Decode record by record, keeping every report and snapshot that fits
    /// the model. Returns the state and one description per skipped record.
    pub fn from_value_lenient(value: &Value) -> (Self, Vec<String>) {
        let schema_version = value
            .get("schemaVersion")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(CURRENT_SCHEMA_VERSION);

        let mut skipped = Vec::new();
        let reports = decode_each(value.get("reports"), "report", &mut skipped);
        let snapshots = decode_each(value.get("snapshots"), "snapshot", &mut skipped);

        (
            Self {
                schema_version,
                reports,
                snapshots,
            },
            skipped,
        )
    }

    pub fn find_report(&self, id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn find_snapshot(&self, id: &str) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    /// Insert or replace a report by id
    pub fn upsert_report(&mut self, report: Report) {
        match self.reports.iter_mut().find(|r| r.id == report.id) {
            Some(existing) => *existing = report,
            None => self.reports.push(report),
        }
    }

    /// Insert or replace a snapshot by id
    pub fn upsert_snapshot(&mut self, snapshot: Snapshot) {
        match self.snapshots.iter_mut().find(|s| s.id == snapshot.id) {
            Some(existing) => *existing = snapshot,
            None => self.snapshots.push(snapshot),
        }
    }

    /// Remove a report and every snapshot taken from it
    pub fn remove_report(&mut self, id: &str) {
        self.reports.retain(|r| r.id != id);
        self.snapshots.retain(|s| s.report_id != id);
    }

    pub fn remove_snapshot(&mut self, id: &str) {
        self.snapshots.retain(|s| s.id != id);
    }

    /// Snapshots taken from a report, newest first
    pub fn snapshots_for_report(&self, report_id: &str) -> Vec<Snapshot> {
        let mut snapshots: Vec<Snapshot> = self
            .snapshots
            .iter()
            .filter(|s| s.report_id == report_id)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshots
    }
}

fn decode_each<T: DeserializeOwned>(
    items: Option<&Value>,
    kind: &str,
    skipped: &mut Vec<String>,
) -> Vec<T> {
    let Some(items) = items.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(record) => Some(record),
            Err(e) => {
                let id = item.get("id").and_then(Value::as_str).unwrap_or("<no id>");
                skipped.push(format!("{} {} ({})", kind, id, e));
                None
            }
        })
        .collect()
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::empty()
    }
}
