//! Schema version 1: the baseline shape.
//!
//! `{ "schemaVersion": 1, "reports": [...], "snapshots": [...] }`

use serde_json::{json, Map, Value};

pub const VERSION: u32 = 1;

fn array_or_empty(object: &Map<String, Value>, field: &str) -> Value {
    match object.get(field) {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        _ => Value::Array(Vec::new()),
    }
}

/// Bring unversioned data, or version-1 data, into the version-1 shape.
///
/// Non-array collections become empty arrays. Anything that is not an
/// object yields the empty state.
pub fn migrate(data: &Value) -> Value {
    match data {
        Value::Object(object) => json!({
            "schemaVersion": VERSION,
            "reports": array_or_empty(object, "reports"),
            "snapshots": array_or_empty(object, "snapshots"),
        }),
        _ => json!({
            "schemaVersion": VERSION,
            "reports": [],
            "snapshots": [],
        }),
    }
}

fn has_non_empty_str(entry: &Map<String, Value>, field: &str) -> bool {
    matches!(entry.get(field), Some(Value::String(s)) if !s.is_empty())
}

/// Structural check for a version-1 state.
///
/// Only identity fields are checked here; field-level shapes are enforced
/// when the typed models are built.
pub fn validate(state: &Value) -> bool {
    let Some(object) = state.as_object() else {
        return false;
    };
    if object.get("schemaVersion").and_then(Value::as_u64) != Some(u64::from(VERSION)) {
        return false;
    }
    let (Some(reports), Some(snapshots)) = (
        object.get("reports").and_then(Value::as_array),
        object.get("snapshots").and_then(Value::as_array),
    ) else {
        return false;
    };

    let reports_ok = reports.iter().all(|report| {
        report
            .as_object()
            .map_or(false, |r| has_non_empty_str(r, "id") && has_non_empty_str(r, "name"))
    });
    let snapshots_ok = snapshots.iter().all(|snapshot| {
        snapshot
            .as_object()
            .map_or(false, |s| has_non_empty_str(s, "id") && has_non_empty_str(s, "reportId"))
    });

    reports_ok && snapshots_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_non_object_is_empty() {
        for input in [Value::Null, json!("text"), json!(42), json!([1, 2])] {
            let migrated = migrate(&input);
            assert_eq!(migrated, json!({"schemaVersion": 1, "reports": [], "snapshots": []}));
            assert!(validate(&migrated));
        }
    }

    #[test]
    fn test_migrate_coerces_collections() {
        let migrated = migrate(&json!({"reports": "oops", "snapshots": {"a": 1}, "extra": true}));
        assert_eq!(migrated, json!({"schemaVersion": 1, "reports": [], "snapshots": []}));
    }

    #[test]
    fn test_validate_requires_ids() {
        let state = json!({
            "schemaVersion": 1,
            "reports": [{"id": "r1", "name": ""}],
            "snapshots": [],
        });
        assert!(!validate(&state));

        let state = json!({
            "schemaVersion": 1,
            "reports": [{"id": "r1", "name": "Plan"}],
            "snapshots": [{"id": "s1"}],
        });
        assert!(!validate(&state));

        let state = json!({
            "schemaVersion": 1,
            "reports": [{"id": "r1", "name": "Plan"}],
            "snapshots": [{"id": "s1", "reportId": "r1"}],
        });
        assert!(validate(&state));
    }

    #[test]
    fn test_validate_rejects_wrong_version() {
        assert!(!validate(&json!({"schemaVersion": 2, "reports": [], "snapshots": []})));
        assert!(!validate(&json!({"reports": [], "snapshots": []})));
        assert!(!validate(&json!({"schemaVersion": 1, "reports": null, "snapshots": []})));
    }
}
