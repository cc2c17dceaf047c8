//! Schema migration pipeline for the persisted state blob.
//!
//! Every schema version registers one transform and one validator. A
//! transform for version N consumes the shape of version N-1 (version 1
//! consumes unversioned data) and must also accept its own output, since the
//! current version's transform is re-run as a normalization pass on load.
//!
//! Adding version N+1 means writing `vN_plus_1.rs`, appending it to
//! [`MIGRATIONS`] and bumping `CURRENT_SCHEMA_VERSION`. The dispatch loop does
//! not change.

pub mod v1;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::CURRENT_SCHEMA_VERSION;

/// Internal pipeline failures. Never surfaced past [`apply_migrations`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MigrationError {
    #[error("No migration registered for version {0}")]
    MissingMigration(u32),

    #[error("State does not validate at version {0}")]
    ValidationFailed(u32),

    #[error("Schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Schema version {0} is negative")]
    NegativeVersion(i64),
}

/// One registered schema version
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub migrate: fn(&Value) -> Value,
    pub validate: fn(&Value) -> bool,
}

/// Registered versions, in ascending order
pub static MIGRATIONS: &[Migration] = &[Migration {
    version: v1::VERSION,
    migrate: v1::migrate,
    validate: v1::validate,
}];

/// Read `schemaVersion`, treating anything missing or non-numeric as 0
pub fn detect_version(data: &Value) -> u32 {
    data.get("schemaVersion")
        .and_then(Value::as_u64)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Empty state at the current schema version
pub fn empty_state() -> Value {
    json!({
        "schemaVersion": CURRENT_SCHEMA_VERSION,
        "reports": [],
        "snapshots": [],
    })
}

fn find(registry: &[Migration], version: u32) -> Result<&Migration, MigrationError> {
    registry
        .iter()
        .find(|m| m.version == version)
        .ok_or(MigrationError::MissingMigration(version))
}

/// Migrate `data` up to `target` using `registry`, failing if the result
/// cannot be certified.
pub fn migrate_with(
    registry: &[Migration],
    target: u32,
    data: &Value,
) -> Result<Value, MigrationError> {
    if let Some(negative) = data
        .get("schemaVersion")
        .and_then(Value::as_i64)
        .filter(|v| *v < 0)
    {
        return Err(MigrationError::NegativeVersion(negative));
    }

    let version = detect_version(data);

    if version == target {
        let current = find(registry, target)?;
        let normalized = (current.migrate)(data);
        if (current.validate)(&normalized) {
            return Ok(normalized);
        }
        warn!("State validation failed at version {}, attempting migration", target);
    }

    if version > target {
        return Err(MigrationError::UnsupportedVersion {
            found: version,
            supported: target,
        });
    }

    let mut state = data.clone();
    let mut current_version = version;
    while current_version < target {
        let next_version = current_version + 1;
        let migration = find(registry, next_version)?;
        state = (migration.migrate)(&state);
        info!(
            "Migrated state from version {} to {}",
            current_version, next_version
        );
        current_version = next_version;
    }

    let validator = find(registry, target)?.validate;
    if validator(&state) {
        Ok(state)
    } else {
        Err(MigrationError::ValidationFailed(target))
    }
}

/// Migrate with the built-in registry to the current schema version
pub fn try_migrate(data: &Value) -> Result<Value, MigrationError> {
    migrate_with(MIGRATIONS, CURRENT_SCHEMA_VERSION, data)
}

/// Bring any previously persisted shape up to the current schema version.
///
/// Never fails: if the result cannot be certified, the data is dropped and
/// an empty current-version state is returned.
pub fn apply_migrations(data: &Value) -> Value {
    match try_migrate(data) {
        Ok(state) => state,
        Err(e) => {
            error!("Migration failed ({}), discarding data and returning empty state", e);
            empty_state()
        }
    }
}

/// Check a state against the current version's validator
pub fn validate_state(state: &Value) -> bool {
    find(MIGRATIONS, CURRENT_SCHEMA_VERSION)
        .map(|m| (m.validate)(state))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> Value {
        json!({
            "reports": [{"id": "r1", "name": "Retirement", "initialAmount": 1000}],
            "snapshots": [{"id": "s1", "reportId": "r1"}],
        })
    }

    #[test]
    fn test_absent_data_is_empty_state() {
        assert_eq!(apply_migrations(&Value::Null), empty_state());
    }

    #[test]
    fn test_legacy_blob_is_versioned() {
        let migrated = apply_migrations(&legacy());
        assert_eq!(migrated["schemaVersion"], json!(1));
        assert_eq!(migrated["reports"], legacy()["reports"]);
        assert_eq!(migrated["snapshots"], legacy()["snapshots"]);
    }

    #[test]
    fn test_migration_is_idempotent() {
        for input in [legacy(), Value::Null, json!({"schemaVersion": 1, "reports": "x"})] {
            let once = apply_migrations(&input);
            let twice = apply_migrations(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_corrupt_current_version_falls_back_to_empty() {
        let corrupt = json!({"schemaVersion": 1, "reports": "not-an-array", "snapshots": []});
        let migrated = apply_migrations(&corrupt);
        assert!(validate_state(&migrated));
        assert_eq!(migrated, empty_state());
    }

    #[test]
    fn test_invalid_entries_fall_back_to_empty() {
        let bad = json!({"schemaVersion": 1, "reports": [{"name": "no id"}], "snapshots": []});
        assert_eq!(try_migrate(&bad), Err(MigrationError::ValidationFailed(1)));
        assert_eq!(apply_migrations(&bad), empty_state());
    }

    #[test]
    fn test_future_version_is_unsupported() {
        let future = json!({"schemaVersion": 7, "reports": [], "snapshots": []});
        assert_eq!(
            try_migrate(&future),
            Err(MigrationError::UnsupportedVersion { found: 7, supported: 1 })
        );
        assert_eq!(apply_migrations(&future), empty_state());
    }

    #[test]
    fn test_negative_version_is_discarded() {
        let data = json!({"schemaVersion": -1, "reports": [{"id": "r", "name": "n"}], "snapshots": []});
        assert_eq!(try_migrate(&data), Err(MigrationError::NegativeVersion(-1)));
        assert_eq!(apply_migrations(&data), empty_state());
    }

    #[test]
    fn test_non_numeric_version_is_legacy() {
        let data = json!({"schemaVersion": "1", "reports": [], "snapshots": []});
        assert_eq!(detect_version(&data), 0);
        assert_eq!(apply_migrations(&data), empty_state());
    }

    fn migrate_v2(data: &Value) -> Value {
        let mut next = v1::migrate(data);
        next["schemaVersion"] = json!(2);
        next["settings"] = data.get("settings").cloned().unwrap_or_else(|| json!({}));
        next
    }

    fn validate_v2(state: &Value) -> bool {
        state["schemaVersion"] == json!(2) && state["settings"].is_object()
    }

    #[test]
    fn test_registry_extends_to_new_versions() {
        let registry = [
            MIGRATIONS[0],
            Migration {
                version: 2,
                migrate: migrate_v2,
                validate: validate_v2,
            },
        ];

        let migrated = migrate_with(&registry, 2, &legacy()).unwrap();
        assert_eq!(migrated["schemaVersion"], json!(2));
        assert_eq!(migrated["settings"], json!({}));
        assert_eq!(migrated["reports"], legacy()["reports"]);

        let again = migrate_with(&registry, 2, &migrated).unwrap();
        assert_eq!(again, migrated);
    }

    #[test]
    fn test_missing_step_fails() {
        assert_eq!(
            migrate_with(MIGRATIONS, 3, &legacy()),
            Err(MigrationError::MissingMigration(2))
        );
    }
}
