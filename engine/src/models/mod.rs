//! Domain models for the Clarus engine.
//!
//! This module contains the serialized entities that make up a user's
//! financial scenarios: reports, the projections derived from them, and the
//! snapshots that freeze a projection for later comparison.

pub mod persisted_state;
pub mod projection;
pub mod report;
pub mod snapshot;

// Re-export all models for convenient access
pub use persisted_state::{PersistedState, CURRENT_SCHEMA_VERSION};
pub use projection::{MonthlyProjection, ProjectionMarker};
pub use report::{
    CashFlowItem, HighlightMonth, NewReport, Report, ReportUpdate, MAX_PROJECTION_YEARS,
};
pub use snapshot::{HighlightedMonthValue, Snapshot};
