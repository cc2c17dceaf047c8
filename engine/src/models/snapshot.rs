//! Snapshot model: a frozen capture of a report's projection outcome

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::projection::MonthlyProjection;

/// Projected value at a highlighted month, resolved at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedMonthValue {
    pub label: String,
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Snapshot model
///
/// Every `*_at_snapshot` field is a copy taken at capture time, so later
/// edits to the source report never alter an existing snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub report_id: String,

    pub created_at: DateTime<Utc>,

    pub initial_amount_at_snapshot: Decimal,
    pub annual_rate_at_snapshot: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_amount_at_snapshot: Option<Decimal>,
    pub simulation_years_at_snapshot: i32,

    #[serde(default)]
    pub goal_hit_month_index: Option<u32>,
    #[serde(default)]
    pub goal_hit_date: Option<NaiveDate>,

    pub final_amount_at_end: Decimal,

    #[serde(default)]
    pub highlighted_month_values: Vec<HighlightedMonthValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projections: Option<Vec<MonthlyProjection>>,
}
