//! Monthly projection records produced by the projection engine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Annotation attached to a projected month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionMarker {
    /// First month whose balance crosses the goal
    GoalHit,
    /// Month listed in the report's highlight months
    HighlightedMonth,
}

impl ProjectionMarker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoalHit => "GoalHit",
            Self::HighlightedMonth => "HighlightedMonth",
        }
    }
}

/// One simulated month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProjection {
    pub month_index: u32,
    pub date: NaiveDate,

    pub inflow: Decimal,
    pub outflow: Decimal,

    /// Net worth at the end of the previous month
    pub total_previous: Decimal,
    /// total_previous + inflow - outflow
    pub total_before_yield: Decimal,
    pub yield_amount: Decimal,
    /// total_before_yield + yield_amount
    pub final_amount: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<Vec<ProjectionMarker>>,
}

impl MonthlyProjection {
    pub fn has_marker(&self, marker: ProjectionMarker) -> bool {
        self.markers
            .as_ref()
            .map_or(false, |markers| markers.contains(&marker))
    }
}
