//! Report model: a user-defined financial scenario

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::money;

/// Longest horizon the projection engine simulates
pub const MAX_PROJECTION_YEARS: u32 = 1000;

/// A recurring monthly inflow or outflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowItem {
    pub id: String,
    pub name: String,
    /// Monthly amount, never negative
    pub amount: Decimal,
}

/// A month the user wants called out in the projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightMonth {
    pub id: String,
    pub label: String,
    /// 0 = first simulated month
    pub month_index: u32,
}

/// Report model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub start_date: NaiveDate,
    pub initial_amount: Decimal,

    #[serde(default)]
    pub inflow_items: Vec<CashFlowItem>,
    #[serde(default)]
    pub outflow_items: Vec<CashFlowItem>,

    /// Yearly rate as a fraction, 0.085 = 8.5%
    pub annual_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_amount: Option<Decimal>,

    pub simulation_years: i32,

    #[serde(default)]
    pub highlight_months: Vec<HighlightMonth>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Number of simulated months; non-positive horizons simulate nothing and
    /// horizons past [`MAX_PROJECTION_YEARS`] are cut there
    pub fn total_months(&self) -> u32 {
        u32::try_from(self.simulation_years)
            .unwrap_or(0)
            .min(MAX_PROJECTION_YEARS)
            * 12
    }

    /// Sum of all monthly inflow amounts
    pub fn monthly_inflow(&self) -> Decimal {
        money::sum(self.inflow_items.iter().map(|item| item.amount))
    }

    /// Sum of all monthly outflow amounts
    pub fn monthly_outflow(&self) -> Decimal {
        money::sum(self.outflow_items.iter().map(|item| item.amount))
    }

    /// Monthly compounding rate
    pub fn monthly_rate(&self) -> Decimal {
        self.annual_rate / Decimal::from(12)
    }
}

/// Report fields supplied by the caller on creation.
///
/// Identity and timestamps are assigned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub initial_amount: Decimal,
    #[serde(default)]
    pub inflow_items: Vec<CashFlowItem>,
    #[serde(default)]
    pub outflow_items: Vec<CashFlowItem>,
    pub annual_rate: Decimal,
    #[serde(default)]
    pub goal_amount: Option<Decimal>,
    pub simulation_years: i32,
    #[serde(default)]
    pub highlight_months: Vec<HighlightMonth>,
}

impl NewReport {
    pub fn into_report(self, id: String, now: DateTime<Utc>) -> Report {
        Report {
            id,
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            initial_amount: self.initial_amount,
            inflow_items: self.inflow_items,
            outflow_items: self.outflow_items,
            annual_rate: self.annual_rate,
            goal_amount: self.goal_amount,
            simulation_years: self.simulation_years,
            highlight_months: self.highlight_months,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a report.
///
/// `None` leaves a field untouched. For the nullable fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub initial_amount: Option<Decimal>,
    pub inflow_items: Option<Vec<CashFlowItem>>,
    pub outflow_items: Option<Vec<CashFlowItem>>,
    pub annual_rate: Option<Decimal>,
    pub goal_amount: Option<Option<Decimal>>,
    pub simulation_years: Option<i32>,
    pub highlight_months: Option<Vec<HighlightMonth>>,
}

impl ReportUpdate {
    /// Apply the update on top of an existing report, refreshing `updated_at`
    pub fn apply_to(self, report: &Report, now: DateTime<Utc>) -> Report {
        Report {
            id: report.id.clone(),
            name: self.name.unwrap_or_else(|| report.name.clone()),
            description: self
                .description
                .unwrap_or_else(|| report.description.clone()),
            start_date: self.start_date.unwrap_or(report.start_date),
            initial_amount: self.initial_amount.unwrap_or(report.initial_amount),
            inflow_items: self
                .inflow_items
                .unwrap_or_else(|| report.inflow_items.clone()),
            outflow_items: self
                .outflow_items
                .unwrap_or_else(|| report.outflow_items.clone()),
            annual_rate: self.annual_rate.unwrap_or(report.annual_rate),
            goal_amount: self.goal_amount.unwrap_or(report.goal_amount),
            simulation_years: self.simulation_years.unwrap_or(report.simulation_years),
            highlight_months: self
                .highlight_months
                .unwrap_or_else(|| report.highlight_months.clone()),
            // Keep updated_at >= created_at even if the clock moved backwards
            created_at: report.created_at,
            updated_at: now.max(report.created_at),
        }
    }
}
