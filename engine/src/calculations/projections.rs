use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use super::money;
use crate::models::{
    HighlightMonth, HighlightedMonthValue, MonthlyProjection, ProjectionMarker, Report,
    MAX_PROJECTION_YEARS,
};
use crate::util::add_months;

/// First month at which the balance reaches the goal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalHit {
    pub goal_hit_index: Option<u32>,
    pub goal_hit_date: Option<NaiveDate>,
}

/// First month at which investment yield alone covers monthly outflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentCoverage {
    pub coverage_index: Option<u32>,
    pub coverage_date: Option<NaiveDate>,
}

/// Simulate monthly compounding for a report.
///
/// Yield accrues on the balance carried into the month, not on that month's
/// net flow. `GoalHit` marks only the month where the balance crosses the goal
/// from below; a report that starts at or above its goal never gets one.
///
/// Never panics: balances that leave the `Decimal` range are clamped to its
/// bounds, and horizons are cut at [`MAX_PROJECTION_YEARS`].
pub fn generate_projections(report: &Report) -> Vec<MonthlyProjection> {
    if i64::from(report.simulation_years) > i64::from(MAX_PROJECTION_YEARS) {
        warn!(
            "Report {} asks for {} years, projecting the first {}",
            report.id, report.simulation_years, MAX_PROJECTION_YEARS
        );
    }

    let months = report.total_months();
    let monthly_inflow = report.monthly_inflow();
    let monthly_outflow = report.monthly_outflow();
    let monthly_rate = report.monthly_rate();

    let highlighted: HashSet<u32> = report
        .highlight_months
        .iter()
        .map(|h| h.month_index)
        .collect();

    let mut projections = Vec::with_capacity(months as usize);
    let mut total_previous = report.initial_amount;
    let mut saturated = false;

    for month_index in 0..months {
        let total_before_yield =
            money::sub(money::add(total_previous, monthly_inflow), monthly_outflow);
        let yield_amount = money::mul(total_previous, monthly_rate);
        let final_amount = money::add(total_before_yield, yield_amount);

        if !saturated && money::is_saturated(final_amount) {
            saturated = true;
            warn!(
                "Projection for report {} left the representable range at month {}, clamping",
                report.id, month_index
            );
        }

        let mut markers = Vec::new();
        if highlighted.contains(&month_index) {
            markers.push(ProjectionMarker::HighlightedMonth);
        }
        if let Some(goal) = report.goal_amount {
            if final_amount >= goal && total_previous < goal {
                markers.push(ProjectionMarker::GoalHit);
            }
        }

        projections.push(MonthlyProjection {
            month_index,
            date: add_months(report.start_date, month_index),
            inflow: monthly_inflow,
            outflow: monthly_outflow,
            total_previous,
            total_before_yield,
            yield_amount,
            final_amount,
            markers: (!markers.is_empty()).then_some(markers),
        });

        total_previous = final_amount;
    }

    projections
}

/// Locate the first projected month whose final amount reaches `goal_amount`.
///
/// Independent of markers: a month counts even if the balance started above
/// the goal.
pub fn find_goal_hit(projections: &[MonthlyProjection], goal_amount: Option<Decimal>) -> GoalHit {
    let Some(goal) = goal_amount else {
        return GoalHit::default();
    };

    projections
        .iter()
        .find(|p| p.final_amount >= goal)
        .map(|p| GoalHit {
            goal_hit_index: Some(p.month_index),
            goal_hit_date: Some(p.date),
        })
        .unwrap_or_default()
}

/// Final balance at the end of the horizon, zero for an empty projection
pub fn get_final_amount(projections: &[MonthlyProjection]) -> Decimal {
    projections
        .last()
        .map(|p| p.final_amount)
        .unwrap_or(Decimal::ZERO)
}

/// Resolve each highlight to its projected value.
///
/// Highlights pointing past the simulated horizon are skipped.
pub fn get_highlighted_month_values(
    projections: &[MonthlyProjection],
    highlight_months: &[HighlightMonth],
) -> Vec<HighlightedMonthValue> {
    highlight_months
        .iter()
        .filter_map(|highlight| {
            projections
                .iter()
                .find(|p| p.month_index == highlight.month_index)
                .map(|p| HighlightedMonthValue {
                    label: highlight.label.clone(),
                    date: p.date,
                    amount: p.final_amount,
                })
        })
        .collect()
}

/// Find the first month whose yield meets or exceeds `monthly_outflow`
pub fn find_investment_coverage_date(
    projections: &[MonthlyProjection],
    monthly_outflow: Decimal,
) -> InvestmentCoverage {
    projections
        .iter()
        .find(|p| p.yield_amount >= monthly_outflow)
        .map(|p| InvestmentCoverage {
            coverage_index: Some(p.month_index),
            coverage_date: Some(p.date),
        })
        .unwrap_or_default()
}
