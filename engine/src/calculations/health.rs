use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;
use super::projections::find_investment_coverage_date;
use crate::models::{MonthlyProjection, Report};

/// Monthly cash-flow health of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub monthly_inflow: Decimal,
    pub monthly_outflow: Decimal,
    /// May be negative
    pub monthly_leftover: Decimal,

    /// None when there is no inflow
    pub percent_outflow: Option<Decimal>,
    pub percent_kept: Option<Decimal>,

    /// Yield on the already-invested initial amount
    pub yield_on_initial_amount: Decimal,
    /// Yield on the leftover, assuming it is invested
    pub yield_on_leftover: Decimal,
    pub total_monthly_yield: Decimal,

    pub monthly_leftover_with_invest: Decimal,
    pub percent_outflow_with_invest: Option<Decimal>,
    pub percent_kept_with_invest: Option<Decimal>,

    /// None when there is no outflow
    pub investment_coverage_percent: Option<Decimal>,
    pub investment_covers_outflow: bool,
    pub investment_coverage_date: Option<NaiveDate>,
    pub investment_coverage_index: Option<u32>,
}

/// Health classification driven by the share of inflow kept each month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    (!denominator.is_zero()).then(|| money::div(numerator, denominator))
}

/// Calculate the monthly financial health summary for a report.
///
/// When `projections` are supplied and the initial amount's yield does not
/// yet cover outflow, the first month where it will is looked up in them.
pub fn calculate_health_summary(
    report: &Report,
    projections: Option<&[MonthlyProjection]>,
) -> HealthSummary {
    let monthly_inflow = report.monthly_inflow();
    let monthly_outflow = report.monthly_outflow();
    let monthly_leftover = money::sub(monthly_inflow, monthly_outflow);

    let percent_outflow = ratio(monthly_outflow, monthly_inflow);
    let percent_kept = ratio(monthly_leftover, monthly_inflow);

    let monthly_rate = report.monthly_rate();
    let yield_on_initial_amount = money::mul(report.initial_amount, monthly_rate);
    let yield_on_leftover = money::mul(monthly_leftover, monthly_rate);
    let total_monthly_yield = money::add(yield_on_initial_amount, yield_on_leftover);
    let monthly_leftover_with_invest = money::add(monthly_leftover, total_monthly_yield);

    let percent_kept_with_invest = ratio(monthly_leftover_with_invest, monthly_inflow);
    let percent_outflow_with_invest =
        percent_kept_with_invest.map(|kept| money::sub(Decimal::ONE, kept));

    let investment_coverage_percent = ratio(yield_on_initial_amount, monthly_outflow);
    let investment_covers_outflow = yield_on_initial_amount >= monthly_outflow;

    let coverage = match projections {
        Some(projections) if !investment_covers_outflow => {
            find_investment_coverage_date(projections, monthly_outflow)
        }
        _ => Default::default(),
    };

    HealthSummary {
        monthly_inflow,
        monthly_outflow,
        monthly_leftover,
        percent_outflow,
        percent_kept,
        yield_on_initial_amount,
        yield_on_leftover,
        total_monthly_yield,
        monthly_leftover_with_invest,
        percent_outflow_with_invest,
        percent_kept_with_invest,
        investment_coverage_percent,
        investment_covers_outflow,
        investment_coverage_date: coverage.coverage_date,
        investment_coverage_index: coverage.coverage_index,
    }
}

/// Classify a kept ratio
pub fn get_health_status(percent_kept: Option<Decimal>) -> HealthStatus {
    match percent_kept {
        None => HealthStatus::Critical,
        Some(kept) if kept >= Decimal::new(5, 1) => HealthStatus::Excellent,
        Some(kept) if kept >= Decimal::new(3, 1) => HealthStatus::Good,
        Some(kept) if kept >= Decimal::new(1, 1) => HealthStatus::Warning,
        Some(_) => HealthStatus::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::generate_projections;
    use crate::models::CashFlowItem;
    use chrono::Utc;

    fn item(name: &str, amount: i64) -> CashFlowItem {
        CashFlowItem {
            id: name.to_string(),
            name: name.to_string(),
            amount: Decimal::from(amount),
        }
    }

    fn report(initial: i64, inflow: &[i64], outflow: &[i64]) -> Report {
        let now = Utc::now();
        Report {
            id: "r1".to_string(),
            name: "Health".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            initial_amount: Decimal::from(initial),
            inflow_items: inflow.iter().map(|a| item("in", *a)).collect(),
            outflow_items: outflow.iter().map(|a| item("out", *a)).collect(),
            annual_rate: Decimal::new(12, 2),
            goal_amount: None,
            simulation_years: 10,
            highlight_months: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_basic_ratios() {
        let r = report(0, &[3000, 1000], &[1000]);
        let summary = calculate_health_summary(&r, None);

        assert_eq!(summary.monthly_inflow, Decimal::from(4000));
        assert_eq!(summary.monthly_outflow, Decimal::from(1000));
        assert_eq!(summary.monthly_leftover, Decimal::from(3000));
        assert_eq!(summary.percent_outflow, Some(Decimal::new(25, 2)));
        assert_eq!(summary.percent_kept, Some(Decimal::new(75, 2)));
    }

    #[test]
    fn test_with_invest_lens() {
        // 1% a month on 10_000 initial and 1_000 leftover
        let r = report(10_000, &[2000], &[1000]);
        let summary = calculate_health_summary(&r, None);

        assert_eq!(summary.yield_on_initial_amount, Decimal::from(100));
        assert_eq!(summary.yield_on_leftover, Decimal::from(10));
        assert_eq!(summary.total_monthly_yield, Decimal::from(110));
        assert_eq!(summary.monthly_leftover_with_invest, Decimal::from(1110));
        assert_eq!(summary.percent_kept_with_invest, Some(Decimal::new(555, 3)));
        assert_eq!(summary.percent_outflow_with_invest, Some(Decimal::new(445, 3)));
    }

    #[test]
    fn test_zero_inflow_ratios_are_none() {
        let r = report(1000, &[], &[500]);
        let summary = calculate_health_summary(&r, None);

        assert_eq!(summary.percent_outflow, None);
        assert_eq!(summary.percent_kept, None);
        assert_eq!(summary.percent_kept_with_invest, None);
        assert_eq!(summary.percent_outflow_with_invest, None);
        assert_eq!(summary.monthly_leftover, Decimal::from(-500));
    }

    #[test]
    fn test_zero_outflow_coverage() {
        let r = report(1000, &[100], &[]);
        let summary = calculate_health_summary(&r, None);

        assert_eq!(summary.investment_coverage_percent, None);
        assert!(summary.investment_covers_outflow);
    }

    #[test]
    fn test_coverage_already_met_skips_lookup() {
        // 100/month yield against 50 outflow
        let r = report(10_000, &[1000], &[50]);
        let projections = generate_projections(&r);
        let summary = calculate_health_summary(&r, Some(&projections));

        assert!(summary.investment_covers_outflow);
        assert_eq!(summary.investment_coverage_percent, Some(Decimal::from(2)));
        assert_eq!(summary.investment_coverage_index, None);
        assert_eq!(summary.investment_coverage_date, None);
    }

    #[test]
    fn test_coverage_date_from_projections() {
        // 10/month yield against 50 outflow, balance grows 1950/month
        let r = report(1000, &[2000], &[50]);
        let projections = generate_projections(&r);
        let summary = calculate_health_summary(&r, Some(&projections));

        assert!(!summary.investment_covers_outflow);
        assert_eq!(summary.investment_coverage_percent, Some(Decimal::new(2, 1)));
        let index = summary.investment_coverage_index.expect("coverage reached");
        assert_eq!(index, 3);
        assert_eq!(
            summary.investment_coverage_date,
            Some(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
        );
    }

    #[test]
    fn test_coverage_without_projections_left_empty() {
        let r = report(1000, &[2000], &[50]);
        let summary = calculate_health_summary(&r, None);

        assert!(!summary.investment_covers_outflow);
        assert_eq!(summary.investment_coverage_index, None);
    }

    #[test]
    fn test_health_status_thresholds() {
        assert_eq!(get_health_status(None), HealthStatus::Critical);
        assert_eq!(get_health_status(Some(Decimal::new(5, 1))), HealthStatus::Excellent);
        assert_eq!(get_health_status(Some(Decimal::new(49, 2))), HealthStatus::Good);
        assert_eq!(get_health_status(Some(Decimal::new(3, 1))), HealthStatus::Good);
        assert_eq!(get_health_status(Some(Decimal::new(1, 1))), HealthStatus::Warning);
        assert_eq!(get_health_status(Some(Decimal::new(9, 2))), HealthStatus::Critical);
        assert_eq!(get_health_status(Some(Decimal::from(-1))), HealthStatus::Critical);
    }

    #[test]
    fn test_extreme_inputs_do_not_panic() {
        let mut r = report(0, &[1], &[1_000_000]);
        r.initial_amount = Decimal::MAX;
        // 200% a month
        r.annual_rate = Decimal::from(24);
        let projections = generate_projections(&r);
        let summary = calculate_health_summary(&r, Some(&projections));

        assert_eq!(summary.yield_on_initial_amount, Decimal::MAX);
        assert!(summary.investment_covers_outflow);
        assert_eq!(summary.percent_outflow, Some(Decimal::from(1_000_000)));
    }
}
