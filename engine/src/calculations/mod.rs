//! Pure projection and cash-flow analysis.
//!
//! Nothing here touches storage; every function is deterministic over its
//! inputs and allocates fresh output.

pub mod health;
pub mod money;
pub mod projections;

pub use health::{calculate_health_summary, get_health_status, HealthStatus, HealthSummary};
pub use projections::{
    find_goal_hit, find_investment_coverage_date, generate_projections, get_final_amount,
    get_highlighted_month_values, GoalHit, InvestmentCoverage,
};
