pub mod reports_service;

pub use reports_service::{ReportsApi, ReportsService, DEFAULT_MAX_SIMULATION_YEARS};
