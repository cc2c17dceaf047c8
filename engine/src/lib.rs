//! Clarus Engine Library
//!
//! Month-by-month net worth projection, cash-flow health analysis, and
//! versioned local persistence of reports and snapshots.

pub mod calculations;
pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod util;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repositories::PersistenceStore;
pub use services::{ReportsApi, ReportsService};
