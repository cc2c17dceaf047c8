#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clarus_engine::models::{CashFlowItem, HighlightMonth, NewReport};
use clarus_engine::storage::MemoryStore;
use clarus_engine::util::SteppingClock;
use clarus_engine::{PersistenceStore, ReportsService};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Service wired to an in-memory store with a deterministic clock
pub struct TestEngine {
    pub storage: Arc<MemoryStore>,
    pub store: Arc<PersistenceStore<MemoryStore>>,
    pub service: ReportsService<MemoryStore>,
}

impl TestEngine {
    pub async fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStore::new())).await
    }

    /// Build an engine on top of existing storage contents
    pub async fn with_storage(storage: Arc<MemoryStore>) -> Self {
        let store = Arc::new(PersistenceStore::new(storage.clone()));
        let service = ReportsService::open(store.clone())
            .await
            .expect("Failed to open service")
            .with_clock(Arc::new(SteppingClock::starting_at(epoch())));

        Self {
            storage,
            store,
            service,
        }
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn item(name: &str, amount: &str) -> CashFlowItem {
    CashFlowItem {
        id: format!("item-{}", name.to_lowercase()),
        name: name.to_string(),
        amount: dec(amount),
    }
}

/// Salary 5000, rent 3000, 1000 invested at 12% a year for one year
pub fn sample_report(name: &str) -> NewReport {
    NewReport {
        name: name.to_string(),
        description: Some("Test scenario".to_string()),
        start_date: date(2024, 1, 15),
        initial_amount: dec("1000"),
        inflow_items: vec![item("Salary", "5000")],
        outflow_items: vec![item("Rent", "3000")],
        annual_rate: dec("0.12"),
        goal_amount: Some(dec("7000")),
        simulation_years: 1,
        highlight_months: vec![HighlightMonth {
            id: "h1".to_string(),
            label: "Mid year".to_string(),
            month_index: 5,
        }],
    }
}

/// Legacy report JSON as the pre-versioning app stored it
pub fn legacy_report_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": "Legacy plan",
        "startDate": "2023-03-01",
        "initialAmount": 2500,
        "inflowItems": [{"id": "i1", "name": "Salary", "amount": 4000}],
        "outflowItems": [{"id": "o1", "name": "Rent", "amount": 1500}],
        "annualRate": 0.1,
        "simulationYears": 2,
        "highlightMonths": [],
        "createdAt": "2023-03-01T10:00:00Z",
        "updatedAt": "2023-03-01T10:00:00Z"
    })
}
