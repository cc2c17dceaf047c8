use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::calculations::{
    calculate_health_summary, find_goal_hit, generate_projections, get_final_amount,
    get_highlighted_month_values, GoalHit, HealthSummary,
};
use crate::error::{option_to_result, AppError, AppResult};
use crate::models::{MonthlyProjection, NewReport, Report, ReportUpdate, Snapshot};
use crate::repositories::{ImportSummary, PersistenceStore};
use crate::storage::KeyValueStore;
use crate::util::{Clock, IdGenerator, SystemClock, UuidGenerator};

/// Default upper bound on a report's horizon
pub const DEFAULT_MAX_SIMULATION_YEARS: i32 = 50;

/// Operations the presentation layer drives the engine through
#[async_trait]
pub trait ReportsApi: Send + Sync {
    // Reports
    async fn load_reports(&self) -> AppResult<()>;
    async fn reports(&self) -> Vec<Report>;
    async fn get_report(&self, id: &str) -> Option<Report>;
    async fn create_report(&self, new_report: NewReport) -> AppResult<Report>;
    async fn update_report(&self, id: &str, update: ReportUpdate) -> AppResult<Report>;
    async fn delete_report(&self, id: &str) -> AppResult<()>;
    async fn duplicate_report(&self, id: &str) -> AppResult<Report>;

    // Derived data, computed on demand
    async fn get_projections(&self, report_id: &str) -> AppResult<Vec<MonthlyProjection>>;
    async fn get_goal_hit(&self, report_id: &str) -> AppResult<GoalHit>;
    async fn get_health_summary(&self, report_id: &str) -> AppResult<HealthSummary>;

    // Snapshots
    async fn get_snapshots(&self, report_id: &str) -> Vec<Snapshot>;
    async fn load_snapshots(&self, report_id: &str) -> AppResult<Vec<Snapshot>>;
    async fn get_snapshot(&self, snapshot_id: &str) -> AppResult<Snapshot>;
    async fn create_snapshot(&self, report_id: &str, notes: Option<String>) -> AppResult<Snapshot>;
    async fn delete_snapshot(&self, snapshot_id: &str) -> AppResult<()>;

    // Backup
    async fn export_backup(&self) -> AppResult<String>;
    async fn import_backup(&self, text: &str) -> AppResult<ImportSummary>;
}

/// Stateful façade over the persistence store.
///
/// Holds the report list and the per-report snapshot lists in memory; the
/// store is written before the caches are touched, so a failed write leaves
/// the caches as they were.
pub struct ReportsService<S: KeyValueStore> {
    store: Arc<PersistenceStore<S>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    max_simulation_years: i32,
    reports: RwLock<Vec<Report>>,
    snapshots: RwLock<HashMap<String, Vec<Snapshot>>>,
}

impl<S: KeyValueStore> ReportsService<S> {
    pub fn new(store: Arc<PersistenceStore<S>>) -> Self {
        Self {
            store,
            ids: Arc::new(UuidGenerator),
            clock: Arc::new(SystemClock),
            max_simulation_years: DEFAULT_MAX_SIMULATION_YEARS,
            reports: RwLock::new(Vec::new()),
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Create the service and load the report list
    pub async fn open(store: Arc<PersistenceStore<S>>) -> AppResult<Self> {
        let service = Self::new(store);
        service.load_reports().await?;
        Ok(service)
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_simulation_years(mut self, years: i32) -> Self {
        self.max_simulation_years = years;
        self
    }

    pub fn store(&self) -> &Arc<PersistenceStore<S>> {
        &self.store
    }

    async fn require_report(&self, id: &str) -> AppResult<Report> {
        option_to_result(self.get_report(id).await, &format!("Report {}", id))
    }

    fn validate(&self, report: &Report) -> AppResult<()> {
        if report.name.trim().is_empty() {
            return Err(AppError::ValidationFailed(
                "Report name must not be empty".into(),
            ));
        }

        if report.simulation_years < 1 || report.simulation_years > self.max_simulation_years {
            return Err(AppError::ValidationFailed(format!(
                "Simulation years must be between 1 and {}, got {}",
                self.max_simulation_years, report.simulation_years
            )));
        }

        let negative = report
            .inflow_items
            .iter()
            .chain(report.outflow_items.iter())
            .find(|item| item.amount < Decimal::ZERO);
        if let Some(item) = negative {
            return Err(AppError::ValidationFailed(format!(
                "Amount for '{}' must not be negative",
                item.name
            )));
        }

        Ok(())
    }

    async fn insert_cached_report(&self, report: Report) {
        let mut reports = self.reports.write().await;
        match reports.iter_mut().find(|r| r.id == report.id) {
            Some(existing) => *existing = report,
            None => reports.push(report),
        }
    }
}

#[async_trait]
impl<S: KeyValueStore> ReportsApi for ReportsService<S> {
    async fn load_reports(&self) -> AppResult<()> {
        let loaded = self.store.get_reports().await?;
        info!("Loaded {} reports", loaded.len());
        *self.reports.write().await = loaded;
        Ok(())
    }

    async fn reports(&self) -> Vec<Report> {
        self.reports.read().await.clone()
    }

    async fn get_report(&self, id: &str) -> Option<Report> {
        self.reports.read().await.iter().find(|r| r.id == id).cloned()
    }

    async fn create_report(&self, new_report: NewReport) -> AppResult<Report> {
        let report = new_report.into_report(self.ids.generate(), self.clock.now());
        self.validate(&report)?;

        self.store.save_report(report.clone()).await?;
        self.insert_cached_report(report.clone()).await;

        info!("Created report {} ({})", report.name, report.id);
        Ok(report)
    }

    async fn update_report(&self, id: &str, update: ReportUpdate) -> AppResult<Report> {
        let existing = self.require_report(id).await?;
        let updated = update.apply_to(&existing, self.clock.now());
        self.validate(&updated)?;

        self.store.save_report(updated.clone()).await?;
        self.insert_cached_report(updated.clone()).await;

        info!("Updated report {}", id);
        Ok(updated)
    }

    async fn delete_report(&self, id: &str) -> AppResult<()> {
        self.require_report(id).await?;

        self.store.delete_report(id).await?;
        self.reports.write().await.retain(|r| r.id != id);
        self.snapshots.write().await.remove(id);

        info!("Deleted report {} and its snapshots", id);
        Ok(())
    }

    async fn duplicate_report(&self, id: &str) -> AppResult<Report> {
        let existing = self.require_report(id).await?;
        let now = self.clock.now();
        let duplicate = Report {
            id: self.ids.generate(),
            name: format!("{} (Copy)", existing.name),
            created_at: now,
            updated_at: now,
            ..existing
        };

        self.store.save_report(duplicate.clone()).await?;
        self.insert_cached_report(duplicate.clone()).await;

        info!("Duplicated report {} as {}", id, duplicate.id);
        Ok(duplicate)
    }

    async fn get_projections(&self, report_id: &str) -> AppResult<Vec<MonthlyProjection>> {
        let report = self.require_report(report_id).await?;
        Ok(generate_projections(&report))
    }

    async fn get_goal_hit(&self, report_id: &str) -> AppResult<GoalHit> {
        let report = self.require_report(report_id).await?;
        let projections = generate_projections(&report);
        Ok(find_goal_hit(&projections, report.goal_amount))
    }

    async fn get_health_summary(&self, report_id: &str) -> AppResult<HealthSummary> {
        let report = self.require_report(report_id).await?;
        let projections = generate_projections(&report);
        Ok(calculate_health_summary(&report, Some(&projections)))
    }

    async fn get_snapshots(&self, report_id: &str) -> Vec<Snapshot> {
        self.snapshots
            .read()
            .await
            .get(report_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn load_snapshots(&self, report_id: &str) -> AppResult<Vec<Snapshot>> {
        let loaded = self.store.get_snapshots_by_report(report_id).await?;
        self.snapshots
            .write()
            .await
            .insert(report_id.to_string(), loaded.clone());
        Ok(loaded)
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> AppResult<Snapshot> {
        option_to_result(
            self.store.get_snapshot_by_id(snapshot_id).await?,
            &format!("Snapshot {}", snapshot_id),
        )
    }

    async fn create_snapshot(&self, report_id: &str, notes: Option<String>) -> AppResult<Snapshot> {
        let report = self.require_report(report_id).await?;

        let projections = generate_projections(&report);
        let goal_hit = find_goal_hit(&projections, report.goal_amount);

        let snapshot = Snapshot {
            id: self.ids.generate(),
            report_id: report.id.clone(),
            created_at: self.clock.now(),
            initial_amount_at_snapshot: report.initial_amount,
            annual_rate_at_snapshot: report.annual_rate,
            goal_amount_at_snapshot: report.goal_amount,
            simulation_years_at_snapshot: report.simulation_years,
            goal_hit_month_index: goal_hit.goal_hit_index,
            goal_hit_date: goal_hit.goal_hit_date,
            final_amount_at_end: get_final_amount(&projections),
            highlighted_month_values: get_highlighted_month_values(
                &projections,
                &report.highlight_months,
            ),
            notes,
            projections: Some(projections),
        };

        self.store.save_snapshot(snapshot.clone()).await?;
        self.snapshots
            .write()
            .await
            .entry(report.id.clone())
            .or_default()
            .insert(0, snapshot.clone());

        info!("Created snapshot {} for report {}", snapshot.id, report.id);
        Ok(snapshot)
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> AppResult<()> {
        self.get_snapshot(snapshot_id).await?;
        self.store.delete_snapshot(snapshot_id).await?;

        let mut snapshots = self.snapshots.write().await;
        for list in snapshots.values_mut() {
            list.retain(|s| s.id != snapshot_id);
        }
        snapshots.retain(|_, list| !list.is_empty());

        info!("Deleted snapshot {}", snapshot_id);
        Ok(())
    }

    async fn export_backup(&self) -> AppResult<String> {
        self.store.export_data().await
    }

    async fn import_backup(&self, text: &str) -> AppResult<ImportSummary> {
        let summary = self.store.import_data(text).await.map_err(|e| {
            warn!("Backup import rejected: {}", e);
            e
        })?;

        // Whole state was replaced; rebuild caches from the store
        self.load_reports().await?;
        self.snapshots.write().await.clear();
        Ok(summary)
    }
}
