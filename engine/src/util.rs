//! Small collaborators the engine depends on: ids, time, and month arithmetic

use chrono::{DateTime, Months, NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Produces unique identifiers for reports, items and snapshots
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// UUID v4 identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Source of the current time for `created_at`/`updated_at` stamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that advances one second on every read.
///
/// Gives strictly ordered timestamps for tests and replays.
#[derive(Debug)]
pub struct SteppingClock {
    next: AtomicI64,
}

impl SteppingClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            next: AtomicI64::new(start.timestamp()),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.next.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }
}

/// Add a number of calendar months to a date.
///
/// Days past the end of the target month are clamped to its last day
/// (2024-01-31 + 1 month = 2024-02-29). Saturates at the latest
/// representable date.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
