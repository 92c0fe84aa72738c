//! The record store collaborator: reads for the engine, thin CRUD for the
//! CLI.

pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::model::{ExpenseRecord, Loan, Obligation, Position, WatchItem};

/// Half-open timestamp range filter `[start, end)`. An exclusive upper
/// bound lets a calendar day be covered by the next day's midnight without
/// losing sub-second timestamps in the final second.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}


/// Read interface the engine depends on. Amounts and instants come back
/// already normalized (exact decimals, UTC).
pub trait RecordStore: Send + Sync {
    fn expenses(&self, owner: &str, range: Option<DateRange>) -> Result<Vec<ExpenseRecord>>;
    fn positions(&self, owner: &str) -> Result<Vec<Position>>;
    fn obligations(&self, owner: &str) -> Result<Vec<Obligation>>;
    fn watchlist(&self, owner: &str) -> Result<Vec<WatchItem>>;
    fn loans(&self, owner: &str) -> Result<Vec<Loan>>;
}
