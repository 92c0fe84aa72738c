//! In-memory record store, used by tests and as scratch state.

use anyhow::Result;
use std::sync::RwLock;

use super::{DateRange, RecordStore};
use crate::model::{ExpenseRecord, Loan, Obligation, Position, WatchItem};

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Records>,
}

#[derive(Default)]
struct Records {
    expenses: Vec<ExpenseRecord>,
    positions: Vec<Position>,
    obligations: Vec<Obligation>,
    watchlist: Vec<WatchItem>,
    loans: Vec<Loan>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expense(&self, record: ExpenseRecord) {
        self.inner.write().unwrap().expenses.push(record);
    }

    pub fn add_position(&self, position: Position) {
        self.inner.write().unwrap().positions.push(position);
    }

    pub fn add_obligation(&self, obligation: Obligation) {
        self.inner.write().unwrap().obligations.push(obligation);
    }

    pub fn add_watch(&self, item: WatchItem) {
        self.inner.write().unwrap().watchlist.push(item);
    }

    pub fn add_loan(&self, loan: Loan) {
        self.inner.write().unwrap().loans.push(loan);
    }
}

impl RecordStore for MemoryStore {
    fn expenses(&self, owner: &str, range: Option<DateRange>) -> Result<Vec<ExpenseRecord>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .expenses
            .iter()
            .filter(|r| r.owner_id == owner)
            .filter(|r| range.is_none_or(|window| window.contains(r.ts)))
            .cloned()
            .collect())
    }

    fn positions(&self, owner: &str) -> Result<Vec<Position>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .positions
            .iter()
            .filter(|p| p.owner_id == owner)
            .cloned()
            .collect())
    }

    fn obligations(&self, owner: &str) -> Result<Vec<Obligation>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .obligations
            .iter()
            .filter(|o| o.owner_id == owner)
            .cloned()
            .collect())
    }

    fn watchlist(&self, owner: &str) -> Result<Vec<WatchItem>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .watchlist
            .iter()
            .filter(|w| w.owner_id == owner)
            .cloned()
            .collect())
    }

    fn loans(&self, owner: &str) -> Result<Vec<Loan>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .loans
            .iter()
            .filter(|l| l.owner_id == owner)
            .cloned()
            .collect())
    }
}
