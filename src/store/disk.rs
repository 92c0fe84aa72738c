//! Disk-backed record store: a single JSON ledger file per data directory.
//!
//! Writes are whole-file rewrites through a temp file; the ledger is small
//! (one user's records) so durability beats cleverness here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use super::{DateRange, RecordStore};
use crate::error::CoreError;
use crate::model::{ExpenseRecord, Loan, Obligation, ObligationStatus, Position, WatchItem};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Ledger {
    #[serde(default)]
    expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    positions: Vec<Position>,
    #[serde(default)]
    obligations: Vec<Obligation>,
    #[serde(default)]
    watchlist: Vec<WatchItem>,
    #[serde(default)]
    loans: Vec<Loan>,
}

pub struct DiskStore {
    path: PathBuf,
    ledger: RwLock<Ledger>,
}

impl DiskStore {
    /// Opens (or creates) the ledger at `dir/ledger.json`.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        let path = dir.join("ledger.json");
        let ledger = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read ledger: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse ledger: {}", path.display()))?
        } else {
            Ledger::default()
        };
        debug!("Opened ledger at {}", path.display());
        Ok(DiskStore {
            path,
            ledger: RwLock::new(ledger),
        })
    }

    fn persist(&self, ledger: &Ledger) -> Result<()> {
        let raw = serde_json::to_string_pretty(ledger)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .with_context(|| format!("Failed to write ledger: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace ledger: {}", self.path.display()))?;
        Ok(())
    }

    pub fn add_expense(&self, record: ExpenseRecord) -> Result<()> {
        let mut ledger = self.ledger.write().unwrap();
        ledger.expenses.push(record);
        self.persist(&ledger)
    }

    /// Upserts a position keyed on (owner, symbol): last writer wins.
    pub fn upsert_position(&self, position: Position) -> Result<()> {
        let mut ledger = self.ledger.write().unwrap();
        match ledger
            .positions
            .iter_mut()
            .find(|p| p.owner_id == position.owner_id && p.symbol == position.symbol)
        {
            Some(existing) => *existing = position,
            None => ledger.positions.push(position),
        }
        self.persist(&ledger)
    }

    pub fn remove_position(&self, owner: &str, symbol: &str) -> Result<()> {
        let mut ledger = self.ledger.write().unwrap();
        let before = ledger.positions.len();
        ledger
            .positions
            .retain(|p| !(p.owner_id == owner && p.symbol == symbol));
        if ledger.positions.len() == before {
            return Err(CoreError::not_found("position", symbol).into());
        }
        self.persist(&ledger)
    }

    pub fn add_obligation(&self, obligation: Obligation) -> Result<()> {
        let mut ledger = self.ledger.write().unwrap();
        ledger.obligations.push(obligation);
        self.persist(&ledger)
    }

    pub fn mark_obligation_paid(&self, owner: &str, title: &str) -> Result<()> {
        let mut ledger = self.ledger.write().unwrap();
        let Some(obligation) = ledger
            .obligations
            .iter_mut()
            .find(|o| o.owner_id == owner && o.title == title)
        else {
            return Err(CoreError::not_found("obligation", title).into());
        };
        obligation.status = ObligationStatus::Paid;
        self.persist(&ledger)
    }

    pub fn add_watch(&self, item: WatchItem) -> Result<()> {
        let mut ledger = self.ledger.write().unwrap();
        // Watchlist membership is a set over (owner, symbol).
        if !ledger
            .watchlist
            .iter()
            .any(|w| w.owner_id == item.owner_id && w.symbol == item.symbol)
        {
            ledger.watchlist.push(item);
        }
        self.persist(&ledger)
    }

    pub fn remove_watch(&self, owner: &str, symbol: &str) -> Result<()> {
        let mut ledger = self.ledger.write().unwrap();
        let before = ledger.watchlist.len();
        ledger
            .watchlist
            .retain(|w| !(w.owner_id == owner && w.symbol == symbol));
        if ledger.watchlist.len() == before {
            return Err(CoreError::not_found("watchlist entry", symbol).into());
        }
        self.persist(&ledger)
    }

    pub fn add_loan(&self, loan: Loan) -> Result<()> {
        let mut ledger = self.ledger.write().unwrap();
        ledger.loans.push(loan);
        self.persist(&ledger)
    }
}

impl RecordStore for DiskStore {
    fn expenses(&self, owner: &str, range: Option<DateRange>) -> Result<Vec<ExpenseRecord>> {
        Ok(self
            .ledger
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
            .ledger
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
            .ledger
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
            .ledger
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
            .ledger
            .read()
            .unwrap()
            .loans
            .iter()
            .filter(|l| l.owner_id == owner)
            .cloned()
            .collect())
    }
}
