//! Domain types shared across the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::amortize;
use crate::error::CoreError;

/// Closed set of expense categories. Anything outside this list is rejected
/// at the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Food,
    Travel,
    Shopping,
    Bills,
    Rent,
    Entertainment,
    Health,
    Groceries,
    Education,
    Other,
    Income,
    Investments,
    Savings,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Food,
        Category::Travel,
        Category::Shopping,
        Category::Bills,
        Category::Rent,
        Category::Entertainment,
        Category::Health,
        Category::Groceries,
        Category::Education,
        Category::Other,
        Category::Income,
        Category::Investments,
        Category::Savings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Rent => "Rent",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Groceries => "Groceries",
            Category::Education => "Education",
            Category::Other => "Other",
            Category::Income => "Income",
            Category::Investments => "Investments",
            Category::Savings => "Savings",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| CoreError::validation(format!("invalid category: {s}")))
    }
}

/// A single dated monetary record. Immutable once it has been aggregated
/// over; owned by the record store and passed into the engine by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub owner_id: String,
    pub category: Category,
    pub amount: Decimal,
    pub ts: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}

/// Rejects non-positive amounts at the write path.
pub fn validate_amount(amount: Decimal) -> Result<(), CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationStatus {
    Pending,
    Paid,
}

/// A single EMI obligation with a due date. Lighter than a [`Loan`]; the
/// reminder selectors operate on these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub owner_id: String,
    pub title: String,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub status: ObligationStatus,
}

impl Obligation {
    pub fn is_pending(&self) -> bool {
        self.status == ObligationStatus::Pending
    }
}

/// A loan with a derived installment amount.
///
/// `installment` is a cache of `amortize::installment` over the other three
/// numeric fields. It is recomputed on every construction and terms change;
/// there is no way to set it independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub principal: Decimal,
    pub annual_rate_percent: Decimal,
    pub tenure_months: u32,
    pub start_date: DateTime<Utc>,
    installment: Decimal,
}

impl Loan {
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        principal: Decimal,
        annual_rate_percent: Decimal,
        tenure_months: u32,
        start_date: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let installment = amortize::installment(principal, annual_rate_percent, tenure_months)?;
        Ok(Loan {
            owner_id: owner_id.into(),
            title: title.into(),
            description: description.into(),
            principal,
            annual_rate_percent,
            tenure_months,
            start_date,
            installment,
        })
    }

    pub fn installment(&self) -> Decimal {
        self.installment
    }

    /// Patches any of the terms that affect the installment and recomputes
    /// it. Validation failures leave the loan untouched.
    pub fn update_terms(
        &mut self,
        principal: Option<Decimal>,
        annual_rate_percent: Option<Decimal>,
        tenure_months: Option<u32>,
    ) -> Result<(), CoreError> {
        let principal = principal.unwrap_or(self.principal);
        let rate = annual_rate_percent.unwrap_or(self.annual_rate_percent);
        let tenure = tenure_months.unwrap_or(self.tenure_months);
        let installment = amortize::installment(principal, rate, tenure)?;
        self.principal = principal;
        self.annual_rate_percent = rate;
        self.tenure_months = tenure;
        self.installment = installment;
        Ok(())
    }
}

/// A held position, unique per (owner_id, symbol). Mutation is an upsert
/// keyed on that pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub owner_id: String,
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
}

/// A watchlist entry: just a symbol plus a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchItem {
    pub owner_id: String,
    pub symbol: String,
    pub name: String,
}
