//! Expense logging and spending summaries.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use comfy_table::Cell;
use rust_decimal::Decimal;

use crate::aggregate::{self, Period};
use crate::cli::ui;
use crate::model::{Category, ExpenseRecord, validate_amount};
use crate::store::{DateRange, DiskStore, RecordStore};

fn day_start(date: NaiveDate) -> chrono::DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn next_day_start(date: NaiveDate) -> chrono::DateTime<Utc> {
    day_start(date) + chrono::Duration::days(1)
}

pub fn add_expense(
    store: &DiskStore,
    owner: &str,
    category: &str,
    amount: Decimal,
    note: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let category: Category = category.parse()?;
    validate_amount(amount)?;
    let ts = date.map(day_start).unwrap_or_else(Utc::now);

    store.add_expense(ExpenseRecord {
        owner_id: owner.to_string(),
        category,
        amount,
        ts,
        note: note.unwrap_or_default().to_string(),
    })?;
    println!("Logged {category}: {amount:.2}");
    Ok(())
}

pub fn show_by_category(
    store: &DiskStore,
    owner: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    // An open-ended bound stretches to the epoch/now respectively. The
    // range end is exclusive, so a --to day runs up to the next midnight.
    let range = match (from, to) {
        (None, None) => None,
        (from, to) => Some(DateRange {
            start: from.map(day_start).unwrap_or(chrono::DateTime::UNIX_EPOCH),
            end: to.map(next_day_start).unwrap_or_else(Utc::now),
        }),
    };

    let records = store.expenses(owner, range)?;
    let totals = aggregate::summarize_by_category(&records, None);
    if totals.is_empty() {
        println!("No expenses recorded for this range.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Category"), ui::header_cell("Total")]);
    let mut grand_total = Decimal::ZERO;
    for entry in &totals {
        grand_total += entry.total;
        table.add_row(vec![
            Cell::new(entry.category.to_string()),
            ui::money_cell(entry.total),
        ]);
    }
    println!("{table}");
    println!(
        "\n{} {}",
        ui::style_text("Total:", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{grand_total:.2}"), ui::StyleType::TotalValue)
    );
    Ok(())
}

pub fn show_trend(store: &DiskStore, owner: &str, period: &str) -> Result<()> {
    let period = Period::parse_lenient(period);
    let records = store.expenses(owner, None)?;
    let totals = aggregate::summarize_over_time(&records, period);
    if totals.is_empty() {
        println!("No expenses recorded yet.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Period"), ui::header_cell("Total")]);
    for entry in &totals {
        table.add_row(vec![Cell::new(&entry.period), ui::money_cell(entry.total)]);
    }
    println!("{table}");
    Ok(())
}
