//! Loan math, EMI tracking, and reminder dispatch.

use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveTime, Utc};
use comfy_table::Cell;
use rust_decimal::Decimal;

use crate::amortize;
use crate::cli::ui;
use crate::config::AppConfig;
use crate::model::{Loan, Obligation, ObligationStatus, validate_amount};
use crate::notify::MailApiNotifier;
use crate::reminders;
use crate::store::{DiskStore, RecordStore};

/// Prints the installment for the given terms, optionally with the full
/// repayment schedule, and saves the loan when a title is given.
pub fn new_loan(
    store: &DiskStore,
    owner: &str,
    principal: Decimal,
    rate: Decimal,
    tenure: u32,
    with_schedule: bool,
    save: Option<&str>,
) -> Result<()> {
    show_loan_terms(principal, rate, tenure, with_schedule)?;
    if let Some(title) = save {
        let loan = Loan::new(owner, title, "", principal, rate, tenure, Utc::now())?;
        store.add_loan(loan)?;
        println!("Saved loan '{title}'");
    }
    Ok(())
}

pub fn list_loans(store: &DiskStore, owner: &str) -> Result<()> {
    let loans = store.loans(owner)?;
    if loans.is_empty() {
        println!("No saved loans. Add one with: fintrack loan new --save <TITLE> ...");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Title"),
        ui::header_cell("Principal"),
        ui::header_cell("Rate %"),
        ui::header_cell("Tenure"),
        ui::header_cell("Installment"),
    ]);
    for loan in &loans {
        table.add_row(vec![
            Cell::new(&loan.title),
            ui::money_cell(loan.principal),
            Cell::new(loan.annual_rate_percent.to_string()),
            Cell::new(format!("{} mo", loan.tenure_months)),
            ui::money_cell(loan.installment()),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn show_loan_terms(
    principal: Decimal,
    rate: Decimal,
    tenure: u32,
    with_schedule: bool,
) -> Result<()> {
    let installment = amortize::installment(principal, rate, tenure)?;
    println!(
        "Monthly installment for {principal:.2} at {rate}% over {tenure} months: {}",
        ui::style_text(&format!("{installment:.2}"), ui::StyleType::TotalValue)
    );

    if with_schedule {
        let rows = amortize::schedule(principal, rate, tenure, Utc::now())?;
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Due"),
            ui::header_cell("Interest"),
            ui::header_cell("Principal"),
            ui::header_cell("Balance"),
        ]);
        for row in &rows {
            table.add_row(vec![
                Cell::new(row.period.to_string()),
                Cell::new(row.due_date.format("%Y-%m-%d").to_string()),
                ui::money_cell(row.interest),
                ui::money_cell(row.principal_component),
                ui::money_cell(row.balance),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}

pub fn add_emi(
    store: &DiskStore,
    owner: &str,
    title: &str,
    amount: Decimal,
    due: NaiveDate,
) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        bail!("EMI title must not be empty");
    }
    validate_amount(amount)?;

    store.add_obligation(Obligation {
        owner_id: owner.to_string(),
        title: title.to_string(),
        amount,
        due_date: due.and_time(NaiveTime::MIN).and_utc(),
        status: ObligationStatus::Pending,
    })?;
    println!("EMI '{title}' due {due} saved");
    Ok(())
}

pub fn mark_paid(store: &DiskStore, owner: &str, title: &str) -> Result<()> {
    store.mark_obligation_paid(owner, title)?;
    println!("EMI '{title}' marked paid");
    Ok(())
}

pub fn show_due(store: &DiskStore, owner: &str, horizon_days: i64) -> Result<()> {
    let obligations = store.obligations(owner)?;
    let due = reminders::due_soon(&obligations, Utc::now(), horizon_days);
    if due.is_empty() {
        println!("Nothing due in the next {horizon_days} days.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Title"),
        ui::header_cell("Amount"),
        ui::header_cell("Due"),
    ]);
    for obligation in &due {
        table.add_row(vec![
            Cell::new(&obligation.title),
            ui::money_cell(obligation.amount),
            Cell::new(obligation.due_date.format("%Y-%m-%d").to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn send_reminders(store: &DiskStore, config: &AppConfig, email: &str) -> Result<()> {
    // Cheap shape check; real validation belongs to the mail API.
    if !email.contains('@') {
        bail!("valid email required, got '{email}'");
    }
    let Some(api_key) = config.notifier.resolved_api_key() else {
        bail!("notifier api_key not configured (set it in config or RESEND_API_KEY)");
    };

    let notifier = MailApiNotifier::new(&config.notifier.base_url, &api_key, &config.notifier.sender)?;
    let obligations = store.obligations(&config.owner)?;
    let report = reminders::send_due_reminders(
        &notifier,
        &obligations,
        Utc::now(),
        config.reminders.lead_days,
        email,
    )
    .await;

    println!("Reminders sent: {}, failed: {}", report.sent, report.failed);
    Ok(())
}
