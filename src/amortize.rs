//! Loan amortization: fixed installment (EMI) amount and repayment schedule.

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;

const MONTHS_PER_YEAR_PCT: Decimal = Decimal::from_parts(1200, 0, 0, false, 0);

fn validate_terms(
    principal: Decimal,
    annual_rate_percent: Decimal,
    tenure_months: u32,
) -> Result<(), CoreError> {
    if principal <= Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "principal must be positive, got {principal}"
        )));
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "interest rate must not be negative, got {annual_rate_percent}"
        )));
    }
    if tenure_months == 0 {
        return Err(CoreError::validation(
            "tenure must be at least one month".to_string(),
        ));
    }
    Ok(())
}

/// `(1 + r)^n` by repeated multiplication, keeping the arithmetic exact
/// within Decimal's 28-digit precision. Tenures are small integers so this
/// beats a float pow round trip. `None` when the growth factor no longer
/// fits a `Decimal` (absurd rate/tenure combinations).
fn compound(monthly_rate: Decimal, tenure_months: u32) -> Option<Decimal> {
    let base = Decimal::ONE + monthly_rate;
    let mut acc = Decimal::ONE;
    for _ in 0..tenure_months {
        acc = acc.checked_mul(base)?;
    }
    Some(acc)
}

/// Computes the fixed monthly installment for a loan.
///
/// The monthly periodic rate is `annual_rate_percent / 100 / 12`. A zero
/// rate means an interest-free loan: the principal divides evenly across
/// the tenure. Otherwise the standard annuity formula applies:
/// `P * r * (1+r)^n / ((1+r)^n - 1)`. The result is rounded to two decimal
/// places; everything before that stays at full precision.
pub fn installment(
    principal: Decimal,
    annual_rate_percent: Decimal,
    tenure_months: u32,
) -> Result<Decimal, CoreError> {
    validate_terms(principal, annual_rate_percent, tenure_months)?;

    let r = annual_rate_percent / MONTHS_PER_YEAR_PCT;
    if r.is_zero() {
        return Ok((principal / Decimal::from(tenure_months)).round_dp(2));
    }

    let overflow = || {
        CoreError::validation(format!(
            "loan terms exceed exact arithmetic range: {annual_rate_percent}% over {tenure_months} months"
        ))
    };
    let growth = compound(r, tenure_months).ok_or_else(overflow)?;
    let amount = principal
        .checked_mul(r)
        .and_then(|numerator| numerator.checked_mul(growth))
        .and_then(|numerator| numerator.checked_div(growth - Decimal::ONE))
        .ok_or_else(overflow)?;
    Ok(amount.round_dp(2))
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    /// 1-based installment number.
    pub period: u32,
    pub due_date: DateTime<Utc>,
    pub interest: Decimal,
    pub principal_component: Decimal,
    /// Outstanding principal after this installment.
    pub balance: Decimal,
}

/// Derives the full repayment schedule for a loan starting at `start_date`.
///
/// Each row splits the installment into interest on the outstanding balance
/// and a principal component. The final row clears the balance exactly, so
/// its principal component absorbs any accumulated rounding residue.
pub fn schedule(
    principal: Decimal,
    annual_rate_percent: Decimal,
    tenure_months: u32,
    start_date: DateTime<Utc>,
) -> Result<Vec<ScheduleEntry>, CoreError> {
    let amount = installment(principal, annual_rate_percent, tenure_months)?;
    let r = annual_rate_percent / MONTHS_PER_YEAR_PCT;

    let mut rows = Vec::with_capacity(tenure_months as usize);
    let mut balance = principal;
    for period in 1..=tenure_months {
        let interest = (balance * r).round_dp(2);
        let principal_component = if period == tenure_months {
            balance
        } else {
            amount - interest
        };
        balance -= principal_component;
        rows.push(ScheduleEntry {
            period,
            due_date: start_date + Months::new(period),
            interest,
            principal_component,
            balance,
        });
    }
    Ok(rows)
}
