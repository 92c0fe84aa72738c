//! Aggregation of dated monetary records into categorical and time-bucketed
//! summaries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{Category, ExpenseRecord};

/// Calendar bucketing granularity for [`summarize_over_time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// Lenient parse: unrecognized values fall back to `Month`. This is a
    /// deliberate policy for the period knob only; every other input is
    /// validated strictly.
    pub fn parse_lenient(s: &str) -> Period {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Period::Day,
            "week" => Period::Week,
            _ => Period::Month,
        }
    }

    /// Deterministic bucket key for a timestamp. Lexicographic order over
    /// these formats is chronological, so buckets sort as plain strings.
    pub fn bucket_key(&self, ts: DateTime<Utc>) -> String {
        match self {
            Period::Day => ts.format("%Y-%m-%d").to_string(),
            // ISO-8601 week numbering: Monday start, week 01 holds the
            // year's first Thursday.
            Period::Week => ts.format("%G-W%V").to_string(),
            Period::Month => ts.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub period: String,
    pub total: Decimal,
}

/// Groups records by category and sums amounts, optionally restricted to an
/// inclusive `[start, end]` timestamp range.
///
/// Categories with no matching records are omitted. Output is sorted
/// descending by total, with the category name as a deterministic tiebreak.
/// Empty input yields an empty vec.
pub fn summarize_by_category(
    records: &[ExpenseRecord],
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<Category, Decimal> = BTreeMap::new();
    for record in records {
        if let Some((start, end)) = range {
            if record.ts < start || record.ts > end {
                continue;
            }
        }
        *totals.entry(record.category).or_insert(Decimal::ZERO) += record.amount;
    }

    let mut out: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category,
            total: total.round_dp(2),
        })
        .collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.name().cmp(b.category.name())));
    out
}

/// Groups records into calendar buckets and sums amounts per bucket.
///
/// Output is sorted ascending by bucket key. Empty input yields an empty
/// vec.
pub fn summarize_over_time(records: &[ExpenseRecord], period: Period) -> Vec<PeriodTotal> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for record in records {
        *totals
            .entry(period.bucket_key(record.ts))
            .or_insert(Decimal::ZERO) += record.amount;
    }

    totals
        .into_iter()
        .map(|(period, total)| PeriodTotal {
            period,
            total: total.round_dp(2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record(category: Category, amount: Decimal, ts: &str) -> ExpenseRecord {
        ExpenseRecord {
            owner_id: "u1".to_string(),
            category,
            amount,
            ts: ts.parse().unwrap(),
            note: String::new(),
        }
    }

    fn sample_records() -> Vec<ExpenseRecord> {
        vec![
            record(Category::Food, dec!(120.50), "2024-03-05T10:00:00Z"),
            record(Category::Food, dec!(80.25), "2024-03-20T18:30:00Z"),
            record(Category::Rent, dec!(15000), "2024-03-01T00:00:00Z"),
            record(Category::Travel, dec!(450), "2024-04-02T09:00:00Z"),
        ]
    }

    #[test]
    fn test_category_summary_sorted_descending() {
        let totals = summarize_by_category(&sample_records(), None);
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].category, Category::Rent);
        assert_eq!(totals[0].total, dec!(15000));
        assert_eq!(totals[1].category, Category::Travel);
        assert_eq!(totals[2].category, Category::Food);
        assert_eq!(totals[2].total, dec!(200.75));
    }

    #[test]
    fn test_category_summary_respects_inclusive_range() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let totals = summarize_by_category(&sample_records(), Some((start, end)));
        // Travel falls in April and is filtered out; Rent sits exactly on
        // the lower bound and stays in.
        assert_eq!(totals.len(), 2);
        assert!(totals.iter().all(|t| t.category != Category::Travel));
        assert!(totals.iter().any(|t| t.category == Category::Rent));
    }

    #[test]
    fn test_category_summary_order_independent() {
        let records = sample_records();
        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(
            summarize_by_category(&records, None),
            summarize_by_category(&reversed, None)
        );
    }

    #[test]
    fn test_category_totals_round_trip_sum() {
        let records = sample_records();
        let input_sum: Decimal = records.iter().map(|r| r.amount).sum();
        let output_sum: Decimal = summarize_by_category(&records, None)
            .iter()
            .map(|t| t.total)
            .sum();
        assert_eq!(input_sum, output_sum);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(summarize_by_category(&[], None).is_empty());
        assert!(summarize_over_time(&[], Period::Month).is_empty());
    }

    #[test]
    fn test_monthly_buckets() {
        let records = vec![
            record(Category::Food, dec!(100), "2024-03-05T00:00:00Z"),
            record(Category::Travel, dec!(50), "2024-03-20T00:00:00Z"),
        ];
        let totals = summarize_over_time(&records, Period::Month);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].period, "2024-03");
        assert_eq!(totals[0].total, dec!(150));
    }

    #[test]
    fn test_daily_buckets_sorted_ascending() {
        let records = vec![
            record(Category::Food, dec!(10), "2024-03-20T10:00:00Z"),
            record(Category::Food, dec!(20), "2024-03-05T10:00:00Z"),
            record(Category::Food, dec!(30), "2024-03-05T22:00:00Z"),
        ];
        let totals = summarize_over_time(&records, Period::Day);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].period, "2024-03-05");
        assert_eq!(totals[0].total, dec!(50));
        assert_eq!(totals[1].period, "2024-03-20");
    }

    #[test]
    fn test_iso_week_buckets() {
        // 2024-01-01 is a Monday, ISO week 2024-W01. 2023-01-01 is a
        // Sunday and belongs to ISO week 2022-W52.
        let records = vec![
            record(Category::Bills, dec!(5), "2024-01-01T00:00:00Z"),
            record(Category::Bills, dec!(7), "2023-01-01T00:00:00Z"),
        ];
        let totals = summarize_over_time(&records, Period::Week);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].period, "2022-W52");
        assert_eq!(totals[1].period, "2024-W01");
    }

    #[test]
    fn test_period_lenient_parse() {
        assert_eq!(Period::parse_lenient("day"), Period::Day);
        assert_eq!(Period::parse_lenient("Week"), Period::Week);
        assert_eq!(Period::parse_lenient("month"), Period::Month);
        assert_eq!(Period::parse_lenient("fortnight"), Period::Month);
        assert_eq!(Period::parse_lenient(""), Period::Month);
    }

    #[test]
    fn test_summation_has_no_float_drift() {
        // Thousands of 0.10 records must sum exactly.
        let records: Vec<ExpenseRecord> = (0..5000)
            .map(|i| {
                record(
                    Category::Other,
                    dec!(0.10),
                    &format!("2024-01-{:02}T00:00:00Z", (i % 28) + 1),
                )
            })
            .collect();
        let totals = summarize_by_category(&records, None);
        assert_eq!(totals[0].total, dec!(500.00));
    }
}
