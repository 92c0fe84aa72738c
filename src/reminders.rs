//! Due-date selection for EMI obligations and the reminder batch.
//!
//! Two distinct window semantics exist on purpose: the interactive "due
//! soon" query looks at everything inside an inclusive lookahead window,
//! while the scheduled reminder batch only picks obligations landing in a
//! specific one-day slot a few days out. Unifying them would silently
//! change notification behavior.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::model::Obligation;
use crate::notify::Notifier;

/// Pending obligations due within the inclusive window
/// `[now, now + horizon_days]`, ascending by due date.
pub fn due_soon(obligations: &[Obligation], now: DateTime<Utc>, horizon_days: i64) -> Vec<Obligation> {
    let end = now + Duration::days(horizon_days);
    let mut due: Vec<Obligation> = obligations
        .iter()
        .filter(|o| o.is_pending() && o.due_date >= now && o.due_date <= end)
        .cloned()
        .collect();
    due.sort_by_key(|o| o.due_date);
    due
}

/// Pending obligations due exactly within the one-day slot
/// `[now + lead_days, now + lead_days + 1 day)`, ascending by due date.
/// This is the window the scheduled reminder batch emails about.
pub fn reminder_slot(
    obligations: &[Obligation],
    now: DateTime<Utc>,
    lead_days: i64,
) -> Vec<Obligation> {
    let start = now + Duration::days(lead_days);
    let end = start + Duration::days(1);
    let mut due: Vec<Obligation> = obligations
        .iter()
        .filter(|o| o.is_pending() && o.due_date >= start && o.due_date < end)
        .cloned()
        .collect();
    due.sort_by_key(|o| o.due_date);
    due
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends one reminder per obligation in the slot. A failed send is counted
/// and logged but never stops the rest of the batch. The cadence (daily
/// trigger) belongs to an external scheduler; this function holds no
/// timers.
pub async fn send_due_reminders(
    notifier: &dyn Notifier,
    obligations: &[Obligation],
    now: DateTime<Utc>,
    lead_days: i64,
    to: &str,
) -> ReminderReport {
    let mut report = ReminderReport::default();
    for obligation in reminder_slot(obligations, now, lead_days) {
        let due = obligation.due_date.date_naive();
        let subject = format!("EMI Reminder: {} due on {due}", obligation.title);
        let body = format!(
            "Hey! Your {} of ₹{:.2} is due on {due}. Don't forget to pay on time!",
            obligation.title, obligation.amount
        );
        match notifier.send_reminder(to, &subject, &body).await {
            Ok(()) => {
                info!(title = %obligation.title, %due, "Reminder sent");
                report.sent += 1;
            }
            Err(e) => {
                warn!(title = %obligation.title, error = %e, "Reminder send failed");
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObligationStatus;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    fn obligation(title: &str, due: &str, status: ObligationStatus) -> Obligation {
        Obligation {
            owner_id: "u1".to_string(),
            title: title.to_string(),
            amount: dec!(2500),
            due_date: due.parse().unwrap(),
            status,
        }
    }

    fn now() -> DateTime<Utc> {
        "2024-06-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_due_soon_inclusive_window() {
        let obligations = vec![
            obligation("today", "2024-06-01T12:00:00Z", ObligationStatus::Pending),
            obligation("edge", "2024-06-04T00:00:00Z", ObligationStatus::Pending),
            obligation("late", "2024-06-04T06:00:00Z", ObligationStatus::Pending),
            obligation("past", "2024-05-31T00:00:00Z", ObligationStatus::Pending),
        ];
        let due = due_soon(&obligations, now(), 3);
        let titles: Vec<&str> = due.iter().map(|o| o.title.as_str()).collect();
        // Inclusive upper bound keeps "edge"; "late" at 06:00 is past it.
        assert_eq!(titles, vec!["today", "edge"]);
    }

    #[test]
    fn test_due_soon_excludes_paid() {
        let obligations = vec![
            obligation("paid", "2024-06-02T00:00:00Z", ObligationStatus::Paid),
            obligation("open", "2024-06-02T00:00:00Z", ObligationStatus::Pending),
        ];
        let due = due_soon(&obligations, now(), 3);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "open");
    }

    #[test]
    fn test_reminder_slot_one_day_window() {
        let obligations = vec![
            obligation("in_slot", "2024-06-04T06:00:00Z", ObligationStatus::Pending),
            obligation("slot_start", "2024-06-04T00:00:00Z", ObligationStatus::Pending),
            obligation("after_slot", "2024-06-05T00:00:00Z", ObligationStatus::Pending),
            obligation("before_slot", "2024-06-03T23:59:59Z", ObligationStatus::Pending),
        ];
        let due = reminder_slot(&obligations, now(), 3);
        let titles: Vec<&str> = due.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["slot_start", "in_slot"]);
    }

    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        fail_for: Option<String>,
    }

    impl RecordingNotifier {
        fn new(fail_for: Option<&str>) -> Self {
            RecordingNotifier {
                sent: Mutex::new(Vec::new()),
                fail_for: fail_for.map(str::to_string),
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_reminder(&self, _to: &str, subject: &str, body: &str) -> Result<()> {
            if let Some(fail_for) = &self.fail_for {
                if subject.contains(fail_for.as_str()) {
                    return Err(anyhow!("mail api error 500"));
                }
            }
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reminder_batch_sends_for_slot_only() {
        let notifier = RecordingNotifier::new(None);
        let obligations = vec![
            obligation("Car EMI", "2024-06-04T06:00:00Z", ObligationStatus::Pending),
            obligation("Home EMI", "2024-06-02T00:00:00Z", ObligationStatus::Pending),
        ];
        let report = send_due_reminders(&notifier, &obligations, now(), 3, "a@b.c").await;
        assert_eq!(report, ReminderReport { sent: 1, failed: 0 });

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "EMI Reminder: Car EMI due on 2024-06-04");
        assert!(sent[0].1.contains("₹2500.00"));
    }

    #[tokio::test]
    async fn test_one_failed_send_does_not_stop_the_batch() {
        let notifier = RecordingNotifier::new(Some("Car EMI"));
        let obligations = vec![
            obligation("Car EMI", "2024-06-04T01:00:00Z", ObligationStatus::Pending),
            obligation("Home EMI", "2024-06-04T02:00:00Z", ObligationStatus::Pending),
        ];
        let report = send_due_reminders(&notifier, &obligations, now(), 3, "a@b.c").await;
        assert_eq!(report, ReminderReport { sent: 1, failed: 1 });
    }
}
