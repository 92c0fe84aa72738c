//! Reminder delivery through an HTTPS mail API.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reminder(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// Sends mail through a Resend-style HTTPS API (`POST {base}/emails` with a
/// bearer key). Works anywhere outbound SMTP is blocked.
pub struct MailApiNotifier {
    base_url: String,
    api_key: String,
    sender: String,
    client: reqwest::Client,
}

impl MailApiNotifier {
    pub fn new(base_url: &str, api_key: &str, sender: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build mail API client")?;
        Ok(MailApiNotifier {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            sender: sender.to_string(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for MailApiNotifier {
    async fn send_reminder(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let url = format!("{}/emails", self.base_url);
        debug!(%to, %subject, "Sending reminder via mail API");

        let payload = MailPayload {
            from: format!("Fintrack <{}>", self.sender),
            to: [to],
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Mail API request failed for {to}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Mail API error {status}: {detail}"));
        }
        Ok(())
    }
}
