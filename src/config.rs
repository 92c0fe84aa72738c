use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VendorProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub exchange: Option<ExchangeProviderConfig>,
    pub vendor: Option<VendorProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchange: Some(ExchangeProviderConfig {
                base_url: "https://www.nseindia.com".to_string(),
            }),
            vendor: Some(VendorProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct QuotesConfig {
    /// Per-source timeout for one resolution attempt, seconds.
    pub source_timeout_secs: u64,
    /// Concurrent in-flight resolutions during portfolio/watchlist fan-out.
    pub concurrency: usize,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        QuotesConfig {
            source_timeout_secs: 10,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RemindersConfig {
    /// Days ahead for the scheduled one-day reminder slot.
    pub lead_days: i64,
    /// Lookahead window for the interactive "due soon" query.
    pub horizon_days: i64,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        RemindersConfig {
            lead_days: 3,
            horizon_days: 3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotifierConfig {
    pub base_url: String,
    pub sender: String,
    /// Falls back to the RESEND_API_KEY environment variable when unset.
    pub api_key: Option<String>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig {
            base_url: "https://api.resend.com".to_string(),
            sender: "no-reply@onresend.com".to_string(),
            api_key: None,
        }
    }
}

impl NotifierConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("RESEND_API_KEY").ok())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Profile whose records the CLI operates on.
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub quotes: QuotesConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Overrides the platform data directory (ledger location).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_owner() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            owner: default_owner(),
            providers: ProvidersConfig::default(),
            quotes: QuotesConfig::default(),
            reminders: RemindersConfig::default(),
            notifier: NotifierConfig::default(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// The directory holding the ledger: explicit override or platform
    /// default.
    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_path(),
        }
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
owner: "mugil"
providers:
  exchange:
    base_url: "http://example.com/exchange"
  vendor:
    base_url: "http://example.com/vendor"
quotes:
  source_timeout_secs: 5
  concurrency: 2
reminders:
  lead_days: 2
notifier:
  sender: "alerts@example.com"
  base_url: "http://example.com/mail"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.owner, "mugil");
        assert_eq!(
            config.providers.exchange.unwrap().base_url,
            "http://example.com/exchange"
        );
        assert_eq!(
            config.providers.vendor.unwrap().base_url,
            "http://example.com/vendor"
        );
        assert_eq!(config.quotes.source_timeout_secs, 5);
        assert_eq!(config.quotes.concurrency, 2);
        assert_eq!(config.reminders.lead_days, 2);
        // Unset fields keep their defaults.
        assert_eq!(config.reminders.horizon_days, 3);
        assert_eq!(config.notifier.sender, "alerts@example.com");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("owner: u1").unwrap();
        assert_eq!(config.owner, "u1");
        assert_eq!(
            config.providers.vendor.unwrap().base_url,
            "https://query1.finance.yahoo.com"
        );
        assert_eq!(config.quotes.concurrency, 4);
        assert_eq!(config.reminders.lead_days, 3);
    }
}
