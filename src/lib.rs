pub mod aggregate;
pub mod amortize;
pub mod cli;
pub mod config;
pub mod error;
pub mod log;
pub mod market;
pub mod model;
pub mod notify;
pub mod portfolio;
pub mod providers;
pub mod quote;
pub mod reminders;
pub mod store;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::quote::QuoteResolver;
use crate::store::DiskStore;

#[derive(Debug, Clone)]
pub enum WatchAction {
    Show,
    Add { symbol: String, name: Option<String> },
    Remove { symbol: String },
}

#[derive(Debug, Clone)]
pub enum PositionAction {
    Set {
        symbol: String,
        name: Option<String>,
        quantity: Decimal,
        average_cost: Decimal,
    },
    Remove {
        symbol: String,
    },
}

#[derive(Debug, Clone)]
pub enum LoanAction {
    New {
        principal: Decimal,
        rate: Decimal,
        tenure: u32,
        schedule: bool,
        /// Persists the loan under this title when given.
        save: Option<String>,
    },
    List,
}

#[derive(Debug, Clone)]
pub enum EmiAction {
    Add {
        title: String,
        amount: Decimal,
        due: NaiveDate,
    },
    Paid {
        title: String,
    },
    Due,
    Remind {
        email: String,
    },
}

/// Everything the CLI can ask the engine to do.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Quote {
        symbol: String,
    },
    History {
        symbol: String,
        range: String,
    },
    Watch(WatchAction),
    Portfolio,
    Position(PositionAction),
    Spend {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    Trend {
        period: String,
    },
    Expense {
        category: String,
        amount: Decimal,
        note: Option<String>,
        date: Option<NaiveDate>,
    },
    Loan(LoanAction),
    Emi(EmiAction),
}

fn build_resolver(config: &AppConfig) -> Result<QuoteResolver> {
    let exchange_base = config
        .providers
        .exchange
        .as_ref()
        .map_or("https://www.nseindia.com", |p| &p.base_url);
    let vendor_base = config
        .providers
        .vendor
        .as_ref()
        .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);

    let exchange = Arc::new(providers::ExchangeFeedSource::new(exchange_base)?);
    let vendor = Arc::new(providers::VendorFeedSource::new(vendor_base)?);
    Ok(QuoteResolver::new(
        exchange,
        vendor,
        Duration::from_secs(config.quotes.source_timeout_secs),
        config.quotes.concurrency,
    ))
}

fn open_store(config: &AppConfig) -> Result<DiskStore> {
    DiskStore::open(&config.data_path()?)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Fintrack starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Quote { symbol } => {
            let resolver = build_resolver(&config)?;
            cli::quote::show_quote(&resolver, &symbol).await
        }
        AppCommand::History { symbol, range } => {
            let resolver = build_resolver(&config)?;
            cli::quote::show_history(&resolver, &symbol, &range).await
        }
        AppCommand::Watch(action) => {
            let store = open_store(&config)?;
            match action {
                WatchAction::Show => {
                    let resolver = build_resolver(&config)?;
                    cli::quote::show_watchlist(&store, &resolver, &config.owner).await
                }
                WatchAction::Add { symbol, name } => {
                    cli::quote::add_watch(&store, &config.owner, &symbol, name.as_deref())
                }
                WatchAction::Remove { symbol } => {
                    cli::quote::remove_watch(&store, &config.owner, &symbol)
                }
            }
        }
        AppCommand::Portfolio => {
            let resolver = build_resolver(&config)?;
            let store = open_store(&config)?;
            cli::portfolio::show_portfolio(&store, &resolver, &config).await
        }
        AppCommand::Position(action) => {
            let store = open_store(&config)?;
            cli::portfolio::apply_position_action(&store, &config.owner, action)
        }
        AppCommand::Spend { from, to } => {
            let store = open_store(&config)?;
            cli::spend::show_by_category(&store, &config.owner, from, to)
        }
        AppCommand::Trend { period } => {
            let store = open_store(&config)?;
            cli::spend::show_trend(&store, &config.owner, &period)
        }
        AppCommand::Expense {
            category,
            amount,
            note,
            date,
        } => {
            let store = open_store(&config)?;
            cli::spend::add_expense(
                &store,
                &config.owner,
                &category,
                amount,
                note.as_deref(),
                date,
            )
        }
        AppCommand::Loan(action) => {
            let store = open_store(&config)?;
            match action {
                LoanAction::New {
                    principal,
                    rate,
                    tenure,
                    schedule,
                    save,
                } => cli::emi::new_loan(
                    &store,
                    &config.owner,
                    principal,
                    rate,
                    tenure,
                    schedule,
                    save.as_deref(),
                ),
                LoanAction::List => cli::emi::list_loans(&store, &config.owner),
            }
        }
        AppCommand::Emi(action) => {
            let store = open_store(&config)?;
            match action {
                EmiAction::Add { title, amount, due } => {
                    cli::emi::add_emi(&store, &config.owner, &title, amount, due)
                }
                EmiAction::Paid { title } => cli::emi::mark_paid(&store, &config.owner, &title),
                EmiAction::Due => {
                    cli::emi::show_due(&store, &config.owner, config.reminders.horizon_days)
                }
                EmiAction::Remind { email } => {
                    cli::emi::send_reminders(&store, &config, &email).await
                }
            }
        }
    }
}
