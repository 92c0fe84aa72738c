use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fintrack::log::init_logging;
use fintrack::{AppCommand, EmiAction, LoanAction, PositionAction, WatchAction};
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Resolve a live quote for a symbol
    Quote { symbol: String },
    /// Show OHLC history for a symbol
    History {
        symbol: String,
        /// One of 1d, 1w, 1mo
        #[arg(long, default_value = "1mo")]
        range: String,
    },
    /// Show or edit the watchlist
    Watch {
        #[command(subcommand)]
        action: Option<WatchCommands>,
    },
    /// Show portfolio P&L
    Portfolio,
    /// Create, update, or remove a position
    Position {
        #[command(subcommand)]
        action: PositionCommands,
    },
    /// Summarize spending by category
    Spend {
        /// Start date (YYYY-MM-DD), inclusive
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Summarize spending over time
    Trend {
        /// One of day, week, month
        #[arg(long, default_value = "month")]
        period: String,
    },
    /// Log an expense
    Expense {
        category: String,
        amount: Decimal,
        #[arg(long)]
        note: Option<String>,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Loan amortization math
    Loan {
        #[command(subcommand)]
        action: LoanCommands,
    },
    /// Track EMI obligations and reminders
    Emi {
        #[command(subcommand)]
        action: EmiCommands,
    },
}

#[derive(Subcommand)]
enum WatchCommands {
    /// Add a symbol to the watchlist
    Add {
        symbol: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a symbol from the watchlist
    Rm { symbol: String },
}

#[derive(Subcommand)]
enum PositionCommands {
    /// Upsert a position (keyed on symbol)
    Set {
        symbol: String,
        #[arg(long)]
        qty: Decimal,
        #[arg(long)]
        avg_cost: Decimal,
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a position
    Rm { symbol: String },
}

#[derive(Subcommand)]
enum LoanCommands {
    /// Compute the monthly installment for loan terms
    New {
        #[arg(long)]
        principal: Decimal,
        /// Annual interest rate, percent
        #[arg(long)]
        rate: Decimal,
        /// Tenure in months
        #[arg(long)]
        tenure: u32,
        /// Also print the full repayment schedule
        #[arg(long)]
        schedule: bool,
        /// Persist the loan in the ledger under this title
        #[arg(long)]
        save: Option<String>,
    },
    /// List saved loans
    List,
}

#[derive(Subcommand)]
enum EmiCommands {
    /// Add an EMI obligation
    Add {
        title: String,
        #[arg(long)]
        amount: Decimal,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,
    },
    /// Mark an EMI paid
    Paid { title: String },
    /// List EMIs due soon
    Due,
    /// Email reminders for EMIs landing in the scheduled slot
    Remind {
        #[arg(long)]
        email: String,
    },
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Setup => unreachable!("Setup command should be handled separately"),
            Commands::Quote { symbol } => AppCommand::Quote { symbol },
            Commands::History { symbol, range } => AppCommand::History { symbol, range },
            Commands::Watch { action } => AppCommand::Watch(match action {
                None => WatchAction::Show,
                Some(WatchCommands::Add { symbol, name }) => WatchAction::Add { symbol, name },
                Some(WatchCommands::Rm { symbol }) => WatchAction::Remove { symbol },
            }),
            Commands::Portfolio => AppCommand::Portfolio,
            Commands::Position { action } => AppCommand::Position(match action {
                PositionCommands::Set {
                    symbol,
                    qty,
                    avg_cost,
                    name,
                } => PositionAction::Set {
                    symbol,
                    name,
                    quantity: qty,
                    average_cost: avg_cost,
                },
                PositionCommands::Rm { symbol } => PositionAction::Remove { symbol },
            }),
            Commands::Spend { from, to } => AppCommand::Spend { from, to },
            Commands::Trend { period } => AppCommand::Trend { period },
            Commands::Expense {
                category,
                amount,
                note,
                date,
            } => AppCommand::Expense {
                category,
                amount,
                note,
                date,
            },
            Commands::Loan { action } => AppCommand::Loan(match action {
                LoanCommands::New {
                    principal,
                    rate,
                    tenure,
                    schedule,
                    save,
                } => LoanAction::New {
                    principal,
                    rate,
                    tenure,
                    schedule,
                    save,
                },
                LoanCommands::List => LoanAction::List,
            }),
            Commands::Emi { action } => AppCommand::Emi(match action {
                EmiCommands::Add { title, amount, due } => EmiAction::Add { title, amount, due },
                EmiCommands::Paid { title } => EmiAction::Paid { title },
                EmiCommands::Due => EmiAction::Due,
                EmiCommands::Remind { email } => EmiAction::Remind { email },
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => fintrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> Result<()> {
    use anyhow::Context;

    let path = fintrack::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
owner: "default"

providers:
  exchange:
    base_url: "https://www.nseindia.com"
  vendor:
    base_url: "https://query1.finance.yahoo.com"

quotes:
  source_timeout_secs: 10
  concurrency: 4

reminders:
  lead_days: 3
  horizon_days: 3

notifier:
  base_url: "https://api.resend.com"
  sender: "no-reply@onresend.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
