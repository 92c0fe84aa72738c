//! Portfolio P&L table and position upkeep.

use anyhow::Result;
use comfy_table::Cell;

use crate::PositionAction;
use crate::cli::ui;
use crate::config::AppConfig;
use crate::model::{Position, validate_amount};
use crate::portfolio::PortfolioAggregator;
use crate::quote::QuoteResolver;
use crate::store::{DiskStore, RecordStore};

pub async fn show_portfolio(
    store: &DiskStore,
    resolver: &QuoteResolver,
    config: &AppConfig,
) -> Result<()> {
    let positions = store.positions(&config.owner)?;
    if positions.is_empty() {
        println!("No positions yet. Add one with: fintrack position set <SYMBOL> --qty <N> --avg-cost <N>");
        return Ok(());
    }

    let pb = ui::new_spinner("Resolving quotes...");
    let aggregator = PortfolioAggregator::new(resolver, config.quotes.concurrency);
    let summary = aggregator.summarize(&positions).await;
    pb.finish_and_clear();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Qty"),
        ui::header_cell("Avg Cost"),
        ui::header_cell("LTP"),
        ui::header_cell("Invested"),
        ui::header_cell("Value"),
        ui::header_cell("P&L"),
        ui::header_cell("P&L %"),
        ui::header_cell("Status"),
    ]);
    for view in &summary.positions {
        table.add_row(vec![
            Cell::new(&view.symbol),
            Cell::new(view.quantity.to_string()),
            ui::money_cell(view.average_cost),
            ui::price_cell(view.last_price),
            ui::money_cell(view.invested),
            ui::money_cell(view.value),
            ui::change_cell(view.pl),
            ui::change_cell(view.pl_pct),
            ui::status_cell(view.status),
        ]);
    }
    println!("{table}");

    let totals = &summary.totals;
    println!(
        "\n{} invested {:.2}, value {:.2}, P&L {}",
        ui::style_text("Totals:", ui::StyleType::TotalLabel),
        totals.invested,
        totals.value,
        ui::style_text(
            &format!("{:.2} ({:.2}%)", totals.pl, totals.pl_pct),
            ui::StyleType::TotalValue
        ),
    );
    Ok(())
}

pub fn apply_position_action(store: &DiskStore, owner: &str, action: PositionAction) -> Result<()> {
    match action {
        PositionAction::Set {
            symbol,
            name,
            quantity,
            average_cost,
        } => {
            validate_amount(quantity)?;
            validate_amount(average_cost)?;
            let symbol = symbol.trim().to_uppercase();
            store.upsert_position(Position {
                owner_id: owner.to_string(),
                symbol: symbol.clone(),
                name: name.unwrap_or_else(|| symbol.clone()),
                quantity,
                average_cost,
            })?;
            println!("Position {symbol} saved");
            Ok(())
        }
        PositionAction::Remove { symbol } => {
            store.remove_position(owner, symbol.trim().to_uppercase().as_str())?;
            println!("Position {symbol} removed");
            Ok(())
        }
    }
}
