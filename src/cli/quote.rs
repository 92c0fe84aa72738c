//! Quote, history, and watchlist views.

use anyhow::Result;
use comfy_table::Cell;

use crate::cli::ui;
use crate::market::QuoteSource;
use crate::model::WatchItem;
use crate::quote::{HistoryRange, QuoteResolver};
use crate::store::{DiskStore, RecordStore};

fn source_label(source: &QuoteSource) -> String {
    match source {
        QuoteSource::ExchangeFeed => "exchange".to_string(),
        QuoteSource::VendorFeed => "vendor".to_string(),
        QuoteSource::AlternateListing => "vendor (alt listing)".to_string(),
        QuoteSource::Unavailable { reason } => {
            ui::style_text(reason, ui::StyleType::Error)
        }
    }
}

pub async fn show_quote(resolver: &QuoteResolver, symbol: &str) -> Result<()> {
    let quote = resolver.resolve(symbol).await;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Price"),
        ui::header_cell("Change"),
        ui::header_cell("Status"),
        ui::header_cell("Source"),
    ]);
    table.add_row(vec![
        Cell::new(&quote.symbol),
        ui::price_cell(quote.price),
        ui::change_cell(quote.change),
        ui::status_cell(quote.status),
        Cell::new(source_label(&quote.source)),
    ]);
    println!("{table}");
    Ok(())
}

pub async fn show_history(resolver: &QuoteResolver, symbol: &str, range: &str) -> Result<()> {
    let range = HistoryRange::parse_lenient(range);
    let points = resolver.history_points(symbol, range).await;

    if points.is_empty() {
        println!(
            "{}",
            ui::style_text(&format!("No history for {symbol}"), ui::StyleType::Error)
        );
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Time"),
        ui::header_cell("Open"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
        ui::header_cell("Close"),
    ]);
    for point in &points {
        table.add_row(vec![
            Cell::new(point.ts.format("%Y-%m-%d %H:%M").to_string()),
            ui::money_cell(point.open),
            ui::money_cell(point.high),
            ui::money_cell(point.low),
            ui::money_cell(point.close),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn show_watchlist(
    store: &DiskStore,
    resolver: &QuoteResolver,
    owner: &str,
) -> Result<()> {
    let items = store.watchlist(owner)?;
    if items.is_empty() {
        println!("Watchlist is empty. Add one with: fintrack watch add <SYMBOL>");
        return Ok(());
    }

    let pb = ui::new_spinner("Resolving quotes...");
    let symbols: Vec<String> = items.iter().map(|w| w.symbol.clone()).collect();
    let quotes = resolver.resolve_many(&symbols).await;
    pb.finish_and_clear();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Price"),
        ui::header_cell("Change"),
        ui::header_cell("Status"),
    ]);
    for (item, quote) in items.iter().zip(quotes) {
        table.add_row(vec![
            Cell::new(&item.symbol),
            Cell::new(&item.name),
            ui::price_cell(quote.price),
            ui::change_cell(quote.change),
            ui::status_cell(quote.status),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn add_watch(store: &DiskStore, owner: &str, symbol: &str, name: Option<&str>) -> Result<()> {
    let symbol = symbol.trim().to_uppercase();
    store.add_watch(WatchItem {
        owner_id: owner.to_string(),
        symbol: symbol.clone(),
        name: name.unwrap_or(&symbol).to_string(),
    })?;
    println!("Added {symbol} to watchlist");
    Ok(())
}

pub fn remove_watch(store: &DiskStore, owner: &str, symbol: &str) -> Result<()> {
    store.remove_watch(owner, symbol.trim().to_uppercase().as_str())?;
    println!("Removed {symbol} from watchlist");
    Ok(())
}
