use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;

use crate::market::QuoteStatus;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned cell for a monetary amount, two decimals.
pub fn money_cell(amount: Decimal) -> Cell {
    Cell::new(format!("{:.2}", amount.round_dp(2))).set_alignment(CellAlignment::Right)
}

/// Formats an `Option<Decimal>` price; `None` renders as a red "N/A".
pub fn price_cell(price: Option<Decimal>) -> Cell {
    match price {
        Some(price) => money_cell(price),
        None => Cell::new("N/A")
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right),
    }
}

/// Signed change with color coding.
pub fn change_cell(change: Decimal) -> Cell {
    let rounded = change.round_dp(2);
    let text = if rounded.is_sign_negative() {
        format!("{rounded:.2}")
    } else {
        format!("+{rounded:.2}")
    };
    let color = if change < Decimal::ZERO {
        Color::Red
    } else {
        Color::Green
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

/// Quote status tick, color coded.
pub fn status_cell(status: QuoteStatus) -> Cell {
    let color = match status {
        QuoteStatus::Up => Color::Green,
        QuoteStatus::Down => Color::Red,
        QuoteStatus::Flat => Color::DarkGrey,
    };
    Cell::new(status.to_string()).fg(color)
}

/// Creates a spinner for batch operations without per-item progress.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}
