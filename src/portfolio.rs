//! Portfolio P&L: combines held positions with resolved quotes.

use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::market::{Quote, QuoteStatus};
use crate::model::Position;
use crate::quote::QuoteResolver;

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// One position with its resolved quote and derived P&L figures. All
/// currency fields are rounded to two decimals at this boundary.
#[derive(Debug, Clone, Serialize)]
pub struct PositionView {
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    /// Last traded price; `None` when no source could resolve the symbol,
    /// in which case the position contributes zero market value.
    pub last_price: Option<Decimal>,
    pub invested: Decimal,
    pub value: Decimal,
    pub pl: Decimal,
    pub pl_pct: Decimal,
    pub status: QuoteStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioTotals {
    pub invested: Decimal,
    pub value: Decimal,
    pub pl: Decimal,
    pub pl_pct: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PortfolioSummary {
    pub positions: Vec<PositionView>,
    pub totals: PortfolioTotals,
}

/// Fans out one quote resolution per position (bounded by the resolver's
/// concurrency limit) and folds the results into per-position and aggregate
/// P&L. Output order matches input order; an unresolved quote degrades its
/// own row to zero market value and never fails the batch.
pub struct PortfolioAggregator<'a> {
    resolver: &'a QuoteResolver,
    concurrency: usize,
}

impl<'a> PortfolioAggregator<'a> {
    pub fn new(resolver: &'a QuoteResolver, concurrency: usize) -> Self {
        PortfolioAggregator {
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn summarize(&self, positions: &[Position]) -> PortfolioSummary {
        // Positions with non-positive quantity or cost are skipped, not
        // errored: they cannot carry meaningful P&L.
        let held: Vec<&Position> = positions
            .iter()
            .filter(|p| p.quantity > Decimal::ZERO && p.average_cost > Decimal::ZERO)
            .collect();

        let quotes: Vec<Quote> = stream::iter(held.iter())
            .map(|position| self.resolver.resolve(&position.symbol))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut views = Vec::with_capacity(held.len());
        let mut total_invested = Decimal::ZERO;
        let mut total_value = Decimal::ZERO;

        for (position, quote) in held.iter().zip(quotes) {
            if !quote.is_resolved() {
                debug!(symbol = %position.symbol, "Position valued at zero: quote unavailable");
            }
            let ltp = quote.price.unwrap_or(Decimal::ZERO);
            let invested = position.quantity * position.average_cost;
            let value = position.quantity * ltp;
            let pl = value - invested;
            let pl_pct = if invested > Decimal::ZERO {
                pl / invested * HUNDRED
            } else {
                Decimal::ZERO
            };

            total_invested += invested;
            total_value += value;

            views.push(PositionView {
                symbol: position.symbol.clone(),
                name: position.name.clone(),
                quantity: position.quantity,
                average_cost: position.average_cost.round_dp(2),
                last_price: quote.price,
                invested: invested.round_dp(2),
                value: value.round_dp(2),
                pl: pl.round_dp(2),
                pl_pct: pl_pct.round_dp(2),
                status: quote.status,
            });
        }

        let total_pl = total_value - total_invested;
        let total_pl_pct = if total_invested > Decimal::ZERO {
            total_pl / total_invested * HUNDRED
        } else {
            Decimal::ZERO
        };

        PortfolioSummary {
            positions: views,
            totals: PortfolioTotals {
                invested: total_invested.round_dp(2),
                value: total_value.round_dp(2),
                pl: total_pl.round_dp(2),
                pl_pct: total_pl_pct.round_dp(2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{LastQuote, MarketDataSource, OhlcPoint};
    use anyhow::Result;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    struct MockExchange {
        quotes: HashMap<String, LastQuote>,
    }

    #[async_trait]
    impl MarketDataSource for MockExchange {
        async fn last_quote(&self, symbol: &str) -> Result<Option<LastQuote>> {
            Ok(self.quotes.get(symbol).copied())
        }

        async fn session_series(&self, _: &str, _: &str, _: &str) -> Result<Vec<OhlcPoint>> {
            Ok(Vec::new())
        }
    }

    struct EmptySource;

    #[async_trait]
    impl MarketDataSource for EmptySource {
        async fn last_quote(&self, _: &str) -> Result<Option<LastQuote>> {
            Ok(None)
        }

        async fn session_series(&self, _: &str, _: &str, _: &str) -> Result<Vec<OhlcPoint>> {
            Ok(Vec::new())
        }
    }

    fn resolver_with(quotes: &[(&str, Decimal, Decimal)]) -> QuoteResolver {
        let quotes = quotes
            .iter()
            .map(|(symbol, price, prev)| {
                (
                    symbol.to_string(),
                    LastQuote {
                        price: *price,
                        previous_close: *prev,
                    },
                )
            })
            .collect();
        QuoteResolver::new(
            Arc::new(MockExchange { quotes }),
            Arc::new(EmptySource),
            Duration::from_secs(2),
            4,
        )
    }

    fn position(symbol: &str, quantity: Decimal, average_cost: Decimal) -> Position {
        Position {
            owner_id: "u1".to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            quantity,
            average_cost,
        }
    }

    #[tokio::test]
    async fn test_single_position_pl() {
        let resolver = resolver_with(&[("ACME", dec!(120), dec!(115))]);
        let aggregator = PortfolioAggregator::new(&resolver, 4);

        let summary = aggregator
            .summarize(&[position("ACME.NS", dec!(10), dec!(100))])
            .await;

        let view = &summary.positions[0];
        assert_eq!(view.invested, dec!(1000));
        assert_eq!(view.value, dec!(1200));
        assert_eq!(view.pl, dec!(200));
        assert_eq!(view.pl_pct, dec!(20.00));
        assert_eq!(view.status, QuoteStatus::Up);
        assert_eq!(summary.totals.invested, dec!(1000));
        assert_eq!(summary.totals.value, dec!(1200));
        assert_eq!(summary.totals.pl, dec!(200));
        assert_eq!(summary.totals.pl_pct, dec!(20.00));
    }

    #[tokio::test]
    async fn test_unresolved_symbol_contributes_zero() {
        let resolver = resolver_with(&[("GOOD", dec!(50), dec!(50))]);
        let aggregator = PortfolioAggregator::new(&resolver, 4);

        let summary = aggregator
            .summarize(&[
                position("GOOD.NS", dec!(2), dec!(40)),
                position("GONE.NS", dec!(5), dec!(10)),
            ])
            .await;

        assert_eq!(summary.positions.len(), 2);
        let gone = &summary.positions[1];
        assert_eq!(gone.last_price, None);
        assert_eq!(gone.value, Decimal::ZERO);
        assert_eq!(gone.pl, dec!(-50));
        assert_eq!(gone.pl_pct, dec!(-100.00));
        // Failed line item still counts its invested capital in totals.
        assert_eq!(summary.totals.invested, dec!(130));
        assert_eq!(summary.totals.value, dec!(100));
    }

    #[tokio::test]
    async fn test_non_positive_rows_are_skipped() {
        let resolver = resolver_with(&[("ACME", dec!(120), dec!(115))]);
        let aggregator = PortfolioAggregator::new(&resolver, 4);

        let summary = aggregator
            .summarize(&[
                position("ACME.NS", Decimal::ZERO, dec!(100)),
                position("ACME.NS", dec!(10), Decimal::ZERO),
                position("ACME.NS", dec!(10), dec!(100)),
            ])
            .await;

        assert_eq!(summary.positions.len(), 1);
        assert_eq!(summary.totals.invested, dec!(1000));
    }

    #[tokio::test]
    async fn test_empty_portfolio_totals_are_zero() {
        let resolver = resolver_with(&[]);
        let aggregator = PortfolioAggregator::new(&resolver, 4);

        let summary = aggregator.summarize(&[]).await;
        assert!(summary.positions.is_empty());
        assert_eq!(summary.totals.invested, Decimal::ZERO);
        assert_eq!(summary.totals.pl_pct, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_output_order_matches_input_order() {
        let resolver = resolver_with(&[
            ("AAA", dec!(1), dec!(1)),
            ("BBB", dec!(2), dec!(2)),
            ("CCC", dec!(3), dec!(3)),
        ]);
        let aggregator = PortfolioAggregator::new(&resolver, 2);

        let positions = vec![
            position("CCC.NS", dec!(1), dec!(1)),
            position("AAA.NS", dec!(1), dec!(1)),
            position("BBB.NS", dec!(1), dec!(1)),
        ];
        let summary = aggregator.summarize(&positions).await;
        let symbols: Vec<&str> = summary.positions.iter().map(|v| v.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["CCC.NS", "AAA.NS", "BBB.NS"]);
    }
}
