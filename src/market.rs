//! Market-data source abstractions and the quote value type.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Last traded price with the previous session's reference price, as
/// reported by an exchange feed.
#[derive(Debug, Clone, Copy)]
pub struct LastQuote {
    pub price: Decimal,
    pub previous_close: Decimal,
}

/// One OHLC sample from a session series.
#[derive(Debug, Clone, Serialize)]
pub struct OhlcPoint {
    pub ts: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// An upstream market-data provider. Implementations are individually
/// unreliable: a failure surfaces as either an `Err` or an empty result,
/// and callers treat both identically as "source unavailable".
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest price plus previous reference for a symbol, or `None` when
    /// the source has no data for it.
    async fn last_quote(&self, symbol: &str) -> Result<Option<LastQuote>>;

    /// OHLC samples for the requested period/interval, empty when the
    /// source has nothing for this symbol.
    async fn session_series(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<OhlcPoint>>;
}

/// Direction of the day's price movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Up,
    Down,
    Flat,
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            QuoteStatus::Up => "up",
            QuoteStatus::Down => "down",
            QuoteStatus::Flat => "flat",
        };
        write!(f, "{label}")
    }
}

impl QuoteStatus {
    pub fn from_change(change: Decimal) -> QuoteStatus {
        if change > Decimal::ZERO {
            QuoteStatus::Up
        } else if change < Decimal::ZERO {
            QuoteStatus::Down
        } else {
            QuoteStatus::Flat
        }
    }
}

/// Where a quote came from, or why it could not be resolved. Keeping the
/// degraded case as an explicit variant (instead of swallowing errors)
/// keeps failure visibility testable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteSource {
    ExchangeFeed,
    VendorFeed,
    AlternateListing,
    Unavailable { reason: String },
}

/// A resolved (or degraded) quote. Always a well-formed value: a failed
/// resolution carries `price: None` and an `Unavailable` source tag, never
/// an error.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Option<Decimal>,
    pub change: Decimal,
    pub status: QuoteStatus,
    pub source: QuoteSource,
}

impl Quote {
    pub fn resolved(
        symbol: impl Into<String>,
        price: Decimal,
        change: Decimal,
        source: QuoteSource,
    ) -> Quote {
        Quote {
            symbol: symbol.into(),
            price: Some(price.round_dp(2)),
            change: change.round_dp(2),
            status: QuoteStatus::from_change(change),
            source,
        }
    }

    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Quote {
        Quote {
            symbol: symbol.into(),
            price: None,
            change: Decimal::ZERO,
            status: QuoteStatus::Flat,
            source: QuoteSource::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.price.is_some()
    }
}
