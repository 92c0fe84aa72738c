//! Quote resolution over an ordered chain of unreliable market-data
//! sources.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::market::{MarketDataSource, OhlcPoint, Quote, QuoteSource};

/// Exchange suffix carried by primary-listing symbols ("RELIANCE.NS").
const EXCHANGE_SUFFIX: &str = ".NS";
/// Secondary listing of the same underlying instrument, tried once before
/// giving up.
const ALTERNATE_SUFFIX: &str = ".BO";

/// Resolution stages, in fallback order. The chain is linear: a stage
/// either produces the terminal quote or hands over to `next()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    ExchangeFeed,
    VendorFeed,
    AlternateListing,
}

impl ResolveStage {
    pub fn first() -> ResolveStage {
        ResolveStage::ExchangeFeed
    }

    pub fn next(self) -> Option<ResolveStage> {
        match self {
            ResolveStage::ExchangeFeed => Some(ResolveStage::VendorFeed),
            ResolveStage::VendorFeed => Some(ResolveStage::AlternateListing),
            ResolveStage::AlternateListing => None,
        }
    }
}

/// Chart range for [`QuoteResolver::history_points`], mapped to a fixed
/// (period, sampling interval) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    OneDay,
    OneWeek,
    OneMonth,
}

impl HistoryRange {
    /// Lenient parse mirroring the period knob: anything unrecognized is
    /// treated as one month.
    pub fn parse_lenient(s: &str) -> HistoryRange {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => HistoryRange::OneDay,
            "1w" => HistoryRange::OneWeek,
            _ => HistoryRange::OneMonth,
        }
    }

    pub fn period_and_interval(&self) -> (&'static str, &'static str) {
        match self {
            HistoryRange::OneDay => ("1d", "5m"),
            HistoryRange::OneWeek => ("5d", "30m"),
            HistoryRange::OneMonth => ("1mo", "1d"),
        }
    }
}

/// Resolves symbols to quotes by walking the source chain
/// `ExchangeFeed -> VendorFeed -> AlternateListing`, degrading to a
/// well-formed "unavailable" quote when every stage comes up empty.
///
/// Source errors and timeouts never cross this boundary; callers always
/// receive a [`Quote`] value.
pub struct QuoteResolver {
    exchange: Arc<dyn MarketDataSource>,
    vendor: Arc<dyn MarketDataSource>,
    source_timeout: Duration,
    concurrency: usize,
}

impl QuoteResolver {
    pub fn new(
        exchange: Arc<dyn MarketDataSource>,
        vendor: Arc<dyn MarketDataSource>,
        source_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        QuoteResolver {
            exchange,
            vendor,
            source_timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolves one symbol. Infallible by contract.
    #[instrument(name = "ResolveQuote", skip(self), fields(symbol = %symbol))]
    pub async fn resolve(&self, symbol: &str) -> Quote {
        let mut stage = Some(ResolveStage::first());
        while let Some(current) = stage {
            if let Some(quote) = self.attempt(current, symbol).await {
                debug!(?current, "Quote resolved");
                return quote;
            }
            stage = current.next();
        }
        debug!("All sources exhausted");
        Quote::unavailable(symbol, format!("no_data_for_{symbol}"))
    }

    /// Resolves a batch of symbols with bounded concurrency. Output order
    /// matches input order regardless of completion order, and a single
    /// unresolved symbol degrades only its own entry.
    pub async fn resolve_many(&self, symbols: &[String]) -> Vec<Quote> {
        stream::iter(symbols)
            .map(|symbol| self.resolve(symbol))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// OHLC history for charting. Empty on missing data or source failure,
    /// never an error.
    pub async fn history_points(&self, symbol: &str, range: HistoryRange) -> Vec<OhlcPoint> {
        let (period, interval) = range.period_and_interval();
        match tokio::time::timeout(
            self.source_timeout,
            self.vendor.session_series(symbol, period, interval),
        )
        .await
        {
            Ok(Ok(points)) => points,
            Ok(Err(e)) => {
                warn!(symbol, error = %e, "History fetch failed");
                Vec::new()
            }
            Err(_) => {
                warn!(symbol, "History fetch timed out");
                Vec::new()
            }
        }
    }

    async fn attempt(&self, stage: ResolveStage, symbol: &str) -> Option<Quote> {
        match stage {
            ResolveStage::ExchangeFeed => self.try_exchange(symbol).await,
            ResolveStage::VendorFeed => self.try_vendor(symbol, symbol).await,
            ResolveStage::AlternateListing => {
                let alternate = alternate_listing(symbol)?;
                self.try_vendor(symbol, &alternate).await
            }
        }
    }

    /// Primary: exchange feed wants the base ticker without its suffix.
    /// Success needs both a price and a previous reference price.
    async fn try_exchange(&self, symbol: &str) -> Option<Quote> {
        let base = symbol.strip_suffix(EXCHANGE_SUFFIX).unwrap_or(symbol);
        let last = match tokio::time::timeout(self.source_timeout, self.exchange.last_quote(base))
            .await
        {
            Ok(Ok(last)) => last?,
            Ok(Err(e)) => {
                debug!(symbol, error = %e, "Exchange feed unavailable");
                return None;
            }
            Err(_) => {
                debug!(symbol, "Exchange feed timed out");
                return None;
            }
        };

        let change = last.price - last.previous_close;
        Some(Quote::resolved(
            symbol,
            last.price,
            change,
            QuoteSource::ExchangeFeed,
        ))
    }

    /// Fallback: latest full session from the vendor feed; change is the
    /// session's close-minus-open.
    async fn try_vendor(&self, symbol: &str, listing: &str) -> Option<Quote> {
        let series = match tokio::time::timeout(
            self.source_timeout,
            self.vendor.session_series(listing, "1d", "1d"),
        )
        .await
        {
            Ok(Ok(series)) => series,
            Ok(Err(e)) => {
                debug!(symbol, listing, error = %e, "Vendor feed unavailable");
                return None;
            }
            Err(_) => {
                debug!(symbol, listing, "Vendor feed timed out");
                return None;
            }
        };

        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return None,
        };

        let change = last.close - first.open;
        let source = if listing == symbol {
            QuoteSource::VendorFeed
        } else {
            QuoteSource::AlternateListing
        };
        Some(Quote::resolved(symbol, last.close, change, source))
    }
}

fn alternate_listing(symbol: &str) -> Option<String> {
    symbol
        .strip_suffix(EXCHANGE_SUFFIX)
        .map(|base| format!("{base}{ALTERNATE_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{LastQuote, QuoteStatus};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockSource {
        quotes: HashMap<String, LastQuote>,
        series: HashMap<String, Vec<OhlcPoint>>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl MockSource {
        fn with_quote(mut self, symbol: &str, price: Decimal, prev: Decimal) -> Self {
            self.quotes.insert(
                symbol.to_string(),
                LastQuote {
                    price,
                    previous_close: prev,
                },
            );
            self
        }

        fn with_session(mut self, symbol: &str, open: Decimal, close: Decimal) -> Self {
            self.series.insert(
                symbol.to_string(),
                vec![OhlcPoint {
                    ts: Utc::now(),
                    open,
                    high: open.max(close),
                    low: open.min(close),
                    close,
                }],
            );
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl MarketDataSource for MockSource {
        async fn last_quote(&self, symbol: &str) -> Result<Option<LastQuote>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(self.quotes.get(symbol).copied())
        }

        async fn session_series(
            &self,
            symbol: &str,
            _period: &str,
            _interval: &str,
        ) -> Result<Vec<OhlcPoint>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(self.series.get(symbol).cloned().unwrap_or_default())
        }
    }

    fn resolver(exchange: MockSource, vendor: MockSource) -> QuoteResolver {
        QuoteResolver::new(
            Arc::new(exchange),
            Arc::new(vendor),
            Duration::from_secs(2),
            4,
        )
    }

    #[test]
    fn test_stage_chain_order() {
        assert_eq!(ResolveStage::first(), ResolveStage::ExchangeFeed);
        assert_eq!(
            ResolveStage::ExchangeFeed.next(),
            Some(ResolveStage::VendorFeed)
        );
        assert_eq!(
            ResolveStage::VendorFeed.next(),
            Some(ResolveStage::AlternateListing)
        );
        assert_eq!(ResolveStage::AlternateListing.next(), None);
    }

    #[tokio::test]
    async fn test_primary_success_is_terminal() {
        // Exchange feed is keyed on the suffix-less base symbol.
        let exchange = MockSource::default().with_quote("RELIANCE", dec!(2855.40), dec!(2840.15));
        let vendor = MockSource::default().failing();

        let quote = resolver(exchange, vendor).resolve("RELIANCE.NS").await;
        assert_eq!(quote.symbol, "RELIANCE.NS");
        assert_eq!(quote.price, Some(dec!(2855.40)));
        assert_eq!(quote.change, dec!(15.25));
        assert_eq!(quote.status, QuoteStatus::Up);
        assert_eq!(quote.source, QuoteSource::ExchangeFeed);
    }

    #[tokio::test]
    async fn test_falls_back_to_vendor_session() {
        let exchange = MockSource::default().failing();
        let vendor = MockSource::default().with_session("TCS.NS", dec!(4000), dec!(3950));

        let quote = resolver(exchange, vendor).resolve("TCS.NS").await;
        assert_eq!(quote.price, Some(dec!(3950)));
        assert_eq!(quote.change, dec!(-50));
        assert_eq!(quote.status, QuoteStatus::Down);
        assert_eq!(quote.source, QuoteSource::VendorFeed);
    }

    #[tokio::test]
    async fn test_alternate_listing_retry() {
        // Vendor has nothing for the .NS listing but knows the .BO one.
        let exchange = MockSource::default();
        let vendor = MockSource::default().with_session("INFY.BO", dec!(1500), dec!(1500));

        let quote = resolver(exchange, vendor).resolve("INFY.NS").await;
        assert_eq!(quote.price, Some(dec!(1500)));
        assert_eq!(quote.status, QuoteStatus::Flat);
        assert_eq!(quote.source, QuoteSource::AlternateListing);
    }

    #[tokio::test]
    async fn test_no_alternate_retry_without_exchange_suffix() {
        let exchange = MockSource::default();
        let vendor = MockSource::default().with_session("AAPL.BO", dec!(1), dec!(1));

        // "AAPL" has no .NS suffix, so there is no alternate listing to try.
        let quote = resolver(exchange, vendor).resolve("AAPL").await;
        assert!(!quote.is_resolved());
    }

    #[tokio::test]
    async fn test_total_failure_degrades_never_raises() {
        let quote = resolver(MockSource::default().failing(), MockSource::default().failing())
            .resolve("GHOST.NS")
            .await;
        assert_eq!(quote.price, None);
        assert_eq!(quote.change, Decimal::ZERO);
        assert_eq!(quote.status, QuoteStatus::Flat);
        assert_eq!(
            quote.source,
            QuoteSource::Unavailable {
                reason: "no_data_for_GHOST.NS".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_stalled_source_times_out_into_fallback() {
        let exchange = MockSource::default()
            .with_quote("SLOW", dec!(10), dec!(9))
            .delayed(Duration::from_millis(500));
        let vendor = MockSource::default().with_session("SLOW.NS", dec!(8), dec!(9));

        let resolver = QuoteResolver::new(
            Arc::new(exchange),
            Arc::new(vendor),
            Duration::from_millis(50),
            4,
        );
        let quote = resolver.resolve("SLOW.NS").await;
        assert_eq!(quote.source, QuoteSource::VendorFeed);
        assert_eq!(quote.price, Some(dec!(9)));
    }

    #[tokio::test]
    async fn test_resolve_many_preserves_input_order() {
        let exchange = MockSource::default()
            .with_quote("A", dec!(1), dec!(1))
            .with_quote("C", dec!(3), dec!(1));
        let vendor = MockSource::default();
        let resolver = resolver(exchange, vendor);

        let symbols = vec!["A.NS".to_string(), "B.NS".to_string(), "C.NS".to_string()];
        let quotes = resolver.resolve_many(&symbols).await;
        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].symbol, "A.NS");
        assert!(quotes[0].is_resolved());
        assert_eq!(quotes[1].symbol, "B.NS");
        assert!(!quotes[1].is_resolved());
        assert_eq!(quotes[2].symbol, "C.NS");
        assert_eq!(quotes[2].price, Some(dec!(3)));
    }

    #[tokio::test]
    async fn test_history_range_mapping_and_empty_fallback() {
        assert_eq!(HistoryRange::parse_lenient("1d").period_and_interval(), ("1d", "5m"));
        assert_eq!(HistoryRange::parse_lenient("1w").period_and_interval(), ("5d", "30m"));
        assert_eq!(HistoryRange::parse_lenient("1mo").period_and_interval(), ("1mo", "1d"));
        assert_eq!(HistoryRange::parse_lenient("6mo"), HistoryRange::OneMonth);

        let resolver = resolver(MockSource::default(), MockSource::default().failing());
        let points = resolver.history_points("TCS.NS", HistoryRange::OneDay).await;
        assert!(points.is_empty());
    }
}
