//! Secondary vendor feed: a Yahoo-style chart API serving both last-quote
//! metadata and OHLC session series.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::market::{LastQuote, MarketDataSource, OhlcPoint};

const USER_AGENT: &str = concat!("fintrack/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Debug, Deserialize)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(alias = "chartPreviousClose")]
    previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBars>,
}

#[derive(Debug, Deserialize)]
struct QuoteBars {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
}

fn bars_to_points(item: &ChartItem) -> Vec<OhlcPoint> {
    let Some(timestamps) = item.timestamp.as_ref() else {
        return Vec::new();
    };
    let Some(bars) = item
        .indicators
        .as_ref()
        .and_then(|inds| inds.quote.first())
    else {
        return Vec::new();
    };

    let column = |series: &Option<Vec<Option<f64>>>, index: usize| -> Option<Decimal> {
        series
            .as_ref()
            .and_then(|values| values.get(index).copied().flatten())
            .and_then(Decimal::from_f64)
    };

    let mut points = Vec::with_capacity(timestamps.len());
    for (index, ts) in timestamps.iter().enumerate() {
        let Some(ts) = Utc.timestamp_opt(*ts, 0).single() else {
            continue;
        };
        // The chart API nulls out individual bars; a row missing any field
        // is dropped rather than zero-filled.
        let (Some(open), Some(high), Some(low), Some(close)) = (
            column(&bars.open, index),
            column(&bars.high, index),
            column(&bars.low, index),
            column(&bars.close, index),
        ) else {
            continue;
        };
        points.push(OhlcPoint {
            ts,
            open,
            high,
            low,
            close,
        });
    }
    points
}

/// Chart API client for the vendor feed.
pub struct VendorFeedSource {
    base_url: String,
    client: reqwest::Client,
}

impl VendorFeedSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build vendor feed client")?;
        Ok(VendorFeedSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch_chart(&self, symbol: &str, period: &str, interval: &str) -> Result<Option<ChartItem>> {
        let url = format!(
            "{}/v8/finance/chart/{symbol}?range={period}&interval={interval}",
            self.base_url
        );
        debug!("Requesting chart data from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let data = response
            .json::<ChartResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse chart response for {}: {}", symbol, e))?;

        Ok(data.chart.result.and_then(|mut items| {
            if items.is_empty() {
                None
            } else {
                Some(items.swap_remove(0))
            }
        }))
    }
}

#[async_trait]
impl MarketDataSource for VendorFeedSource {
    #[instrument(name = "VendorQuoteFetch", skip(self), fields(symbol = %symbol))]
    async fn last_quote(&self, symbol: &str) -> Result<Option<LastQuote>> {
        let Some(item) = self.fetch_chart(symbol, "1d", "1d").await? else {
            return Ok(None);
        };
        let price = item.meta.regular_market_price.and_then(Decimal::from_f64);
        let previous_close = item.meta.previous_close.and_then(Decimal::from_f64);
        match (price, previous_close) {
            (Some(price), Some(previous_close)) => Ok(Some(LastQuote {
                price,
                previous_close,
            })),
            _ => Ok(None),
        }
    }

    #[instrument(name = "VendorSeriesFetch", skip(self), fields(symbol = %symbol, period = %period))]
    async fn session_series(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<OhlcPoint>> {
        let Some(item) = self.fetch_chart(symbol, period, interval).await? else {
            return Ok(Vec::new());
        };
        Ok(bars_to_points(&item))
    }
}
