//! Primary exchange quote feed (NSE-style JSON API).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::market::{LastQuote, MarketDataSource, OhlcPoint};

const USER_AGENT: &str = concat!("fintrack/", env!("CARGO_PKG_VERSION"));

/// The exchange reports numbers either as JSON numbers or as comma-grouped
/// strings ("2,840.15"), depending on the endpoint revision.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Num(f64),
    Text(String),
}

impl RawNumber {
    fn to_decimal(&self) -> Option<Decimal> {
        match self {
            RawNumber::Num(v) => Decimal::from_f64(*v),
            RawNumber::Text(s) => s.replace(',', "").trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EquityQuoteResponse {
    #[serde(alias = "priceInfo")]
    price_info: Option<PriceInfo>,
}

#[derive(Debug, Deserialize)]
struct PriceInfo {
    #[serde(alias = "lastPrice")]
    last_price: Option<RawNumber>,
    #[serde(alias = "previousClose")]
    previous_close: Option<RawNumber>,
}

/// Exchange quote API client. Quotes only: the exchange exposes no OHLC
/// series endpoint, so `session_series` is always empty and the resolver
/// falls through to the vendor feed for history.
pub struct ExchangeFeedSource {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeFeedSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build exchange feed client")?;
        Ok(ExchangeFeedSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl MarketDataSource for ExchangeFeedSource {
    #[instrument(name = "ExchangeQuoteFetch", skip(self), fields(symbol = %symbol))]
    async fn last_quote(&self, symbol: &str) -> Result<Option<LastQuote>> {
        let url = format!("{}/api/quote-equity?symbol={symbol}", self.base_url);
        debug!("Requesting exchange quote from {}", url);

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
            .json::<EquityQuoteResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse exchange response for {}: {}", symbol, e))?;

        let Some(info) = data.price_info else {
            return Ok(None);
        };
        let price = info.last_price.as_ref().and_then(RawNumber::to_decimal);
        let previous_close = info.previous_close.as_ref().and_then(RawNumber::to_decimal);

        // Both fields are required for a usable quote; a partial answer is
        // no answer.
        match (price, previous_close) {
            (Some(price), Some(previous_close)) => Ok(Some(LastQuote {
                price,
                previous_close,
            })),
            _ => Ok(None),
        }
    }

    async fn session_series(&self, _symbol: &str, _period: &str, _interval: &str) -> Result<Vec<OhlcPoint>> {
        Ok(Vec::new())
    }
}
