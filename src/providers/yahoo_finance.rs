use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::currency::CurrencyRateProvider;
use crate::core::metadata::{MetadataProvider, QuoteMetadata};
use crate::core::price::{PriceProvider, PriceResult};

const USER_AGENT: &str = "rebal/0.1";

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<QuoteBars>,
}

#[derive(Deserialize, Debug)]
struct QuoteBars {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(alias = "regularMarketTime")]
    regular_market_time: Option<i64>,
    currency: Option<String>,
    #[serde(alias = "longName")]
    long_name: Option<String>,
    #[serde(alias = "shortName")]
    short_name: Option<String>,
    #[serde(alias = "instrumentType")]
    instrument_type: Option<String>,
    #[serde(alias = "fullExchangeName")]
    exchange_name: Option<String>,
}

fn to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0).single()
}

/// Last positive close of the daily series. Only when the response carries no
/// series at all does the regular market price stand in for it.
fn latest_close(item: &ChartItem) -> Option<(f64, Option<DateTime<Utc>>)> {
    let closes = item
        .indicators
        .as_ref()
        .and_then(|inds| inds.quote.first())
        .and_then(|q| q.close.as_ref());

    match closes {
        Some(closes) => {
            let timestamps = item.timestamp.as_deref().unwrap_or(&[]);
            closes
                .iter()
                .enumerate()
                .rev()
                .find_map(|(i, close)| (*close).filter(|p| *p > 0.0).map(|p| (i, p)))
                .map(|(i, price)| (price, timestamps.get(i).and_then(|ts| to_datetime(*ts))))
        }
        None => item
            .meta
            .regular_market_price
            .filter(|p| *p > 0.0)
            .map(|p| (p, item.meta.regular_market_time.and_then(to_datetime))),
    }
}

/// Fetches the first chart item for `symbol`. One attempt, no retry.
async fn fetch_chart(base_url: &str, symbol: &str, range: &str) -> Result<ChartItem> {
    let url = format!("{base_url}/v8/finance/chart/{symbol}?interval=1d&range={range}");
    debug!("Requesting chart data from {}", url);

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let response = client
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

    let text = response.text().await?;
    let data: YahooChartResponse = serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

    data.chart
        .result
        .and_then(|items| items.into_iter().next())
        .ok_or_else(|| anyhow!("No chart data found for symbol: {}", symbol))
}

// YahooFinanceProvider implementation for PriceProvider and MetadataProvider
pub struct YahooFinanceProvider {
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Self {
        YahooFinanceProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooPriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<PriceResult> {
        let item = fetch_chart(&self.base_url, symbol, "5d").await?;
        let (price, as_of) = latest_close(&item)
            .ok_or_else(|| anyhow!("No closing price found for symbol: {}", symbol))?;

        Ok(PriceResult {
            price,
            currency: item.meta.currency,
            as_of,
            short_name: item.meta.short_name,
        })
    }
}

#[async_trait]
impl MetadataProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooMetadataFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_metadata(&self, symbol: &str) -> Result<QuoteMetadata> {
        let meta = fetch_chart(&self.base_url, symbol, "1d").await?.meta;
        Ok(QuoteMetadata {
            symbol: symbol.to_string(),
            long_name: meta.long_name,
            short_name: meta.short_name,
            instrument_type: meta.instrument_type,
            exchange_name: meta.exchange_name,
        })
    }
}

// YahooCurrencyProvider implementation for CurrencyRateProvider
pub struct YahooCurrencyProvider {
    base_url: String,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let symbol = format!("{from}{to}=X");
        let item = fetch_chart(&self.base_url, &symbol, "5d").await?;
        let (rate, _) = latest_close(&item)
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;
        debug!(%symbol, rate, "Fetched exchange rate");
        Ok(rate)
    }
}
