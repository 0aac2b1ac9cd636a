//! Yahoo Finance market data
//!
//! Closes come from the v8 chart endpoint, option chains from the v7
//! options endpoint. Data is delayed and meant for research use.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::data::MarketDataProvider;
use crate::error::{MonitorError, MonitorResult};
use crate::models::{OptionChain, OptionQuote, OptionSide, PriceSeries};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const OPTIONS_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

// ---------------------------------------------------------------------------
// Wire models
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

/// Closes may contain nulls for halted or partial bars.
#[derive(Debug, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct OptionsResponse {
    #[serde(rename = "optionChain")]
    pub option_chain: OptionsBody,
}

#[derive(Debug, Deserialize)]
pub struct OptionsBody {
    #[serde(default)]
    pub result: Vec<OptionsResult>,
}

#[derive(Debug, Deserialize)]
pub struct OptionsResult {
    #[serde(rename = "expirationDates", default)]
    pub expiration_dates: Vec<i64>,
    #[serde(default)]
    pub options: Vec<OptionsExpiry>,
}

#[derive(Debug, Deserialize)]
pub struct OptionsExpiry {
    #[serde(rename = "expirationDate")]
    pub expiration_date: i64,
    #[serde(default)]
    pub calls: Vec<OptionContract>,
    #[serde(default)]
    pub puts: Vec<OptionContract>,
}

/// Open interest and implied vol are frequently absent on illiquid strikes.
#[derive(Debug, Deserialize)]
pub struct OptionContract {
    pub strike: f64,
    #[serde(rename = "openInterest")]
    pub open_interest: Option<u64>,
    #[serde(rename = "impliedVolatility")]
    pub implied_volatility: Option<f64>,
}

impl OptionContract {
    /// Missing open interest / implied vol are read as zero.
    pub fn to_quote(&self, expiry: NaiveDate, side: OptionSide) -> OptionQuote {
        OptionQuote {
            strike: self.strike,
            open_interest: self.open_interest.unwrap_or(0),
            implied_vol: self.implied_volatility.unwrap_or(0.0).max(0.0),
            expiry,
            side,
        }
    }
}

fn unix_to_date(ts: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// Pairs timestamps with closes, dropping null bars.
pub fn price_series_from_chart(symbol: &str, resp: ChartResponse) -> MonitorResult<PriceSeries> {
    let result = resp.chart.result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| MonitorError::data(format!("No chart data returned for {}", symbol)))?;

    let closes = result.indicators.quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut timestamps = Vec::with_capacity(closes.len());
    let mut values = Vec::with_capacity(closes.len());
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let (Some(close), Some(dt)) = (close, DateTime::<Utc>::from_timestamp(*ts, 0)) else {
            continue;
        };
        timestamps.push(dt);
        values.push(close);
    }

    Ok(PriceSeries::new(symbol, timestamps, values))
}

/// Converts one expiry block into a chain.
pub fn option_chain_from_response(symbol: &str, resp: OptionsResponse) -> MonitorResult<OptionChain> {
    let block = resp.option_chain.result
        .into_iter()
        .next()
        .and_then(|r| r.options.into_iter().next())
        .ok_or_else(|| MonitorError::data(format!("No option chain returned for {}", symbol)))?;

    let expiry = unix_to_date(block.expiration_date)
        .ok_or_else(|| MonitorError::data("Invalid expiration timestamp"))?;

    let mut chain = OptionChain::new(expiry);
    for c in &block.calls {
        chain.push(c.to_quote(expiry, OptionSide::Call));
    }
    for p in &block.puts {
        chain.push(p.to_quote(expiry, OptionSide::Put));
    }
    Ok(chain)
}

/// Yahoo Finance API client
pub struct YahooClient {
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new() -> MonitorResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MonitorError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn chart(&self, symbol: &str, range: &str, interval: &str) -> MonitorResult<ChartResponse> {
        let url = format!("{}/{}", CHART_URL, symbol);
        let resp = self.client
            .get(&url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await?
            .error_for_status()?
            .json::<ChartResponse>()
            .await?;
        Ok(resp)
    }

    async fn options(&self, symbol: &str, expiry: Option<NaiveDate>) -> MonitorResult<OptionsResponse> {
        let url = format!("{}/{}", OPTIONS_URL, symbol);
        let mut req = self.client.get(&url);
        if let Some(date) = expiry {
            let ts = date.and_hms_opt(0, 0, 0).map(|d| d.and_utc().timestamp()).unwrap_or_default();
            req = req.query(&[("date", ts)]);
        }
        let resp = req
            .send()
            .await?
            .error_for_status()?
            .json::<OptionsResponse>()
            .await?;
        Ok(resp)
    }
}

impl MarketDataProvider for YahooClient {
    async fn price_history(&self, symbol: &str, range: &str, interval: &str) -> MonitorResult<PriceSeries> {
        let resp = self.chart(symbol, range, interval).await?;
        let series = price_series_from_chart(symbol, resp)?;
        debug!(symbol, bars = series.len(), "fetched price history");
        Ok(series)
    }

    async fn spot(&self, symbol: &str) -> MonitorResult<f64> {
        let resp = self.chart(symbol, "1d", "1m").await?;
        resp.chart.result
            .and_then(|r| r.into_iter().next())
            .and_then(|r| r.meta.regular_market_price)
            .ok_or_else(|| MonitorError::data(format!("No spot price for {}", symbol)))
    }

    async fn option_expiries(&self, symbol: &str) -> MonitorResult<Vec<NaiveDate>> {
        let resp = self.options(symbol, None).await?;
        let mut dates: Vec<NaiveDate> = resp.option_chain.result
            .into_iter()
            .next()
            .map(|r| r.expiration_dates.into_iter().filter_map(unix_to_date).collect())
            .unwrap_or_default();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    async fn option_chain(&self, symbol: &str, expiry: NaiveDate) -> MonitorResult<OptionChain> {
        let resp = self.options(symbol, Some(expiry)).await?;
        option_chain_from_response(symbol, resp)
    }
}
