//! Market data collaborators.

pub mod yahoo;

use std::future::Future;

use chrono::NaiveDate;

use crate::error::MonitorResult;
use crate::models::{OptionChain, PriceSeries};

/// Source of closes, spot and option chains.
pub trait MarketDataProvider {
    /// Closes over `range` sampled every `interval` (Yahoo notation: "6mo", "1d").
    fn price_history(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> impl Future<Output = MonitorResult<PriceSeries>> + Send;

    /// Latest traded price.
    fn spot(&self, symbol: &str) -> impl Future<Output = MonitorResult<f64>> + Send;

    /// Listed expiries, ascending.
    fn option_expiries(&self, symbol: &str) -> impl Future<Output = MonitorResult<Vec<NaiveDate>>> + Send;

    fn option_chain(
        &self,
        symbol: &str,
        expiry: NaiveDate,
    ) -> impl Future<Output = MonitorResult<OptionChain>> + Send;
}
