//! Market data model
//!
//! Inputs handed over by the market-data collaborator: closes, option
//! quotes grouped per expiry, and the output rows built from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp-ordered closes over one lookback window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, timestamps: Vec<DateTime<Utc>>, closes: Vec<f64>) -> Self {
        Self { symbol: symbol.into(), timestamps, closes }
    }

    /// Builds a series without timestamps (synthetic data, tests).
    pub fn from_closes(symbol: impl Into<String>, closes: Vec<f64>) -> Self {
        Self { symbol: symbol.into(), timestamps: Vec::new(), closes }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// Log-returns `ln(P_t / P_{t-1})`. Non-positive closes are skipped pairwise.
    pub fn log_returns(&self) -> ReturnSeries {
        let values = self.closes
            .windows(2)
            .filter(|w| w[0] > 0.0 && w[1] > 0.0)
            .map(|w| (w[1] / w[0]).ln())
            .collect();
        ReturnSeries { values }
    }

    /// Log-closes of the last `n` bars.
    pub fn tail_log_path(&self, n: usize) -> Vec<f64> {
        let start = self.closes.len().saturating_sub(n);
        self.closes[start..]
            .iter()
            .filter(|p| **p > 0.0)
            .map(|p| p.ln())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub values: Vec<f64>,
}

impl ReturnSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Call,
    Put,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub open_interest: u64,
    pub implied_vol: f64,
    pub expiry: NaiveDate,
    pub side: OptionSide,
}

/// All quotes sharing one expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    pub expiry: NaiveDate,
    pub calls: Vec<OptionQuote>,
    pub puts: Vec<OptionQuote>,
}

impl OptionChain {
    pub fn new(expiry: NaiveDate) -> Self {
        Self { expiry, calls: Vec::new(), puts: Vec::new() }
    }

    pub fn push(&mut self, quote: OptionQuote) {
        match quote.side {
            OptionSide::Call => self.calls.push(quote),
            OptionSide::Put => self.puts.push(quote),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }

    /// Calendar days from `as_of`, floored at 1.
    pub fn days_to_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiry - as_of).num_days().max(1)
    }

    pub fn quotes(&self) -> impl Iterator<Item = &OptionQuote> {
        self.calls.iter().chain(self.puts.iter())
    }
}

/// Signed dealer gamma exposure at one strike, in millions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GexEntry {
    pub strike: f64,
    pub gex: f64,
}

/// ATM implied vol at one tenor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermPoint {
    pub days: i64,
    pub iv: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn log_returns_have_one_fewer_point() {
        let series = PriceSeries::from_closes("T", vec![100.0, 110.0, 99.0]);
        let r = series.log_returns();
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r.values[0], (1.1f64).ln(), epsilon = 1e-12);
        assert_relative_eq!(r.values[1], (99.0f64 / 110.0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn days_to_expiry_floors_at_one() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let chain = OptionChain::new(d);
        assert_eq!(chain.days_to_expiry(d), 1);
        assert_eq!(chain.days_to_expiry(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()), 9);
    }
}
