//! Geometric exhaustion vs. RSI exit: which one fires first.

use serde::Serialize;

use crate::indicators::base::TrailingIndicator;
use crate::indicators::exhaustion::ExhaustionIndicator;
use crate::indicators::rsi::RsiIndicator;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalComparison {
    pub bars: usize,
    pub rsi_exits: usize,
    pub geometric_exits: usize,
    pub rsi_first: Option<usize>,
    pub geometric_first: Option<usize>,
    /// `rsi_first - geometric_first` in bars; positive means the geometric
    /// signal fired earlier. `None` unless both fired.
    pub lead_time: Option<i64>,
    /// Geometric exit active on the most recent bar.
    pub geometric_active: bool,
}

impl SignalComparison {
    pub fn geometric_led(&self) -> bool {
        self.lead_time.is_some_and(|l| l > 0)
    }
}

/// Runs both exit rules over `closes`.
pub fn compare_signals(closes: &[f64], rsi_window: usize, rsi_exit_level: f64) -> SignalComparison {
    let rsi_hits: Vec<usize> = RsiIndicator::new(rsi_window)
        .run(closes)
        .into_iter()
        .enumerate()
        .filter(|(_, v)| v.is_some_and(|r| r > rsi_exit_level))
        .map(|(i, _)| i)
        .collect();

    let geo_hits: Vec<usize> = ExhaustionIndicator::new()
        .run(closes)
        .into_iter()
        .enumerate()
        .filter(|(_, v)| *v == Some(1.0))
        .map(|(i, _)| i)
        .collect();

    let rsi_first = rsi_hits.first().copied();
    let geometric_first = geo_hits.first().copied();
    let lead_time = match (rsi_first, geometric_first) {
        (Some(r), Some(g)) => Some(r as i64 - g as i64),
        _ => None,
    };

    let geometric_active = !closes.is_empty() && geo_hits.last() == Some(&(closes.len() - 1));

    SignalComparison {
        bars: closes.len(),
        rsi_exits: rsi_hits.len(),
        geometric_exits: geo_hits.len(),
        rsi_first,
        geometric_first,
        lead_time,
        geometric_active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_market_has_no_signals() {
        let cmp = compare_signals(&[100.0; 60], 14, 70.0);
        assert_eq!(cmp.bars, 60);
        assert!(cmp.rsi_first.is_none());
        assert!(cmp.geometric_first.is_none());
        assert!(cmp.lead_time.is_none());
        assert!(!cmp.geometric_led());
        assert!(!cmp.geometric_active);
    }

    /// Widening chop keeps RSI near 50 and vol rising; a smooth grind
    /// then trips the exhaustion rule before RSI can climb past 70.
    fn chop_then_grind() -> Vec<f64> {
        let mut closes = vec![100.0];
        for i in 0..40 {
            let amp = 0.02 + 0.0005 * i as f64;
            let r = if i % 2 == 0 { amp } else { -amp };
            let last = closes[closes.len() - 1];
            closes.push(last * f64::exp(r));
        }
        for _ in 0..30 {
            let last = closes[closes.len() - 1];
            closes.push(last * f64::exp(0.004));
        }
        closes
    }

    #[test]
    fn lead_time_is_rsi_minus_geometric() {
        let closes = chop_then_grind();
        let cmp = compare_signals(&closes, 14, 70.0);
        let (r, g) = (cmp.rsi_first.unwrap(), cmp.geometric_first.unwrap());
        assert_eq!(cmp.lead_time, Some(r as i64 - g as i64));
        assert!(cmp.geometric_led());
        // By the end the window is all grind: dispersion is gone, no exit.
        assert!(!cmp.geometric_active);
    }

    #[test]
    fn active_while_grind_is_still_accelerating() {
        let closes = chop_then_grind();
        let cmp = compare_signals(&closes[..=50], 14, 70.0);
        assert!(cmp.geometric_active);
        assert!(cmp.rsi_first.is_none());
    }
}
