use crate::common::ring_buffer::RingBuffer;

use super::base::{BaseIndicator, TrailingIndicator};

const FAST_WINDOW: usize = 5;
const SLOW_WINDOW: usize = 20;
const VOL_LAG: usize = 5;

/// Geometric exhaustion signal.
///
/// Fires when short-horizon momentum runs ahead of the slow trend
/// (`mean(r, 5) > 2 * mean(r, 20)`) while realized dispersion contracts
/// (`std(r, 20)` below its value five bars earlier): price keeps pushing
/// while the path's variance collapses, which pulls the manifold point
/// towards the low-energy regimes. Outputs 1.0 when firing, 0.0 otherwise.
pub struct ExhaustionIndicator {
    pub base: BaseIndicator,
    returns: RingBuffer,
    vol_history: RingBuffer,
    last_close: Option<f64>,
}

impl ExhaustionIndicator {
    pub fn new() -> Self {
        Self {
            base: BaseIndicator::new(SLOW_WINDOW, 1),
            returns: RingBuffer::new(SLOW_WINDOW),
            vol_history: RingBuffer::new(VOL_LAG + 1),
            last_close: None,
        }
    }
}

impl Default for ExhaustionIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailingIndicator for ExhaustionIndicator {
    fn calculate_indicator(&self) -> Option<f64> {
        if !self.returns.is_full() || !self.vol_history.is_full() {
            return None;
        }
        let rets = self.returns.get_as_vec();
        let fast: f64 = rets[rets.len() - FAST_WINDOW..].iter().sum::<f64>() / FAST_WINDOW as f64;
        let slow = self.returns.mean()?;

        let vol_now = self.vol_history.get_last_value()?;
        let vol_lagged = self.vol_history.get_first_value()?;

        let fired = fast > slow * 2.0 && vol_now < vol_lagged;
        Some(if fired { 1.0 } else { 0.0 })
    }

    fn processing_calculation(&self) -> Option<f64> {
        self.base.latest()
    }

    fn add_sample(&mut self, value: f64) {
        if let Some(prev) = self.last_close {
            if prev > 0.0 && value > 0.0 {
                self.returns.add_value((value / prev).ln());
                self.base.sampling_buffer.add_value(value);
                if self.returns.is_full() {
                    if let Some(vol) = self.returns.sample_std() {
                        self.vol_history.add_value(vol);
                    }
                }
            }
        }
        self.last_close = Some(value);

        let v = self.calculate_indicator();
        self.base.record(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Choppy path with widening swings, then a smooth run-up with tiny dispersion.
    fn chop_then_grind() -> Vec<f64> {
        let mut closes = vec![100.0];
        for i in 0..40 {
            let amp = 0.02 + 0.0005 * i as f64;
            let r = if i % 2 == 0 { amp } else { -amp };
            let last = *closes.last().unwrap();
            closes.push(last * f64::exp(r));
        }
        for _ in 0..10 {
            let last = *closes.last().unwrap();
            closes.push(last * f64::exp(0.004));
        }
        closes
    }

    #[test]
    fn fires_on_smooth_acceleration_after_chop() {
        let closes = chop_then_grind();
        let out = ExhaustionIndicator::new().run(&closes);
        let first = out.iter().position(|v| *v == Some(1.0));
        assert!(first.is_some());
        assert!(first.unwrap() > 40);
    }

    #[test]
    fn silent_during_warmup() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = ExhaustionIndicator::new().run(&closes);
        assert!(out.iter().all(|v| v.is_none()));
    }
}
