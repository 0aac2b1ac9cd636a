use super::base::{BaseIndicator, TrailingIndicator};

/// Realized volatility over a trailing window of bars.
/// Fed raw closes; works on log-prices internally so the window holds
/// `window + 1` log-prices, i.e. `window` log-returns.
pub struct RealizedVolatilityIndicator {
    pub base: BaseIndicator,
    window: usize,
    periods_per_year: f64,
}

impl RealizedVolatilityIndicator {
    pub fn new(window: usize, periods_per_year: f64) -> Self {
        Self {
            base: BaseIndicator::new(window + 1, 1),
            window,
            periods_per_year,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.base.is_sampling_buffer_full()
    }
}

impl TrailingIndicator for RealizedVolatilityIndicator {
    fn calculate_indicator(&self) -> Option<f64> {
        if !self.is_ready() || self.window == 0 {
            return None;
        }
        let log_prices = self.base.sampling_buffer.get_as_vec();

        // Root mean square of log-returns: sqrt( sum(r_i^2) / N ).
        let sq_sum: f64 = log_prices.windows(2)
            .map(|w| (w[1] - w[0]).powi(2))
            .sum();
        let raw_vol = (sq_sum / self.window as f64).sqrt();

        Some(raw_vol * self.periods_per_year.sqrt())
    }

    fn processing_calculation(&self) -> Option<f64> {
        self.base.latest()
    }

    fn add_sample(&mut self, value: f64) {
        if value <= 0.0 || !value.is_finite() {
            return;
        }
        self.base.sampling_buffer.add_value(value.ln());
        let v = self.calculate_indicator();
        self.base.record(v);
    }
}

/// Rolling realized-vol series; one value per bar once the window is full.
pub fn realized_vol_series(closes: &[f64], window: usize, periods_per_year: f64) -> Vec<f64> {
    let mut ind = RealizedVolatilityIndicator::new(window, periods_per_year);
    ind.run(closes).into_iter().flatten().collect()
}

/// Latest realized vol, e.g. `rv_20d`.
pub fn realized_vol(closes: &[f64], window: usize, periods_per_year: f64) -> Option<f64> {
    realized_vol_series(closes, window, periods_per_year).last().copied()
}
