use crate::common::ring_buffer::RingBuffer;

use super::base::{BaseIndicator, TrailingIndicator};

/// Relative Strength Index with simple rolling means of gains and losses.
pub struct RsiIndicator {
    pub base: BaseIndicator,
    gains: RingBuffer,
    losses: RingBuffer,
    last_close: Option<f64>,
}

impl RsiIndicator {
    pub fn new(window: usize) -> Self {
        Self {
            base: BaseIndicator::new(window, 1),
            gains: RingBuffer::new(window),
            losses: RingBuffer::new(window),
            last_close: None,
        }
    }
}

impl TrailingIndicator for RsiIndicator {
    fn calculate_indicator(&self) -> Option<f64> {
        if !self.gains.is_full() {
            return None;
        }
        let gain = self.gains.mean()?;
        let loss = self.losses.mean()?;

        if loss == 0.0 {
            // Flat window: RS = 0/0 is undefined.
            return if gain == 0.0 { None } else { Some(100.0) };
        }
        let rs = gain / loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }

    fn processing_calculation(&self) -> Option<f64> {
        self.base.latest()
    }

    fn add_sample(&mut self, value: f64) {
        if let Some(prev) = self.last_close {
            let delta = value - prev;
            self.gains.add_value(delta.max(0.0));
            self.losses.add_value((-delta).max(0.0));
        }
        self.last_close = Some(value);
        self.base.sampling_buffer.add_value(value);

        let v = self.calculate_indicator();
        self.base.record(v);
    }
}
