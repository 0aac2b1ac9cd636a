use crate::common::ring_buffer::RingBuffer;

/// Behaviour every bar-driven indicator implements.
pub trait TrailingIndicator {
    /// Core calculation over the current sampling window.
    /// `None` while the window is still warming up or the value is undefined.
    fn calculate_indicator(&self) -> Option<f64>;

    /// Post-processing of calculated values (default: latest value).
    fn processing_calculation(&self) -> Option<f64>;

    /// Feeds one new bar close.
    fn add_sample(&mut self, value: f64);

    /// Runs the indicator over a whole close series, one output per bar.
    fn run(&mut self, closes: &[f64]) -> Vec<Option<f64>> {
        closes
            .iter()
            .map(|c| {
                self.add_sample(*c);
                self.processing_calculation()
            })
            .collect()
    }
}

/// Buffers shared by the indicators.
pub struct BaseIndicator {
    pub sampling_buffer: RingBuffer,
    pub processing_buffer: RingBuffer,
    /// Whether the latest calculation produced a value.
    pub last_defined: bool,
}

impl BaseIndicator {
    pub fn new(sampling_length: usize, processing_length: usize) -> Self {
        Self {
            sampling_buffer: RingBuffer::new(sampling_length),
            processing_buffer: RingBuffer::new(processing_length.max(1)),
            last_defined: false,
        }
    }

    pub fn is_sampling_buffer_full(&self) -> bool {
        self.sampling_buffer.is_full()
    }

    /// Stores a calculated value; undefined results are remembered as gaps.
    pub fn record(&mut self, value: Option<f64>) {
        self.last_defined = value.is_some();
        if let Some(v) = value {
            self.processing_buffer.add_value(v);
        }
    }

    pub fn latest(&self) -> Option<f64> {
        if self.last_defined {
            self.processing_buffer.get_last_value()
        } else {
            None
        }
    }
}
