use std::collections::VecDeque;

use crate::stats;

/// Fixed-capacity window of the most recent samples.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: VecDeque<f64>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add_value(&mut self, val: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(val);
    }

    pub fn get_as_vec(&self) -> Vec<f64> {
        self.data.iter().cloned().collect()
    }

    pub fn get_last_value(&self) -> Option<f64> {
        self.data.back().copied()
    }

    /// Oldest retained sample.
    pub fn get_first_value(&self) -> Option<f64> {
        self.data.front().copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.data.len() == self.capacity
    }

    pub fn mean(&self) -> Option<f64> {
        stats::mean(&self.get_as_vec())
    }

    pub fn sample_std(&self) -> Option<f64> {
        stats::sample_std(&self.get_as_vec())
    }
}
