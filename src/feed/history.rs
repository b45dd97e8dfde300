//! Rolling price window

use std::collections::VecDeque;

/// Default number of samples kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;

/// Fixed-capacity price window, oldest sample evicted first
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl PriceHistory {
    /// Create an empty window holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting from the front once full
    pub fn push(&mut self, price: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(price);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Samples in arrival order
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// Lowest and highest sample, if any
    pub fn range(&self) -> Option<(f64, f64)> {
        let first = *self.samples.front()?;
        Some(
            self.samples
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Enough samples to draw a line
    pub fn has_trend(&self) -> bool {
        self.samples.len() >= 2
    }
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
