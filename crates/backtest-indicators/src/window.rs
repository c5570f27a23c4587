//! Shared indicator state machinery.

use std::collections::VecDeque;

use tracing::warn;

/// Same-timestamp update guard.
///
/// A strategy may read the same indicator several times within one step, but
/// only the first read per timestamp may mutate indicator state. Repeat
/// admissions are logged and rejected so the caller falls back to its cached
/// value.
#[derive(Debug, Clone)]
pub struct UpdateGate {
    label: String,
    last_timestamp: Option<i64>,
}

impl UpdateGate {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_timestamp: None,
        }
    }

    /// The indicator label this gate reports under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Timestamp of the last admitted update, if any.
    pub fn last_timestamp(&self) -> Option<i64> {
        self.last_timestamp
    }

    /// Admit one update at `timestamp`.
    ///
    /// Returns `false` for a repeated admission at the same timestamp, in
    /// which case the caller must serve its cached value without touching
    /// any state.
    pub fn admit(&mut self, timestamp: i64) -> bool {
        if self.last_timestamp == Some(timestamp) {
            warn!(
                indicator = %self.label,
                timestamp,
                "repeated update at the same timestamp, serving cached value"
            );
            return false;
        }
        self.last_timestamp = Some(timestamp);
        true
    }
}

/// Bounded sample buffer backing the windowed indicators.
///
/// Once `capacity` samples have been absorbed, every push evicts and returns
/// the oldest sample, which the O(1) recurrences consume.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be greater than 0");
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a sample; once full, the evicted oldest sample is returned.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the buffer holds `capacity` samples.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn sum(&self) -> f64 {
        self.samples.iter().sum()
    }

    pub fn min(&self) -> f64 {
        self.samples.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.samples
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}
