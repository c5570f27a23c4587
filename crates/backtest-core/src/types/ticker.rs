//! Market snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One field of a market ticker snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl std::fmt::Display for TickerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickerField::Open => write!(f, "open"),
            TickerField::High => write!(f, "high"),
            TickerField::Low => write!(f, "low"),
            TickerField::Close => write!(f, "close"),
            TickerField::Volume => write!(f, "volume"),
        }
    }
}

/// OHLCV snapshot of one symbol at one simulated timestamp.
/// Uses f64 for fast indicator arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Candle {
    /// Create a new candle.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Read one field of the snapshot.
    #[inline]
    pub fn field(&self, field: TickerField) -> f64 {
        match field {
            TickerField::Open => self.open,
            TickerField::High => self.high,
            TickerField::Low => self.low,
            TickerField::Close => self.close,
            TickerField::Volume => self.volume,
        }
    }

    /// Calculate the typical price (HLC average).
    #[inline]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Calculate the candle's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Calculate the true range against the previous close (used for ATR).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = (self.high - self.low).abs();
                let hc = (self.high - pc).abs();
                let cl = (pc - self.low).abs();
                hl.max(hc).max(cl)
            }
            None => self.high - self.low,
        }
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }
}
