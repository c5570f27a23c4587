//! Indicator trait definitions.

use crate::traits::MarketView;

/// Streaming indicator fed one derived value per timestamp.
///
/// This is the external-feed entry point: composite indicators push derived
/// series (price deltas, typical price, true range) into their constituents
/// through `update` instead of having them read the market themselves.
pub trait StreamingIndicator {
    /// The output type of the indicator.
    type Output;

    /// Absorb `value` observed at `timestamp` and return the current
    /// indicator value, or `None` while warming up.
    ///
    /// A repeated call at an unchanged timestamp must leave internal state
    /// untouched and return the cached value.
    fn update(&mut self, timestamp: i64, value: f64) -> Option<Self::Output>;

    /// Current value without absorbing new data.
    fn current(&self) -> Option<Self::Output>;

    /// Human-readable indicator label, e.g. `SMA(20) of ETH/BTC`.
    fn name(&self) -> &str;
}

/// Indicator that reads its own inputs from the market snapshot.
///
/// `get` is the strategy-facing path: it fetches the required ticker fields
/// at the current simulated timestamp and routes them through the internal
/// update machinery.
pub trait MarketIndicator {
    /// The output type of the indicator.
    type Output;

    /// Read the market and return the current indicator value, or `None`
    /// while warming up.
    fn get(&mut self, market: &dyn MarketView) -> Option<Self::Output>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Running maximum, as a minimal streaming indicator.
    struct RunningMax {
        last_timestamp: Option<i64>,
        max: Option<f64>,
    }

    impl StreamingIndicator for RunningMax {
        type Output = f64;

        fn update(&mut self, timestamp: i64, value: f64) -> Option<f64> {
            if self.last_timestamp == Some(timestamp) {
                return self.max;
            }
            self.last_timestamp = Some(timestamp);
            self.max = Some(self.max.map_or(value, |m| m.max(value)));
            self.max
        }

        fn current(&self) -> Option<f64> {
            self.max
        }

        fn name(&self) -> &str {
            "max"
        }
    }

    #[test]
    fn test_streaming_indicator_contract() {
        let mut max = RunningMax {
            last_timestamp: None,
            max: None,
        };

        assert_eq!(max.current(), None);
        assert_eq!(max.update(1, 2.0), Some(2.0));
        assert_eq!(max.update(2, 1.0), Some(2.0));
        // Repeated timestamp serves the cached value.
        assert_eq!(max.update(2, 9.0), Some(2.0));
        assert_eq!(max.current(), Some(2.0));
    }
}
