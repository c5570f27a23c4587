//! Market data access trait.

use crate::types::TickerField;

/// Read-only view of the simulated exchange's current market snapshot.
///
/// The replay driver owns the clock and advances it monotonically between
/// reads; consumers only ever compare the timestamp for equality with their
/// last update. The core never writes through this interface.
pub trait MarketView {
    /// Current simulated time in Unix milliseconds.
    fn current_timestamp(&self) -> i64;

    /// Read one field of the current snapshot for `symbol`.
    ///
    /// The replay driver guarantees every subscribed symbol is present;
    /// implementations may panic on an unknown one.
    fn current_price(&self, symbol: &str, field: TickerField) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candle;

    struct SingleCandleView {
        candle: Candle,
    }

    impl MarketView for SingleCandleView {
        fn current_timestamp(&self) -> i64 {
            self.candle.timestamp
        }

        fn current_price(&self, _symbol: &str, field: TickerField) -> f64 {
            self.candle.field(field)
        }
    }

    #[test]
    fn test_market_view_reads_candle_fields() {
        let view = SingleCandleView {
            candle: Candle::new(1_000, 100.0, 110.0, 95.0, 105.0, 42.0),
        };

        assert_eq!(view.current_timestamp(), 1_000);
        assert_eq!(view.current_price("ETH/BTC", TickerField::High), 110.0);
        assert_eq!(view.current_price("ETH/BTC", TickerField::Close), 105.0);
    }
}
