//! Volatility indicators.

use serde::{Deserialize, Serialize};
use tracing::warn;

use backtest_core::traits::{MarketIndicator, MarketView, StreamingIndicator};
use backtest_core::types::TickerField;

use crate::moving_average::Sma;
use crate::window::{SampleWindow, UpdateGate};

/// Rolling standard deviation from running sums.
///
/// Computes `sqrt((sum_sq - sum^2) / (window - 1))` over two bounded buffers
/// of values and squared values, kept for output compatibility with the
/// historical data this engine replays against. The subtraction loses
/// precision as magnitudes grow and its argument can go negative; a negative
/// variance argument yields `None` instead of a NaN.
#[derive(Debug, Clone)]
pub struct Sigma {
    gate: UpdateGate,
    symbol: String,
    field: TickerField,
    window: usize,
    values: SampleWindow,
    squares: SampleWindow,
    sum: f64,
    sum_sq: f64,
    sigma: Option<f64>,
}

impl Sigma {
    pub fn new(symbol: impl Into<String>, window: usize, field: TickerField) -> Self {
        assert!(window > 1, "window must be greater than 1");
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("Sigma({}) of {}", window, symbol)),
            symbol,
            field,
            window,
            values: SampleWindow::new(window),
            squares: SampleWindow::new(window),
            sum: 0.0,
            sum_sq: 0.0,
            sigma: None,
        }
    }

    fn feed(&mut self, value: f64) -> Option<f64> {
        let evicted = self.values.push(value);
        let evicted_sq = self.squares.push(value * value);
        assert_eq!(
            self.values.len(),
            self.squares.len(),
            "value and square buffers diverged"
        );

        if !self.values.is_full() {
            return self.sigma;
        }

        match (evicted, evicted_sq) {
            (Some(old), Some(old_sq)) => {
                self.sum += value - old;
                self.sum_sq += value * value - old_sq;
            }
            (None, None) => {
                self.sum = self.values.sum();
                self.sum_sq = self.squares.sum();
            }
            _ => unreachable!("buffers evict in lockstep"),
        }

        let variance = (self.sum_sq - self.sum * self.sum) / (self.window - 1) as f64;
        self.sigma = if variance >= 0.0 {
            Some(variance.sqrt())
        } else {
            warn!(
                indicator = %self.gate.label(),
                variance,
                "degenerate variance, sigma undefined"
            );
            None
        };
        self.sigma
    }
}

impl StreamingIndicator for Sigma {
    type Output = f64;

    fn update(&mut self, timestamp: i64, value: f64) -> Option<f64> {
        if !self.gate.admit(timestamp) {
            return self.sigma;
        }
        self.feed(value)
    }

    fn current(&self) -> Option<f64> {
        self.sigma
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Sigma {
    type Output = f64;

    fn get(&mut self, market: &dyn MarketView) -> Option<f64> {
        let value = market.current_price(&self.symbol, self.field);
        self.update(market.current_timestamp(), value)
    }
}

/// Average True Range with Wilder smoothing.
///
/// The very first tick only seeds the previous close, so no range exists yet.
/// The first `window` true ranges are averaged plainly; afterwards
/// `atr = (atr * (window - 1) + tr) / window`.
#[derive(Debug, Clone)]
pub struct Atr {
    gate: UpdateGate,
    symbol: String,
    window: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    seed_count: usize,
    atr: Option<f64>,
}

impl Atr {
    pub fn new(symbol: impl Into<String>, window: usize) -> Self {
        assert!(window > 0, "window must be greater than 0");
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("ATR({}) of {}", window, symbol)),
            symbol,
            window,
            prev_close: None,
            seed_sum: 0.0,
            seed_count: 0,
            atr: None,
        }
    }

    fn feed(&mut self, true_range: f64) -> Option<f64> {
        let window = self.window as f64;
        match self.atr {
            Some(atr) => {
                self.atr = Some((atr * (window - 1.0) + true_range) / window);
            }
            None => {
                self.seed_sum += true_range;
                self.seed_count += 1;
                if self.seed_count == self.window {
                    self.atr = Some(self.seed_sum / window);
                }
            }
        }
        self.atr
    }
}

impl StreamingIndicator for Atr {
    type Output = f64;

    /// Feed one externally computed true range.
    fn update(&mut self, timestamp: i64, true_range: f64) -> Option<f64> {
        if !self.gate.admit(timestamp) {
            return self.atr;
        }
        self.feed(true_range)
    }

    fn current(&self) -> Option<f64> {
        self.atr
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Atr {
    type Output = f64;

    fn get(&mut self, market: &dyn MarketView) -> Option<f64> {
        if !self.gate.admit(market.current_timestamp()) {
            return self.atr;
        }
        let close = market.current_price(&self.symbol, TickerField::Close);
        let Some(prev_close) = self.prev_close.replace(close) else {
            // The very first tick only seeds the close.
            return None;
        };
        let high = market.current_price(&self.symbol, TickerField::High);
        let low = market.current_price(&self.symbol, TickerField::Low);
        let true_range = (high - low)
            .abs()
            .max((high - prev_close).abs())
            .max((prev_close - low).abs());
        self.feed(true_range)
    }
}

/// Bollinger Bands output triplet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    /// Middle band (SMA)
    pub middle: f64,
    /// Upper band (middle + 2 sigma)
    pub upper: f64,
    /// Lower band (middle - 2 sigma)
    pub lower: f64,
}

impl BollingerOutput {
    /// Check if a price is above the upper band.
    pub fn is_overbought(&self, price: f64) -> bool {
        price > self.upper
    }

    /// Check if a price is below the lower band.
    pub fn is_oversold(&self, price: f64) -> bool {
        price < self.lower
    }
}

/// Bollinger Bands: an SMA middle band with bands two standard deviations
/// out, both computed over the close price.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    gate: UpdateGate,
    symbol: String,
    sma: Sma,
    sigma: Sigma,
    bands: Option<BollingerOutput>,
}

impl BollingerBands {
    pub fn new(symbol: impl Into<String>, window: usize) -> Self {
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("BollingerBands({}) of {}", window, symbol)),
            sma: Sma::new(symbol.clone(), window, TickerField::Close),
            sigma: Sigma::new(symbol.clone(), window, TickerField::Close),
            symbol,
            bands: None,
        }
    }
}

impl StreamingIndicator for BollingerBands {
    type Output = BollingerOutput;

    fn update(&mut self, timestamp: i64, close: f64) -> Option<BollingerOutput> {
        if !self.gate.admit(timestamp) {
            return self.bands;
        }
        let sma = self.sma.update(timestamp, close);
        let sigma = self.sigma.update(timestamp, close);
        self.bands = match (sma, sigma) {
            (Some(middle), Some(sigma)) => Some(BollingerOutput {
                middle,
                upper: middle + 2.0 * sigma,
                lower: middle - 2.0 * sigma,
            }),
            _ => None,
        };
        self.bands
    }

    fn current(&self) -> Option<BollingerOutput> {
        self.bands
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for BollingerBands {
    type Output = BollingerOutput;

    fn get(&mut self, market: &dyn MarketView) -> Option<BollingerOutput> {
        let close = market.current_price(&self.symbol, TickerField::Close);
        self.update(market.current_timestamp(), close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backtest_core::types::Candle;

    struct StubMarket {
        timestamp: i64,
        candle: Candle,
    }

    impl MarketView for StubMarket {
        fn current_timestamp(&self) -> i64 {
            self.timestamp
        }

        fn current_price(&self, _symbol: &str, field: TickerField) -> f64 {
            self.candle.field(field)
        }
    }

    /// Reference value computed with the same running-sum form the indicator
    /// uses.
    fn legacy_sigma(window: &[f64]) -> Option<f64> {
        let sum: f64 = window.iter().sum();
        let sum_sq: f64 = window.iter().map(|x| x * x).sum();
        let variance = (sum_sq - sum * sum) / (window.len() - 1) as f64;
        (variance >= 0.0).then(|| variance.sqrt())
    }

    #[test]
    fn test_sigma_warmup_and_value() {
        let mut sigma = Sigma::new("ETH/BTC", 3, TickerField::Close);

        assert_eq!(sigma.update(0, 3.0), None);
        assert_eq!(sigma.update(1, -3.0), None);
        // sum 3, sum_sq 27: sqrt((27 - 9) / 2) = 3
        assert!((sigma.update(2, 3.0).unwrap() - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_sigma_matches_recompute_from_window() {
        let window = 4;
        let mut sigma = Sigma::new("ETH/BTC", window, TickerField::Close);
        // Sign-alternating series keeps the running sum near zero, where the
        // legacy variance form stays positive.
        let data: Vec<f64> = (0..40)
            .map(|i| (i as f64 * 1.3).sin() * 2.0)
            .collect();

        for (i, &value) in data.iter().enumerate() {
            let incremental = sigma.update(i as i64, value);
            if i + 1 >= window {
                let expected = legacy_sigma(&data[i + 1 - window..=i]);
                match (incremental, expected) {
                    (Some(inc), Some(exp)) => {
                        assert!(((inc - exp) / exp).abs() < 1e-9, "diverged at step {}", i)
                    }
                    (None, None) => {}
                    other => panic!("mismatch at step {}: {:?}", i, other),
                }
            } else {
                assert_eq!(incremental, None);
            }
        }
    }

    #[test]
    fn test_sigma_degenerate_variance_is_undefined() {
        let mut sigma = Sigma::new("ETH/BTC", 3, TickerField::Close);
        sigma.update(0, 100.0);
        sigma.update(1, 101.0);
        // sum ~302, sum_sq ~30401: the subtraction goes far negative.
        assert_eq!(sigma.update(2, 102.0), None);
        assert_eq!(sigma.current(), None);
    }

    #[test]
    #[should_panic(expected = "window must be greater than 1")]
    fn test_sigma_window_of_one_rejected() {
        let _ = Sigma::new("ETH/BTC", 1, TickerField::Close);
    }

    #[test]
    fn test_atr_first_tick_seeds_only() {
        let mut atr = Atr::new("ETH/BTC", 2);
        let mut market = StubMarket {
            timestamp: 1_000,
            candle: Candle::new(1_000, 10.0, 12.0, 9.0, 11.0, 1.0),
        };

        assert_eq!(atr.get(&market), None);

        // tr = max(|13-10|, |13-11|, |11-10|) = 3
        market.timestamp = 2_000;
        market.candle = Candle::new(2_000, 11.0, 13.0, 10.0, 12.0, 1.0);
        assert_eq!(atr.get(&market), None);

        // tr = max(|14-11|, |14-12|, |12-11|) = 3; atr = (3 + 3) / 2 = 3
        market.timestamp = 3_000;
        market.candle = Candle::new(3_000, 12.0, 14.0, 11.0, 13.0, 1.0);
        assert!((atr.get(&market).unwrap() - 3.0).abs() < 1e-10);

        // tr = max(|15-12|, |15-13|, |13-12|) = 3; Wilder: (3 * 1 + 3) / 2 = 3
        market.timestamp = 4_000;
        market.candle = Candle::new(4_000, 13.0, 15.0, 12.0, 14.0, 1.0);
        assert!((atr.get(&market).unwrap() - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_atr_external_feed() {
        let mut atr = Atr::new("ETH/BTC", 3);

        assert_eq!(atr.update(1, 2.0), None);
        assert_eq!(atr.update(2, 4.0), None);
        assert!((atr.update(3, 6.0).unwrap() - 4.0).abs() < 1e-10);
        // (4 * 2 + 7) / 3 = 5
        assert!((atr.update(4, 7.0).unwrap() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_atr_repeated_timestamp_does_not_reseed() {
        let mut atr = Atr::new("ETH/BTC", 2);
        let market = StubMarket {
            timestamp: 1_000,
            candle: Candle::new(1_000, 10.0, 12.0, 9.0, 11.0, 1.0),
        };

        assert_eq!(atr.get(&market), None);
        // A second read at the seed timestamp must not absorb a range.
        assert_eq!(atr.get(&market), None);
        assert_eq!(atr.seed_count, 0);
    }

    #[test]
    fn test_bollinger_bands_triplet() {
        let window = 3;
        let mut bands = BollingerBands::new("ETH/BTC", window);
        let mut sma = Sma::new("ETH/BTC", window, TickerField::Close);
        let mut sigma = Sigma::new("ETH/BTC", window, TickerField::Close);
        let data = [1.5, -1.0, 0.5, -0.5, 1.0, -1.5];

        for (i, &value) in data.iter().enumerate() {
            let out = bands.update(i as i64, value);
            let m = sma.update(i as i64, value);
            let s = sigma.update(i as i64, value);
            match (out, m, s) {
                (Some(out), Some(m), Some(s)) => {
                    assert!((out.middle - m).abs() < 1e-10);
                    assert!((out.upper - (m + 2.0 * s)).abs() < 1e-10);
                    assert!((out.lower - (m - 2.0 * s)).abs() < 1e-10);
                    assert!(out.is_overbought(out.upper + 0.1));
                    assert!(out.is_oversold(out.lower - 0.1));
                }
                (None, _, _) => assert!(m.is_none() || s.is_none()),
                other => panic!("mismatch at step {}: {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_bollinger_undefined_while_sigma_degenerate() {
        let mut bands = BollingerBands::new("ETH/BTC", 3);
        bands.update(0, 100.0);
        bands.update(1, 101.0);
        assert_eq!(bands.update(2, 102.0), None);
    }
}
