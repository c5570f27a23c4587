//! Momentum indicators.

use serde::{Deserialize, Serialize};
use tracing::warn;

use backtest_core::traits::{MarketIndicator, MarketView, StreamingIndicator};
use backtest_core::types::TickerField;

use crate::moving_average::{Ema, Sma, Smma};
use crate::volatility::Sigma;
use crate::window::{SampleWindow, UpdateGate};

/// Relative Strength Index over Wilder-smoothed gains and losses.
///
/// Tracks the previous close, splits each move into an up and a down
/// component and feeds them into two owned SMMAs. When the loss average is
/// zero the index saturates at 100 instead of dividing by zero.
#[derive(Debug, Clone)]
pub struct Rsi {
    gate: UpdateGate,
    symbol: String,
    prev_close: Option<f64>,
    gains: Smma,
    losses: Smma,
    rsi: Option<f64>,
}

impl Rsi {
    pub fn new(symbol: impl Into<String>, window: usize) -> Self {
        assert!(window > 0, "window must be greater than 0");
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("RSI({}) of {}", window, symbol)),
            gains: Smma::new(symbol.clone(), window, TickerField::Close),
            losses: Smma::new(symbol.clone(), window, TickerField::Close),
            symbol,
            prev_close: None,
            rsi: None,
        }
    }
}

impl StreamingIndicator for Rsi {
    type Output = f64;

    fn update(&mut self, timestamp: i64, close: f64) -> Option<f64> {
        if !self.gate.admit(timestamp) {
            return self.rsi;
        }
        let Some(prev) = self.prev_close.replace(close) else {
            // The first close only seeds the delta base.
            return self.rsi;
        };
        let up = (close - prev).max(0.0);
        let down = (prev - close).max(0.0);
        let smma_up = self.gains.update(timestamp, up);
        let smma_down = self.losses.update(timestamp, down);
        self.rsi = match (smma_up, smma_down) {
            (Some(_), Some(down)) if down == 0.0 => Some(100.0),
            (Some(up), Some(down)) => Some(100.0 - 100.0 / (1.0 + up / down)),
            _ => self.rsi,
        };
        self.rsi
    }

    fn current(&self) -> Option<f64> {
        self.rsi
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Rsi {
    type Output = f64;

    fn get(&mut self, market: &dyn MarketView) -> Option<f64> {
        let close = market.current_price(&self.symbol, TickerField::Close);
        self.update(market.current_timestamp(), close)
    }
}

/// Moving average convergence/divergence: the spread between a fast and a
/// slow EMA of the same field. Undefined until both are warmed up.
#[derive(Debug, Clone)]
pub struct Macd {
    gate: UpdateGate,
    fast: Ema,
    slow: Ema,
    macd: Option<f64>,
}

impl Macd {
    /// Create a MACD with the conventional 12/26 windows.
    pub fn new(symbol: impl Into<String>, field: TickerField) -> Self {
        Self::with_windows(symbol, 12, 26, field)
    }

    pub fn with_windows(
        symbol: impl Into<String>,
        fast: usize,
        slow: usize,
        field: TickerField,
    ) -> Self {
        assert!(fast > 0 && slow > 0, "windows must be greater than 0");
        assert!(fast < slow, "fast window must be shorter than slow window");
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("MACD({},{}) of {}", fast, slow, symbol)),
            fast: Ema::new(symbol.clone(), fast, field),
            slow: Ema::new(symbol, slow, field),
            macd: None,
        }
    }

    pub fn current(&self) -> Option<f64> {
        self.macd
    }

    pub fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Macd {
    type Output = f64;

    fn get(&mut self, market: &dyn MarketView) -> Option<f64> {
        if !self.gate.admit(market.current_timestamp()) {
            return self.macd;
        }
        let fast = self.fast.get(market);
        let slow = self.slow.get(market);
        self.macd = match (fast, slow) {
            (Some(fast), Some(slow)) => Some(fast - slow),
            _ => None,
        };
        self.macd
    }
}

/// Commodity Channel Index over the typical price `(close + high + low) / 3`,
/// fed into an owned SMA and Sigma of the same window.
#[derive(Debug, Clone)]
pub struct Cci {
    gate: UpdateGate,
    symbol: String,
    sma: Sma,
    sigma: Sigma,
    cci: Option<f64>,
}

impl Cci {
    pub fn new(symbol: impl Into<String>, window: usize) -> Self {
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("CCI({}) of {}", window, symbol)),
            sma: Sma::new(symbol.clone(), window, TickerField::Close),
            sigma: Sigma::new(symbol.clone(), window, TickerField::Close),
            symbol,
            cci: None,
        }
    }
}

impl StreamingIndicator for Cci {
    type Output = f64;

    fn update(&mut self, timestamp: i64, typical_price: f64) -> Option<f64> {
        if !self.gate.admit(timestamp) {
            return self.cci;
        }
        let sma = self.sma.update(timestamp, typical_price);
        let sigma = self.sigma.update(timestamp, typical_price);
        self.cci = match (sma, sigma) {
            (Some(sma), Some(sigma)) if sigma != 0.0 => {
                Some((typical_price - sma) / (0.015 * sigma))
            }
            _ => None,
        };
        self.cci
    }

    fn current(&self) -> Option<f64> {
        self.cci
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Cci {
    type Output = f64;

    fn get(&mut self, market: &dyn MarketView) -> Option<f64> {
        let close = market.current_price(&self.symbol, TickerField::Close);
        let high = market.current_price(&self.symbol, TickerField::High);
        let low = market.current_price(&self.symbol, TickerField::Low);
        let typical_price = (close + high + low) / 3.0;
        self.update(market.current_timestamp(), typical_price)
    }
}

/// Stochastic oscillator output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticOutput {
    /// %K (fast line)
    pub k: f64,
    /// %D (mean of the recent %K values), defined once enough %K exist
    pub d: Option<f64>,
}

/// Stochastic oscillator.
///
/// %K positions the current close within the low/high range of the previous
/// `k_window` closes; %D is the mean of the last `d_window` %K values. A flat
/// range leaves %K undefined for that tick instead of dividing by zero.
#[derive(Debug, Clone)]
pub struct Stochastic {
    gate: UpdateGate,
    symbol: String,
    closes: SampleWindow,
    past_k: SampleWindow,
    k: Option<f64>,
    d: Option<f64>,
}

impl Stochastic {
    /// Create a stochastic oscillator with the conventional 14/3 windows.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_windows(symbol, 14, 3)
    }

    pub fn with_windows(symbol: impl Into<String>, k_window: usize, d_window: usize) -> Self {
        assert!(k_window > 0 && d_window > 0, "windows must be greater than 0");
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!(
                "StochasticOscillator({},{}) of {}",
                k_window, d_window, symbol
            )),
            symbol,
            closes: SampleWindow::new(k_window),
            past_k: SampleWindow::new(d_window),
            k: None,
            d: None,
        }
    }
}

impl StreamingIndicator for Stochastic {
    type Output = StochasticOutput;

    fn update(&mut self, timestamp: i64, close: f64) -> Option<StochasticOutput> {
        if !self.gate.admit(timestamp) {
            return self.current();
        }
        if !self.closes.is_full() {
            self.closes.push(close);
            return self.current();
        }

        let low = self.closes.min();
        let high = self.closes.max();
        self.closes.push(close);

        if high == low {
            warn!(
                indicator = %self.gate.label(),
                timestamp,
                "flat close window, oscillator undefined"
            );
            self.k = None;
            return None;
        }

        let k = (close - low) / (high - low) * 100.0;
        self.k = Some(k);
        self.past_k.push(k);
        if self.past_k.is_full() {
            self.d = Some(self.past_k.sum() / self.past_k.len() as f64);
        }
        self.current()
    }

    fn current(&self) -> Option<StochasticOutput> {
        self.k.map(|k| StochasticOutput { k, d: self.d })
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Stochastic {
    type Output = StochasticOutput;

    fn get(&mut self, market: &dyn MarketView) -> Option<StochasticOutput> {
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

    #[test]
    fn test_rsi_saturates_at_100_on_gains() {
        let mut rsi = Rsi::new("ETH/BTC", 5);

        assert_eq!(rsi.update(0, 1.0), None);
        for i in 1..10 {
            let value = rsi.update(i as i64, 1.0 + i as f64);
            assert!((value.unwrap() - 100.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_rsi_saturates_at_0_on_losses() {
        let mut rsi = Rsi::new("ETH/BTC", 5);

        assert_eq!(rsi.update(0, 20.0), None);
        for i in 1..10 {
            let value = rsi.update(i as i64, 20.0 - i as f64);
            assert!(value.unwrap().abs() < 1e-10);
        }
    }

    #[test]
    fn test_rsi_stays_in_range_on_mixed_moves() {
        let mut rsi = Rsi::new("ETH/BTC", 14);
        let data: Vec<f64> = (0..40)
            .map(|i| 100.0 + (i as f64 * 0.5).sin() * 5.0)
            .collect();

        for (i, &close) in data.iter().enumerate() {
            if let Some(value) = rsi.update(i as i64, close) {
                assert!((0.0..=100.0).contains(&value));
            }
        }
        assert!(rsi.current().is_some());
    }

    #[test]
    fn test_rsi_idempotent_at_same_timestamp() {
        let mut rsi = Rsi::new("ETH/BTC", 5);
        rsi.update(0, 10.0);
        let first = rsi.update(1, 11.0);
        let second = rsi.update(1, 5.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_macd_matches_standalone_emas() {
        let mut macd = Macd::with_windows("ETH/BTC", 3, 5, TickerField::Close);
        let mut fast = Ema::new("ETH/BTC", 3, TickerField::Close);
        let mut slow = Ema::new("ETH/BTC", 5, TickerField::Close);

        for i in 0..20 {
            let close = 100.0 + (i as f64 * 0.4).sin() * 6.0;
            let market = StubMarket {
                timestamp: i,
                candle: Candle::new(i, close, close, close, close, 1.0),
            };
            let spread = macd.get(&market);
            let f = fast.update(i, close);
            let s = slow.update(i, close);
            match (f, s) {
                (Some(f), Some(s)) => {
                    assert!((spread.unwrap() - (f - s)).abs() < 1e-10);
                }
                _ => assert_eq!(spread, None),
            }
        }
    }

    #[test]
    fn test_macd_undefined_until_slow_window_fills() {
        let mut macd = Macd::with_windows("ETH/BTC", 2, 4, TickerField::Close);
        for i in 0..4 {
            let close = 10.0 + i as f64;
            let market = StubMarket {
                timestamp: i,
                candle: Candle::new(i, close, close, close, close, 1.0),
            };
            let spread = macd.get(&market);
            if i < 3 {
                assert_eq!(spread, None);
            } else {
                assert!(spread.is_some());
            }
        }
    }

    #[test]
    fn test_cci_matches_manual_computation() {
        let window = 3;
        let mut cci = Cci::new("ETH/BTC", window);
        // Sign-mixed typical prices keep the legacy variance form positive.
        let data = [1.5, -1.0, 0.5, -0.5, 1.0];

        let mut sma = Sma::new("ETH/BTC", window, TickerField::Close);
        let mut sigma = Sigma::new("ETH/BTC", window, TickerField::Close);
        for (i, &tp) in data.iter().enumerate() {
            let out = cci.update(i as i64, tp);
            let m = sma.update(i as i64, tp);
            let s = sigma.update(i as i64, tp);
            match (m, s) {
                (Some(m), Some(s)) if s != 0.0 => {
                    let expected = (tp - m) / (0.015 * s);
                    assert!((out.unwrap() - expected).abs() < 1e-10);
                }
                _ => assert_eq!(out, None),
            }
        }
    }

    #[test]
    fn test_cci_reads_typical_price() {
        let mut cci = Cci::new("ETH/BTC", 2);
        let mut direct = Cci::new("ETH/BTC", 2);

        // close 3, high 6, low -3: typical price 2
        let candles = [
            Candle::new(0, 0.0, 6.0, -3.0, 3.0, 1.0),
            Candle::new(1, 0.0, 3.0, -6.0, -3.0, 1.0),
            Candle::new(2, 0.0, 4.5, -1.5, 1.5, 1.0),
        ];
        for (i, candle) in candles.iter().enumerate() {
            let market = StubMarket {
                timestamp: i as i64,
                candle: *candle,
            };
            let via_market = cci.get(&market);
            let via_feed = direct.update(i as i64, candle.typical_price());
            assert_eq!(via_market, via_feed);
        }
    }

    #[test]
    fn test_stochastic_warmup_and_k() {
        let mut stochastic = Stochastic::with_windows("ETH/BTC", 4, 2);

        // The first four closes only fill the window.
        for (i, close) in [1.0, 4.0, 2.0, 3.0].into_iter().enumerate() {
            assert_eq!(stochastic.update(i as i64, close), None);
        }

        // Window [1, 4, 2, 3]: low 1, high 4; %K = (3.5 - 1) / 3 * 100
        let out = stochastic.update(4, 3.5).unwrap();
        assert!((out.k - 2.5 / 3.0 * 100.0).abs() < 1e-10);
        assert_eq!(out.d, None);

        // Window [4, 2, 3, 3.5]: low 2, high 4; %K = (3 - 2) / 2 * 100 = 50,
        // %D = mean of the two %K values.
        let out = stochastic.update(5, 3.0).unwrap();
        assert!((out.k - 50.0).abs() < 1e-10);
        let expected_d = (2.5 / 3.0 * 100.0 + 50.0) / 2.0;
        assert!((out.d.unwrap() - expected_d).abs() < 1e-10);
    }

    #[test]
    fn test_stochastic_flat_window_is_undefined() {
        let mut stochastic = Stochastic::with_windows("ETH/BTC", 3, 2);
        for i in 0..3 {
            assert_eq!(stochastic.update(i, 5.0), None);
        }
        // low == high: no %K this tick.
        assert_eq!(stochastic.update(3, 5.0), None);
        assert_eq!(stochastic.current(), None);
    }

    #[test]
    fn test_stochastic_idempotent_at_same_timestamp() {
        let mut stochastic = Stochastic::with_windows("ETH/BTC", 2, 2);
        stochastic.update(0, 1.0);
        stochastic.update(1, 2.0);
        let first = stochastic.update(2, 1.5);
        let second = stochastic.update(2, 100.0);
        assert_eq!(first, second);
    }
}
