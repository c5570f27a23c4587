//! Moving average indicators.

use backtest_core::traits::{MarketIndicator, MarketView, StreamingIndicator};
use backtest_core::types::TickerField;

use crate::window::{SampleWindow, UpdateGate};

/// Simple moving average over the last `window` samples.
///
/// Undefined until `window` samples have been absorbed; afterwards the
/// running average moves in O(1) per sample.
#[derive(Debug, Clone)]
pub struct Sma {
    gate: UpdateGate,
    symbol: String,
    field: TickerField,
    window: usize,
    samples: SampleWindow,
    sma: Option<f64>,
}

impl Sma {
    pub fn new(symbol: impl Into<String>, window: usize, field: TickerField) -> Self {
        assert!(window > 0, "window must be greater than 0");
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("SMA({}) of {}", window, symbol)),
            symbol,
            field,
            window,
            samples: SampleWindow::new(window),
            sma: None,
        }
    }

    fn feed(&mut self, value: f64) -> Option<f64> {
        match self.samples.push(value) {
            Some(oldest) => {
                let prev = self
                    .sma
                    .expect("running average exists once the window is full");
                self.sma = Some(prev + (value - oldest) / self.window as f64);
            }
            None if self.samples.is_full() => {
                self.sma = Some(self.samples.sum() / self.window as f64);
            }
            None => {}
        }
        self.sma
    }
}

impl StreamingIndicator for Sma {
    type Output = f64;

    fn update(&mut self, timestamp: i64, value: f64) -> Option<f64> {
        if !self.gate.admit(timestamp) {
            return self.sma;
        }
        self.feed(value)
    }

    fn current(&self) -> Option<f64> {
        self.sma
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Sma {
    type Output = f64;

    fn get(&mut self, market: &dyn MarketView) -> Option<f64> {
        let value = market.current_price(&self.symbol, self.field);
        self.update(market.current_timestamp(), value)
    }
}

/// Exponential moving average with multiplier `2 / (window + 1)`.
///
/// Seeds with the plain average at the `window`-th sample. The recurrence
/// consumes the sample falling out of the window, so the bounded buffer is
/// load-bearing, not a leftover of the SMA eviction pattern.
#[derive(Debug, Clone)]
pub struct Ema {
    gate: UpdateGate,
    symbol: String,
    field: TickerField,
    window: usize,
    multiplier: f64,
    samples: SampleWindow,
    ema: Option<f64>,
}

impl Ema {
    pub fn new(symbol: impl Into<String>, window: usize, field: TickerField) -> Self {
        assert!(window > 0, "window must be greater than 0");
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("EMA({}) of {}", window, symbol)),
            symbol,
            field,
            window,
            multiplier: 2.0 / (window as f64 + 1.0),
            samples: SampleWindow::new(window),
            ema: None,
        }
    }

    fn feed(&mut self, value: f64) -> Option<f64> {
        match self.samples.push(value) {
            Some(oldest) => {
                let prev = self
                    .ema
                    .expect("running average exists once the window is full");
                self.ema = Some(prev + (value - oldest) * self.multiplier);
            }
            None if self.samples.is_full() => {
                self.ema = Some(self.samples.sum() / self.window as f64);
            }
            None => {}
        }
        self.ema
    }
}

impl StreamingIndicator for Ema {
    type Output = f64;

    fn update(&mut self, timestamp: i64, value: f64) -> Option<f64> {
        if !self.gate.admit(timestamp) {
            return self.ema;
        }
        self.feed(value)
    }

    fn current(&self) -> Option<f64> {
        self.ema
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Ema {
    type Output = f64;

    fn get(&mut self, market: &dyn MarketView) -> Option<f64> {
        let value = market.current_price(&self.symbol, self.field);
        self.update(market.current_timestamp(), value)
    }
}

/// Smoothed moving average (Wilder smoothing), bufferless.
///
/// The first feed seeds the average directly; afterwards
/// `smma = (smma * (window - 1) + value) / window`.
#[derive(Debug, Clone)]
pub struct Smma {
    gate: UpdateGate,
    symbol: String,
    field: TickerField,
    window: usize,
    smma: Option<f64>,
}

impl Smma {
    pub fn new(symbol: impl Into<String>, window: usize, field: TickerField) -> Self {
        assert!(window > 0, "window must be greater than 0");
        let symbol = symbol.into();
        Self {
            gate: UpdateGate::new(format!("SMMA({}) of {}", window, symbol)),
            symbol,
            field,
            window,
            smma: None,
        }
    }

    fn feed(&mut self, value: f64) -> Option<f64> {
        let window = self.window as f64;
        self.smma = Some(match self.smma {
            None => value,
            Some(prev) => (prev * (window - 1.0) + value) / window,
        });
        self.smma
    }
}

impl StreamingIndicator for Smma {
    type Output = f64;

    fn update(&mut self, timestamp: i64, value: f64) -> Option<f64> {
        if !self.gate.admit(timestamp) {
            return self.smma;
        }
        self.feed(value)
    }

    fn current(&self) -> Option<f64> {
        self.smma
    }

    fn name(&self) -> &str {
        self.gate.label()
    }
}

impl MarketIndicator for Smma {
    type Output = f64;

    fn get(&mut self, market: &dyn MarketView) -> Option<f64> {
        let value = market.current_price(&self.symbol, self.field);
        self.update(market.current_timestamp(), value)
    }
}
