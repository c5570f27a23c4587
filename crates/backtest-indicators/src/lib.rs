//! Streaming technical indicators.
//!
//! Every indicator here is incremental: it absorbs one value per simulated
//! timestamp in O(1) amortized time and never recomputes from the full
//! history. Primitive indicators (SMA, EMA, SMMA, Sigma, ATR) work directly
//! off a raw price or range feed; composite indicators (MACD, RSI, CCI,
//! Bollinger Bands, Stochastic) own their constituents and feed them derived
//! values through the external-feed path.
//!
//! All indicators guard against being updated twice at the same simulated
//! timestamp: the repeat call is logged and served the cached value.

pub mod momentum;
pub mod moving_average;
pub mod volatility;
pub mod window;

pub use momentum::{Cci, Macd, Rsi, Stochastic, StochasticOutput};
pub use moving_average::{Ema, Sma, Smma};
pub use volatility::{Atr, BollingerBands, BollingerOutput, Sigma};
pub use window::{SampleWindow, UpdateGate};
