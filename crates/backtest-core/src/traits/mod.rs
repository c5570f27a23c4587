//! Core traits for the backtesting engine.

mod indicator;
mod market;

pub use indicator::{MarketIndicator, StreamingIndicator};
pub use market::MarketView;
