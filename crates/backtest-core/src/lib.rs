//! Core types and traits for the replay backtesting engine.
//!
//! This crate provides the foundational building blocks including:
//! - Market snapshot types (Candle, TickerField)
//! - Order, transaction, and order book types
//! - Core traits for indicators and market data access

pub mod error;
pub mod traits;
pub mod types;

pub use error::OrderError;
pub use traits::*;
pub use types::*;
