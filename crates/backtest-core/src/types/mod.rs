//! Core data types for the backtesting engine.

mod book;
mod order;
mod ticker;

pub use book::{share, OrderBook, OrderQueue, SharedOrder};
pub use order::{Order, OrderId, OrderStatus, OrderType, Side, Transaction, TransactionId};
pub use ticker::{Candle, TickerField};
