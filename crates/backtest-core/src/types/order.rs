//! Order and transaction types.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Limit order - execute at the specified price or better
    Limit,
    /// Market order - execute immediately at the prevailing price
    Market,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Limit => write!(f, "limit"),
            OrderType::Market => write!(f, "market"),
        }
    }
}

/// Order status.
///
/// Transitions are monotonic: Submitted -> Open (limit only), Submitted or
/// Open -> Filled or Cancelled. Filled and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order submitted, not yet parked on the book
    Submitted,
    /// Limit order parked on the book, waiting for fills
    Open,
    /// Order completely filled
    Filled,
    /// Order cancelled
    Cancelled,
}

impl OrderStatus {
    /// Check if the order can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    /// Check if the order can still receive fills.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Submitted | OrderStatus::Open)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Submitted => write!(f, "submitted"),
            OrderStatus::Open => write!(f, "open"),
            OrderStatus::Filled => write!(f, "filled"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// Identities stay human-readable (datetime plus symbol) but carry a
// process-wide sequence number: several orders on the same symbol within one
// millisecond must not collide in an identity-keyed store.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    NEXT_SEQ.fetch_add(1, Ordering::Relaxed)
}

fn render_id(timestamp: i64, symbol: &str, seq: u64) -> String {
    let datetime = DateTime::from_timestamp_millis(timestamp)
        .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap());
    format!("{}:{}:{}", datetime.to_rfc3339(), symbol, seq)
}

/// Unique order identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    fn new(timestamp: i64, symbol: &str) -> Self {
        Self(render_id(timestamp, symbol, next_seq()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique transaction identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    fn new(timestamp: i64, symbol: &str) -> Self {
        Self(render_id(timestamp, symbol, next_seq()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable fill record.
///
/// Minted by the matching engine through [`Order::generate_transaction`] and
/// applied with [`Order::execute_transaction`]; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    timestamp: i64,
    side: Side,
    quote_name: String,
    base_name: String,
    amount: u64,
    price: Decimal,
}

impl Transaction {
    fn new(
        quote_name: String,
        base_name: String,
        price: Decimal,
        amount: u64,
        side: Side,
        timestamp: i64,
    ) -> Self {
        let symbol = format!("{}/{}", quote_name, base_name);
        Self {
            id: TransactionId::new(timestamp, &symbol),
            timestamp,
            side,
            quote_name,
            base_name,
            amount,
            price,
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn quote_name(&self) -> &str {
        &self.quote_name
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Pair name, e.g. `ETH/BTC`.
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.quote_name, self.base_name)
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn price(&self) -> Decimal {
        self.price
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "timestamp {}: {} {} {} at price {} per {}",
            self.timestamp, self.side, self.amount, self.quote_name, self.price, self.base_name
        )
    }
}

/// A mutable aggregate of zero or more transactions with a derived fill state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    timestamp: i64,
    status: OrderStatus,
    order_type: OrderType,
    side: Side,
    quote_name: String,
    base_name: String,
    price: Decimal,
    amount: u64,
    filled: u64,
    transactions: Vec<Transaction>,
    fees: HashMap<String, Decimal>,
}

impl Order {
    /// Create a newly submitted order.
    ///
    /// # Panics
    ///
    /// Malformed parameters are construction bugs in the caller: a zero
    /// amount, or a negative limit price.
    pub fn new(
        quote_name: impl Into<String>,
        base_name: impl Into<String>,
        price: Decimal,
        amount: u64,
        order_type: OrderType,
        side: Side,
        timestamp: i64,
    ) -> Self {
        assert!(amount > 0, "amount must be a positive number");
        if order_type == OrderType::Limit {
            assert!(price >= Decimal::ZERO, "limit price must not be negative");
        }

        let quote_name = quote_name.into();
        let base_name = base_name.into();
        let symbol = format!("{}/{}", quote_name, base_name);
        Self {
            id: OrderId::new(timestamp, &symbol),
            timestamp,
            status: OrderStatus::Submitted,
            order_type,
            side,
            quote_name,
            base_name,
            price,
            amount,
            filled: 0,
            transactions: Vec::new(),
            fees: HashMap::new(),
        }
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Get the submission timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn quote_name(&self) -> &str {
        &self.quote_name
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Pair name, e.g. `ETH/BTC`.
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.quote_name, self.base_name)
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn filled(&self) -> u64 {
        self.filled
    }

    /// Amount still unfilled. Stays queryable after cancellation, so a
    /// cancelled partial fill keeps its audit trail.
    pub fn remaining(&self) -> u64 {
        self.amount - self.filled
    }

    /// Filled share of the ordered amount, in `[0, 1]`.
    pub fn filled_fraction(&self) -> f64 {
        self.filled as f64 / self.amount as f64
    }

    /// Transactions applied so far, oldest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Accumulated fees, keyed by fee currency.
    pub fn fees(&self) -> &HashMap<String, Decimal> {
        &self.fees
    }

    /// Park a submitted limit order on the book.
    ///
    /// # Panics
    ///
    /// Market orders are never parked; re-opening a non-submitted order is a
    /// state machine violation.
    pub fn open(&mut self) {
        assert!(
            self.order_type != OrderType::Market,
            "market orders cannot be opened"
        );
        assert!(
            self.status == OrderStatus::Submitted,
            "cannot open a {} order",
            self.status
        );
        self.status = OrderStatus::Open;
    }

    /// Cancel the order from any non-terminal state.
    ///
    /// The filled amount is preserved; only the remaining exposure is
    /// discarded.
    pub fn cancel(&mut self) {
        assert!(
            !self.status.is_terminal(),
            "cannot cancel a {} order",
            self.status
        );
        self.status = OrderStatus::Cancelled;
    }

    /// Mint a fill for this order. Price and amount come from the matching
    /// engine's slippage model; side and pair are inherited from the order.
    pub fn generate_transaction(&self, amount: u64, price: Decimal, timestamp: i64) -> Transaction {
        Transaction::new(
            self.quote_name.clone(),
            self.base_name.clone(),
            price,
            amount,
            self.side,
            timestamp,
        )
    }

    /// Apply a fill and return whether the order is now completely filled.
    ///
    /// # Panics
    ///
    /// Overfilling past the ordered amount is an unrecoverable consistency
    /// violation.
    pub fn execute_transaction(&mut self, transaction: Transaction) -> bool {
        self.filled += transaction.amount;
        self.transactions.push(transaction);
        assert!(
            self.filled <= self.amount,
            "filled amount {} exceeds ordered amount {}",
            self.filled,
            self.amount
        );

        if self.filled == self.amount {
            self.status = OrderStatus::Filled;
            true
        } else {
            false
        }
    }

    /// Accumulate a fee in `asset`, independent of order status.
    pub fn pay_fee(&mut self, asset: &str, amount: Decimal) {
        *self.fees.entry(asset.to_string()).or_insert(Decimal::ZERO) += amount;
    }
}
