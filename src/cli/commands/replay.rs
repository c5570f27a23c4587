//! Synthetic replay command.
//!
//! Stands in for the external collaborators of the core library: a market
//! data feed, a replay clock, and a toy matcher that mints transactions.
//! The core library itself never drives this loop.

use std::path::Path;

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{debug, info};

use backtest_config::{load_config, ReplaySettings};
use backtest_core::traits::{MarketIndicator, MarketView};
use backtest_core::types::{
    share, Candle, Order, OrderQueue, OrderStatus, OrderType, SharedOrder, Side, TickerField,
};
use backtest_indicators::{Atr, Ema, Macd, Rsi, Sma, Stochastic};

use crate::cli::ReplayArgs;

/// Deterministic synthetic OHLCV feed for one symbol.
struct SyntheticFeed {
    symbol: String,
    candle: Candle,
}

impl SyntheticFeed {
    fn new(symbol: String, settings: &ReplaySettings) -> Self {
        Self {
            candle: Self::candle_at(settings, 0),
            symbol,
        }
    }

    fn candle_at(settings: &ReplaySettings, step: usize) -> Candle {
        let timestamp = settings.start_timestamp + step as i64 * settings.step_ms;
        let phase = step as f64 * 0.1;
        let close = settings.base_price * (1.0 + 0.05 * phase.sin());
        let open = settings.base_price * (1.0 + 0.05 * (phase - 0.1).sin());
        let spread = settings.base_price * 0.01;
        let high = close.max(open) + spread;
        let low = close.min(open) - spread;
        let volume = 1_000.0 + 100.0 * (phase * 0.5).cos().abs();
        Candle::new(timestamp, open, high, low, close, volume)
    }

    fn advance(&mut self, settings: &ReplaySettings, step: usize) {
        self.candle = Self::candle_at(settings, step);
    }
}

impl MarketView for SyntheticFeed {
    fn current_timestamp(&self) -> i64 {
        self.candle.timestamp
    }

    fn current_price(&self, symbol: &str, field: TickerField) -> f64 {
        assert_eq!(symbol, self.symbol, "unknown symbol");
        self.candle.field(field)
    }
}

pub fn run(args: ReplayArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let settings = config.replay;
    let steps = args.steps.unwrap_or(settings.steps);

    let symbol = format!("{}/{}", settings.quote_name, settings.base_name);
    let mut feed = SyntheticFeed::new(symbol.clone(), &settings);

    let mut sma = Sma::new(symbol.clone(), 20, TickerField::Close);
    let mut ema = Ema::new(symbol.clone(), 12, TickerField::Close);
    let mut rsi = Rsi::new(symbol.clone(), 14);
    let mut macd = Macd::new(symbol.clone(), TickerField::Close);
    let mut atr = Atr::new(symbol.clone(), 14);
    let mut stochastic = Stochastic::new(symbol.clone());

    let mut open_orders = OrderQueue::new();
    let mut history: Vec<SharedOrder> = Vec::new();

    info!(symbol = %symbol, steps, "starting replay");

    for step in 0..steps {
        feed.advance(&settings, step);
        let timestamp = feed.current_timestamp();
        let close = feed.current_price(&symbol, TickerField::Close);

        if let (Some(sma), Some(ema)) = (sma.get(&feed), ema.get(&feed)) {
            debug!(step, sma, ema, "moving averages");
        }
        if let Some(rsi) = rsi.get(&feed) {
            debug!(step, rsi, "relative strength");
        }
        if let Some(macd) = macd.get(&feed) {
            debug!(step, macd, "ema spread");
        }
        if let Some(atr) = atr.get(&feed) {
            debug!(step, atr, "average true range");
        }
        if let Some(stochastic) = stochastic.get(&feed) {
            debug!(step, k = stochastic.k, d = ?stochastic.d, "oscillator");
        }

        // Park a small limit order every eighth step; the toy matcher below
        // fills the oldest parked order at a slower cadence, leaving some
        // orders to cancel at the end.
        if step % 8 == 4 {
            let price = Decimal::try_from(close).unwrap_or(Decimal::ZERO);
            let mut order = Order::new(
                settings.quote_name.clone(),
                settings.base_name.clone(),
                price,
                10,
                OrderType::Limit,
                Side::Buy,
                timestamp,
            );
            order.open();
            let shared = share(order);
            history.push(shared.clone());
            let id = open_orders.insert(shared);
            info!(order = %id, price = %price, "parked limit order");
        }

        if step % 16 == 6 && !open_orders.is_empty() {
            let oldest = open_orders.pop_oldest()?;
            let mut order = oldest.borrow_mut();
            let fill_price = Decimal::try_from(close).unwrap_or(Decimal::ZERO);

            // Two partial fills, to run the whole fill state machine.
            let half = order.remaining() / 2;
            let first = order.generate_transaction(half, fill_price, timestamp);
            order.execute_transaction(first);
            let rest = order.generate_transaction(order.remaining(), fill_price, timestamp);
            let done = order.execute_transaction(rest);

            let fee = fill_price * Decimal::from(order.amount()) * settings.fee_rate;
            order.pay_fee(&settings.base_name, fee);
            info!(order = %order.id(), filled = order.filled(), done, "filled order");
        }
    }

    // Cancel whatever is still parked.
    for id in open_orders.ids() {
        let order = open_orders.remove(&id)?;
        order.borrow_mut().cancel();
        info!(order = %id, "cancelled unfilled order");
    }

    let filled = history
        .iter()
        .filter(|order| order.borrow().status() == OrderStatus::Filled)
        .count();
    let cancelled = history
        .iter()
        .filter(|order| order.borrow().status() == OrderStatus::Cancelled)
        .count();
    info!(orders = history.len(), filled, cancelled, "replay complete");

    Ok(())
}
