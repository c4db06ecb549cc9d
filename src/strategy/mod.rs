pub mod momentum;
pub mod momentum_v2;
pub mod sma_crossover;

use crate::config::StrategyParams;
use crate::data::Bar;
use crate::engine::execution::{Order, OrderNotification, OrderSide, OrderStatus};
use crate::indicators::{IndicatorBank, IndicatorKind};
use crate::portfolio::{Portfolio, Position};
use chrono::NaiveDate;

pub use momentum::MomentumStrategy;
pub use momentum_v2::{ExitReason, MomentumV2Strategy};
pub use sma_crossover::SmaCrossoverStrategy;

//strategy interface that all strategies must implement
pub trait Strategy: Send {
    //returns the strategy name
    fn name(&self) -> &str;

    //indicators the engine must maintain for this strategy
    fn indicators(&self) -> Vec<IndicatorKind>;

    //called on each bar once every indicator is defined
    fn on_bar(&mut self, ctx: &mut StrategyContext);

    //called once per order status transition
    fn on_order_notification(&mut self, ctx: &mut StrategyContext, notification: &OrderNotification);

    //called after the last bar
    fn on_stop(&mut self, ctx: &mut StrategyContext);
}

//read-only view of the current bar handed to a strategy, plus an outbox for orders
pub struct StrategyContext<'a> {
    pub bar_index: usize,
    pub bar: &'a Bar,
    indicators: &'a IndicatorBank,
    portfolio: &'a Portfolio,
    outbox: Vec<Order>,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        bar_index: usize,
        bar: &'a Bar,
        indicators: &'a IndicatorBank,
        portfolio: &'a Portfolio,
    ) -> Self {
        StrategyContext {
            bar_index,
            bar,
            indicators,
            portfolio,
            outbox: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }

    //indicator value at this bar, None while warming up
    pub fn indicator(&self, kind: &IndicatorKind) -> Option<f64> {
        self.indicators.get(kind)
    }

    pub fn position(&self) -> &Position {
        &self.portfolio.position
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash
    }

    //cash plus position marked at this bar's close
    pub fn portfolio_value(&self) -> f64 {
        self.portfolio.equity(self.bar.close)
    }

    pub fn initial_cash(&self) -> f64 {
        self.portfolio.initial_cash
    }

    //queues a market buy for the next bar
    pub fn buy(&mut self, size: u32) {
        self.outbox.push(Order::buy(size, self.bar_index));
    }

    //queues a market sell for the next bar
    pub fn sell(&mut self, size: u32) {
        self.outbox.push(Order::sell(size, self.bar_index));
    }

    //sells the whole position, if any
    pub fn close_position(&mut self) {
        let size = self.portfolio.position.size;
        if size > 0 {
            self.sell(size);
        }
    }

    pub(crate) fn take_orders(&mut self) -> Vec<Order> {
        std::mem::take(&mut self.outbox)
    }
}

//per-strategy order state machine: FLAT -> ORDER_PENDING -> IN_POSITION -> ORDER_PENDING -> FLAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeState {
    #[default]
    Flat,
    OrderPending(OrderSide),
    InPosition,
}

impl TradeState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TradeState::OrderPending(_))
    }

    //state after a notification; only terminal transitions move it, and the
    //position the broker left behind decides where it lands
    pub fn settle(self, notification: &OrderNotification, position: &Position) -> Self {
        match notification.status() {
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected => {
                if position.is_long() {
                    TradeState::InPosition
                } else {
                    TradeState::Flat
                }
            }
            OrderStatus::Pending | OrderStatus::Submitted => self,
        }
    }
}

//logs a rejected or canceled order the same way for every strategy
pub(crate) fn log_unfilled(ctx: &StrategyContext, notification: &OrderNotification) {
    tracing::warn!(
        date = %ctx.date(),
        order_id = notification.order.id,
        status = ?notification.status(),
        reason = notification.reason.as_deref().unwrap_or(""),
        "Order Canceled/Margin/Rejected"
    );
}

//builds a strategy from its parameter set
pub fn build_strategy(params: &StrategyParams, stake: u32) -> Box<dyn Strategy> {
    match params {
        StrategyParams::SmaCrossover(p) => Box::new(SmaCrossoverStrategy::new(p.clone(), stake)),
        StrategyParams::Momentum(p) => Box::new(MomentumStrategy::new(p.clone(), stake)),
        StrategyParams::MomentumV2(p) => Box::new(MomentumV2Strategy::new(p.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(status: OrderStatus) -> OrderNotification {
        let mut order = Order::buy(1, 0);
        order.status = status;
        OrderNotification::new(&order)
    }

    #[test]
    fn submitted_keeps_pending() {
        let state = TradeState::OrderPending(OrderSide::Buy);
        let flat = Position::default();
        assert_eq!(state.settle(&note(OrderStatus::Submitted), &flat), state);
    }

    #[test]
    fn rejected_entry_returns_to_flat() {
        let state = TradeState::OrderPending(OrderSide::Buy);
        let flat = Position::default();
        assert_eq!(
            state.settle(&note(OrderStatus::Rejected), &flat),
            TradeState::Flat
        );
    }

    #[test]
    fn filled_entry_is_in_position() {
        let state = TradeState::OrderPending(OrderSide::Buy);
        let long = Position {
            size: 3,
            entry_price: 10.0,
        };
        assert_eq!(
            state.settle(&note(OrderStatus::Filled), &long),
            TradeState::InPosition
        );
    }

    #[test]
    fn context_queues_orders_at_current_bar() {
        let bar = Bar::flat(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(), 50.0);
        let bank = IndicatorBank::new();
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.apply_buy(4, 40.0, 0.0);

        let mut ctx = StrategyContext::new(7, &bar, &bank, &portfolio);
        assert_eq!(ctx.portfolio_value(), 840.0 + 200.0);
        ctx.close_position();

        let orders = ctx.take_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, OrderSide::Sell);
        assert_eq!(orders[0].size, 4);
        assert_eq!(orders[0].requested_at_bar, 7);
        assert!(ctx.take_orders().is_empty());
    }
}
