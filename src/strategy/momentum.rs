use crate::config::MomentumParams;
use crate::engine::execution::{OrderNotification, OrderSide, OrderStatus};
use crate::indicators::IndicatorKind;
use crate::strategy::{log_unfilled, Strategy, StrategyContext, TradeState};

//rate-of-change momentum strategy
//enters on strong roc above the trend sma, exits on fading momentum,
//a ratcheting trailing stop, take profit or stop loss
#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    params: MomentumParams,
    stake: u32,
    roc: IndicatorKind,
    trend: IndicatorKind,
    state: TradeState,
    entry_price: Option<f64>,
    trailing_stop: Option<f64>,
}

impl MomentumStrategy {
    pub fn new(params: MomentumParams, stake: u32) -> Self {
        MomentumStrategy {
            roc: IndicatorKind::Roc(params.period),
            trend: IndicatorKind::Sma(params.trend_period),
            params,
            stake,
            state: TradeState::Flat,
            entry_price: None,
            trailing_stop: None,
        }
    }

    pub fn state(&self) -> TradeState {
        self.state
    }

    pub fn entry_price(&self) -> Option<f64> {
        self.entry_price
    }

    pub fn trailing_stop(&self) -> Option<f64> {
        self.trailing_stop
    }

    //raises the stop when price clears the level implied by the current stop
    //kept as stop / (1 - trail) rather than tracking the high directly
    fn ratchet(&mut self, close: f64) {
        let trail = self.params.trail_stop;
        if let Some(stop) = self.trailing_stop {
            if close > stop / (1.0 - trail) {
                self.trailing_stop = Some(close * (1.0 - trail));
            }
        }
    }

    fn should_exit(&self, close: f64, roc: Option<f64>) -> bool {
        let momentum_faded = roc.is_some_and(|r| r < 0.0);
        let trailed_out = self.trailing_stop.is_some_and(|stop| close <= stop);
        let (take_profit, stop_loss) = match self.entry_price {
            Some(entry) => (
                close >= entry * (1.0 + self.params.take_profit),
                close <= entry * (1.0 - self.params.stop_loss),
            ),
            None => (false, false),
        };

        momentum_faded || trailed_out || take_profit || stop_loss
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        "Momentum"
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![self.roc.clone(), self.trend.clone()]
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext) {
        let close = ctx.close();
        let roc = ctx.indicator(&self.roc);

        match self.state {
            TradeState::OrderPending(_) => {}
            TradeState::Flat => {
                let strong = roc.is_some_and(|r| r > self.params.threshold);
                let uptrend = ctx.indicator(&self.trend).is_some_and(|sma| close > sma);

                if strong && uptrend {
                    tracing::info!(
                        date = %ctx.date(),
                        momentum = roc.unwrap_or_default(),
                        price = close,
                        "BUY CREATE"
                    );
                    ctx.buy(self.stake);
                    self.state = TradeState::OrderPending(OrderSide::Buy);
                }
            }
            TradeState::InPosition => {
                self.ratchet(close);

                if self.should_exit(close, roc) {
                    tracing::info!(
                        date = %ctx.date(),
                        momentum = roc.unwrap_or_default(),
                        price = close,
                        "SELL CREATE"
                    );
                    ctx.close_position();
                    self.state = TradeState::OrderPending(OrderSide::Sell);
                }
            }
        }
    }

    fn on_order_notification(&mut self, ctx: &mut StrategyContext, notification: &OrderNotification) {
        match (notification.status(), notification.order.executed) {
            (OrderStatus::Filled, Some(exec)) if notification.order.is_buy() => {
                tracing::info!(
                    date = %ctx.date(),
                    price = exec.price,
                    cost = exec.value,
                    commission = exec.commission,
                    "BUY EXECUTED"
                );
                self.entry_price = Some(exec.price);
                self.trailing_stop = Some(exec.price * (1.0 - self.params.trail_stop));
            }
            (OrderStatus::Filled, Some(exec)) => {
                tracing::info!(
                    date = %ctx.date(),
                    price = exec.price,
                    cost = exec.value,
                    commission = exec.commission,
                    "SELL EXECUTED"
                );
                self.entry_price = None;
                self.trailing_stop = None;
            }
            (OrderStatus::Canceled | OrderStatus::Rejected, _) => log_unfilled(ctx, notification),
            _ => {}
        }

        self.state = self.state.settle(notification, ctx.position());
    }

    fn on_stop(&mut self, ctx: &mut StrategyContext) {
        tracing::info!(
            period = self.params.period,
            ending_value = ctx.portfolio_value(),
            "Momentum finished"
        );
    }
}
