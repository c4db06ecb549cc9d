use crate::config::SmaCrossoverParams;
use crate::engine::execution::{OrderNotification, OrderSide, OrderStatus};
use crate::indicators::IndicatorKind;
use crate::strategy::{log_unfilled, Strategy, StrategyContext, TradeState};

//sma crossover strategy
//goes long when the fast sma crosses above the slow sma
//closes the position when it crosses back below
#[derive(Debug, Clone)]
pub struct SmaCrossoverStrategy {
    params: SmaCrossoverParams,
    stake: u32,
    crossover: IndicatorKind,
    state: TradeState,
}

impl SmaCrossoverStrategy {
    pub fn new(params: SmaCrossoverParams, stake: u32) -> Self {
        let crossover = IndicatorKind::crossover(
            IndicatorKind::Sma(params.fast_period),
            IndicatorKind::Sma(params.slow_period),
        );

        SmaCrossoverStrategy {
            params,
            stake,
            crossover,
            state: TradeState::Flat,
        }
    }

    pub fn state(&self) -> TradeState {
        self.state
    }
}

impl Strategy for SmaCrossoverStrategy {
    fn name(&self) -> &str {
        "SMA Crossover"
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![self.crossover.clone()]
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext) {
        let Some(cross) = ctx.indicator(&self.crossover) else {
            return;
        };

        match self.state {
            TradeState::OrderPending(_) => {}
            TradeState::Flat if cross > 0.0 => {
                tracing::info!(date = %ctx.date(), price = ctx.close(), "BUY CREATE");
                ctx.buy(self.stake);
                self.state = TradeState::OrderPending(OrderSide::Buy);
            }
            TradeState::InPosition if cross < 0.0 => {
                tracing::info!(date = %ctx.date(), price = ctx.close(), "SELL CREATE");
                ctx.close_position();
                self.state = TradeState::OrderPending(OrderSide::Sell);
            }
            _ => {}
        }
    }

    fn on_order_notification(&mut self, ctx: &mut StrategyContext, notification: &OrderNotification) {
        match (notification.status(), notification.order.executed) {
            (OrderStatus::Filled, Some(exec)) => tracing::info!(
                date = %ctx.date(),
                side = ?notification.order.side,
                price = exec.price,
                size = exec.size,
                commission = exec.commission,
                "order executed"
            ),
            (OrderStatus::Canceled | OrderStatus::Rejected, _) => log_unfilled(ctx, notification),
            _ => {}
        }

        self.state = self.state.settle(notification, ctx.position());
    }

    fn on_stop(&mut self, ctx: &mut StrategyContext) {
        tracing::info!(
            fast = self.params.fast_period,
            slow = self.params.slow_period,
            ending_value = ctx.portfolio_value(),
            "SMA crossover finished"
        );
    }
}
