use crate::config::MomentumV2Params;
use crate::engine::execution::{OrderNotification, OrderSide, OrderStatus};
use crate::indicators::IndicatorKind;
use crate::strategy::{log_unfilled, Strategy, StrategyContext, TradeState};

//shares to buy so that an atr-based stop risks risk_per_trade of the portfolio
//returns 0 when the stop distance is not positive
pub fn position_size(
    portfolio_value: f64,
    risk_per_trade: f64,
    atr: f64,
    atr_multiplier: f64,
) -> u32 {
    let risk_amount = portfolio_value * risk_per_trade;
    let atr_stop = atr * atr_multiplier;

    if atr_stop.is_nan() || atr_stop <= 0.0 || !risk_amount.is_finite() {
        return 0;
    }

    //float to int casts saturate, negatives land on 0
    (risk_amount / atr_stop).floor() as u32
}

//which exit rule closed the position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    //rsi fell under exit_threshold
    WeakMomentum,
    //close fell under the trend sma
    BelowTrend,
    //close reached entry - atr * atr_multiplier
    AtrStop,
}

//rsi momentum strategy with a trend filter and atr risk sizing
#[derive(Debug, Clone)]
pub struct MomentumV2Strategy {
    params: MomentumV2Params,
    rsi: IndicatorKind,
    atr: IndicatorKind,
    trend: IndicatorKind,
    roc: IndicatorKind,
    state: TradeState,
    entry_price: Option<f64>,
    closed_trades: usize,
}

impl MomentumV2Strategy {
    pub fn new(params: MomentumV2Params) -> Self {
        MomentumV2Strategy {
            rsi: IndicatorKind::Rsi(params.momentum_period),
            atr: IndicatorKind::Atr(params.atr_period),
            trend: IndicatorKind::Sma(params.trend_filter),
            roc: IndicatorKind::Roc(params.roc_period),
            params,
            state: TradeState::Flat,
            entry_price: None,
            closed_trades: 0,
        }
    }

    pub fn state(&self) -> TradeState {
        self.state
    }

    pub fn entry_price(&self) -> Option<f64> {
        self.entry_price
    }

    fn try_enter(&mut self, ctx: &mut StrategyContext) {
        let close = ctx.close();
        let (Some(rsi), Some(sma), Some(roc), Some(atr)) = (
            ctx.indicator(&self.rsi),
            ctx.indicator(&self.trend),
            ctx.indicator(&self.roc),
            ctx.indicator(&self.atr),
        ) else {
            return;
        };

        if !(rsi > self.params.entry_threshold && close > sma && roc > self.params.min_momentum) {
            return;
        }

        let size = position_size(
            ctx.portfolio_value(),
            self.params.risk_per_trade,
            atr,
            self.params.atr_multiplier,
        );

        if size == 0 || ctx.cash() <= size as f64 * close {
            tracing::debug!(
                date = %ctx.date(),
                size,
                cash = ctx.cash(),
                "entry signal skipped, size not affordable"
            );
            return;
        }

        tracing::info!(date = %ctx.date(), rsi, momentum = roc, size, "BUY CREATE");
        ctx.buy(size);
        self.state = TradeState::OrderPending(OrderSide::Buy);
    }

    //first exit rule that holds at this bar, undefined indicators never fire
    fn exit_reason(
        &self,
        close: f64,
        rsi: Option<f64>,
        sma: Option<f64>,
        atr: Option<f64>,
    ) -> Option<ExitReason> {
        if rsi.is_some_and(|r| r < self.params.exit_threshold) {
            return Some(ExitReason::WeakMomentum);
        }
        if sma.is_some_and(|s| close < s) {
            return Some(ExitReason::BelowTrend);
        }
        match (self.entry_price, atr) {
            (Some(entry), Some(atr)) if close <= entry - atr * self.params.atr_multiplier => {
                Some(ExitReason::AtrStop)
            }
            _ => None,
        }
    }

    fn try_exit(&mut self, ctx: &mut StrategyContext) {
        let close = ctx.close();
        let rsi = ctx.indicator(&self.rsi);
        let reason = self.exit_reason(
            close,
            rsi,
            ctx.indicator(&self.trend),
            ctx.indicator(&self.atr),
        );

        if let Some(reason) = reason {
            tracing::info!(
                date = %ctx.date(),
                rsi = rsi.unwrap_or_default(),
                price = close,
                ?reason,
                "SELL CREATE"
            );
            ctx.close_position();
            self.state = TradeState::OrderPending(OrderSide::Sell);
        }
    }
}

impl Strategy for MomentumV2Strategy {
    fn name(&self) -> &str {
        "Momentum V2"
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![
            self.rsi.clone(),
            self.atr.clone(),
            self.trend.clone(),
            self.roc.clone(),
        ]
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext) {
        match self.state {
            TradeState::OrderPending(_) => {}
            TradeState::Flat => self.try_enter(ctx),
            TradeState::InPosition => self.try_exit(ctx),
        }
    }

    fn on_order_notification(&mut self, ctx: &mut StrategyContext, notification: &OrderNotification) {
        match (notification.status(), notification.order.executed) {
            (OrderStatus::Filled, Some(exec)) if notification.order.is_buy() => {
                tracing::info!(date = %ctx.date(), price = exec.price, size = exec.size, "BUY EXECUTED");
                self.entry_price = Some(exec.price);
            }
            (OrderStatus::Filled, Some(exec)) => {
                tracing::info!(
                    date = %ctx.date(),
                    price = exec.price,
                    pnl = exec.pnl.unwrap_or_default(),
                    "SELL EXECUTED"
                );
                self.entry_price = None;
                self.closed_trades += 1;
            }
            (OrderStatus::Canceled | OrderStatus::Rejected, _) => log_unfilled(ctx, notification),
            _ => {}
        }

        self.state = self.state.settle(notification, ctx.position());
    }

    fn on_stop(&mut self, ctx: &mut StrategyContext) {
        let final_value = ctx.portfolio_value();
        let initial_cash = ctx.initial_cash();
        let total_return = (final_value - initial_cash) / initial_cash * 100.0;

        tracing::info!(
            ending_value = final_value,
            total_return_pct = total_return,
            trades = self.closed_trades,
            "Momentum V2 finished"
        );

        if self.closed_trades > 0 {
            tracing::info!(
                avg_trade_pnl = (final_value - initial_cash) / self.closed_trades as f64,
                "Momentum V2 average trade"
            );
        }
    }
}
