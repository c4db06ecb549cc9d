use crate::config::BacktestConfiguration;
use crate::data::{Bar, PriceSeries};
use crate::engine::broker::BrokerSim;
use crate::engine::execution::{Order, OrderNotification};
use crate::error::{BacktestError, Result};
use crate::indicators::IndicatorBank;
use crate::metrics::{calculate_equity_curve, AnalyzerResult, EquityPoint, Snapshot};
use crate::portfolio::Portfolio;
use crate::strategy::{Strategy, StrategyContext};
use std::collections::VecDeque;

//result of a backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: String,
    pub initial_cash: f64,
    pub final_value: f64,
    pub pnl: f64,
    pub portfolio: Portfolio,
    pub equity_curve: Vec<EquityPoint>,
    //filled orders in execution order
    pub orders: Vec<Order>,
    //every notification delivered to the strategy, in delivery order
    pub notifications: Vec<OrderNotification>,
    pub analysis: AnalyzerResult,
    //index of the first bar handed to the strategy
    pub first_bar: usize,
    pub max_outstanding_orders: usize,
}

//configuration for a backtest
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub commission_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 10_000.0,
            commission_rate: 0.001,
        }
    }
}

impl From<&BacktestConfiguration> for BacktestConfig {
    fn from(config: &BacktestConfiguration) -> Self {
        BacktestConfig {
            initial_cash: config.cash,
            commission_rate: config.commission,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(BacktestError::config(format!(
                "starting cash must be positive, got {}",
                self.initial_cash
            )));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(BacktestError::config(format!(
                "commission rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

//main backtest engine
//replays one series bar by bar against one strategy
pub struct BacktestEngine {
    config: BacktestConfig,
    series: PriceSeries,
}

impl BacktestEngine {
    //creates a new backtest engine
    pub fn new(config: BacktestConfig, series: PriceSeries) -> Result<Self> {
        config.validate()?;
        Ok(BacktestEngine { config, series })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    //runs the backtest with the given strategy
    pub fn run(&self, strategy: &mut dyn Strategy) -> Result<BacktestResult> {
        let mut bank = IndicatorBank::with_kinds(strategy.indicators())?;
        let mut broker = BrokerSim::new(self.config.initial_cash, self.config.commission_rate);
        let bars = self.series.bars();

        let mut notifications = Vec::new();
        let mut snapshots = Vec::with_capacity(bars.len());
        let mut first_bar = None;
        let mut max_outstanding = 0;

        tracing::debug!(
            symbol = self.series.symbol(),
            strategy = strategy.name(),
            bars = bars.len(),
            warmup = bank.warmup(),
            "starting backtest"
        );

        //main backtest loop
        for (i, bar) in bars.iter().enumerate() {
            bank.update(bar);

            if first_bar.is_none() {
                if !bank.is_ready() {
                    continue;
                }
                tracing::debug!(bar = i, date = %bar.date, "indicators ready");
                first_bar = Some(i);
            }

            //orders from earlier bars fill at this bar's open
            let fills = broker.process_bar(i, bar);
            deliver(strategy, &mut broker, &bank, i, bar, fills, &mut notifications, true);

            let orders = {
                let mut ctx = StrategyContext::new(i, bar, &bank, broker.portfolio());
                strategy.on_bar(&mut ctx);
                ctx.take_orders()
            };
            let submitted = orders.into_iter().map(|order| broker.submit(order)).collect();
            deliver(strategy, &mut broker, &bank, i, bar, submitted, &mut notifications, true);

            max_outstanding = max_outstanding.max(broker.pending_count());

            let portfolio = broker.portfolio();
            snapshots.push(Snapshot {
                date: bar.date,
                cash: portfolio.cash,
                position_value: portfolio.position_value(bar.close),
            });
        }

        let Some(first_bar) = first_bar else {
            return Err(BacktestError::InsufficientData {
                symbol: self.series.symbol().to_string(),
                bars: bars.len(),
                required: bank.warmup() + 1,
            });
        };

        //nothing is left to fill against, so whatever is still queued is canceled
        let last_index = bars.len() - 1;
        let last_bar = self.series.last();
        let canceled = broker.cancel_all();
        deliver(strategy, &mut broker, &bank, last_index, last_bar, canceled, &mut notifications, false);

        {
            let mut ctx = StrategyContext::new(last_index, last_bar, &bank, broker.portfolio());
            strategy.on_stop(&mut ctx);
            let ignored = ctx.take_orders();
            if !ignored.is_empty() {
                tracing::debug!(count = ignored.len(), "orders created in on_stop ignored");
            }
        }

        self.build_result(strategy.name(), &broker, &snapshots, notifications, first_bar, max_outstanding)
    }

    fn build_result(
        &self,
        strategy: &str,
        broker: &BrokerSim,
        snapshots: &[Snapshot],
        notifications: Vec<OrderNotification>,
        first_bar: usize,
        max_outstanding_orders: usize,
    ) -> Result<BacktestResult> {
        let initial_cash = self.config.initial_cash;
        let equity_curve = calculate_equity_curve(snapshots, initial_cash);
        let orders = broker.filled_orders().to_vec();
        let analysis = AnalyzerResult::from_backtest(&equity_curve, &orders, initial_cash);

        let portfolio = broker.portfolio().clone();
        let final_value = portfolio.equity(self.series.last().close);

        tracing::info!(
            symbol = self.series.symbol(),
            strategy,
            final_value,
            pnl = final_value - initial_cash,
            fills = orders.len(),
            "backtest finished"
        );

        Ok(BacktestResult {
            symbol: self.series.symbol().to_string(),
            strategy: strategy.to_string(),
            initial_cash,
            final_value,
            pnl: final_value - initial_cash,
            portfolio,
            equity_curve,
            orders,
            notifications,
            analysis,
            first_bar,
            max_outstanding_orders,
        })
    }
}

//hands each notification to the strategy with a fresh context
//orders created while reacting are submitted and their own notifications queued
#[allow(clippy::too_many_arguments)]
fn deliver(
    strategy: &mut dyn Strategy,
    broker: &mut BrokerSim,
    bank: &IndicatorBank,
    bar_index: usize,
    bar: &Bar,
    notifications: Vec<OrderNotification>,
    delivered: &mut Vec<OrderNotification>,
    accept_orders: bool,
) {
    let mut queue: VecDeque<OrderNotification> = notifications.into();

    while let Some(notification) = queue.pop_front() {
        let orders = {
            let mut ctx = StrategyContext::new(bar_index, bar, bank, broker.portfolio());
            strategy.on_order_notification(&mut ctx, &notification);
            ctx.take_orders()
        };
        delivered.push(notification);

        if !accept_orders {
            if !orders.is_empty() {
                tracing::debug!(count = orders.len(), "orders after the last bar ignored");
            }
            continue;
        }
        for order in orders {
            queue.push_back(broker.submit(order));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::execution::OrderStatus;
    use crate::indicators::IndicatorKind;
    use chrono::NaiveDate;

    //buys on the first bar it sees and never does anything else
    struct BuyOnce {
        size: u32,
        sent: bool,
        seen: Vec<OrderStatus>,
        stopped: bool,
    }

    impl Strategy for BuyOnce {
        fn name(&self) -> &str {
            "buy once"
        }

        fn indicators(&self) -> Vec<IndicatorKind> {
            vec![IndicatorKind::Sma(2)]
        }

        fn on_bar(&mut self, ctx: &mut StrategyContext) {
            if !self.sent {
                ctx.buy(self.size);
                self.sent = true;
            }
        }

        fn on_order_notification(&mut self, _ctx: &mut StrategyContext, notification: &OrderNotification) {
            self.seen.push(notification.status());
        }

        fn on_stop(&mut self, _ctx: &mut StrategyContext) {
            self.stopped = true;
        }
    }

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::flat(start + chrono::Duration::days(i as i64), c))
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn buy_once(size: u32) -> BuyOnce {
        BuyOnce {
            size,
            sent: false,
            seen: Vec::new(),
            stopped: false,
        }
    }

    #[test]
    fn strategy_starts_after_warmup_and_fills_next_open() {
        let engine = BacktestEngine::new(BacktestConfig::default(), series(&[10.0, 11.0, 12.0, 13.0])).unwrap();
        let mut strategy = buy_once(5);

        let result = engine.run(&mut strategy).unwrap();

        assert_eq!(result.first_bar, 1);
        assert_eq!(result.equity_curve.len(), 3);
        assert_eq!(strategy.seen, vec![OrderStatus::Submitted, OrderStatus::Filled]);
        assert!(strategy.stopped);

        let exec = result.orders[0].executed.unwrap();
        assert_eq!(exec.bar, 2);
        assert_eq!(exec.price, 12.0);
        assert_eq!(result.portfolio.position.size, 5);
    }

    #[test]
    fn order_on_last_bar_is_canceled() {
        let engine = BacktestEngine::new(BacktestConfig::default(), series(&[10.0, 11.0])).unwrap();
        let mut strategy = buy_once(5);

        let result = engine.run(&mut strategy).unwrap();

        assert_eq!(strategy.seen, vec![OrderStatus::Submitted, OrderStatus::Canceled]);
        assert!(result.orders.is_empty());
        assert_eq!(result.final_value, 10_000.0);
    }

    #[test]
    fn too_short_for_warmup() {
        let engine = BacktestEngine::new(BacktestConfig::default(), series(&[10.0])).unwrap();
        let mut strategy = buy_once(1);

        let err = engine.run(&mut strategy).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::InsufficientData { bars: 1, required: 2, .. }
        ));
        assert!(!strategy.stopped);
    }

    #[test]
    fn rejects_commission_of_whole_trade_value() {
        for rate in [1.0, 2.5, -0.01, f64::NAN] {
            let config = BacktestConfig {
                initial_cash: 10_000.0,
                commission_rate: rate,
            };
            assert!(matches!(
                BacktestEngine::new(config, series(&[1.0])),
                Err(BacktestError::Configuration(_))
            ));
        }

        let config = BacktestConfig {
            initial_cash: 10_000.0,
            commission_rate: 0.999,
        };
        assert!(BacktestEngine::new(config, series(&[1.0])).is_ok());
    }

    #[test]
    fn rejects_bad_cash() {
        let config = BacktestConfig {
            initial_cash: 0.0,
            commission_rate: 0.0,
        };
        assert!(matches!(
            BacktestEngine::new(config, series(&[1.0])),
            Err(BacktestError::Configuration(_))
        ));
    }
}
