pub mod backtest;
pub mod broker;
pub mod execution;

pub use backtest::{BacktestConfig, BacktestEngine, BacktestResult};
pub use broker::BrokerSim;
pub use execution::{Execution, Order, OrderId, OrderNotification, OrderSide, OrderStatus};
