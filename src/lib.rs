//a strategy-driven backtesting engine for daily stock bars

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod portfolio;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        AnalyzerKind, BacktestConfiguration, MomentumParams, MomentumV2Params,
        SmaCrossoverParams, StrategyParams, StrategyType,
    };
    pub use crate::data::{load_csv, save_csv, Bar, PriceSeries, YahooClient};
    pub use crate::engine::{
        BacktestConfig, BacktestEngine, BacktestResult, BrokerSim, Order, OrderNotification,
        OrderSide, OrderStatus,
    };
    pub use crate::error::{BacktestError, Result};
    pub use crate::indicators::{Indicator, IndicatorBank, IndicatorKind};
    pub use crate::metrics::{AnalyzerResult, EquityPoint, Trade};
    pub use crate::portfolio::{Portfolio, Position};
    pub use crate::strategy::{
        build_strategy, MomentumStrategy, MomentumV2Strategy, SmaCrossoverStrategy, Strategy,
        StrategyContext, TradeState,
    };
}
