pub mod backtest_config;

pub use backtest_config::{
    AnalyzerKind, BacktestConfiguration, MomentumParams, MomentumV2Params, SmaCrossoverParams,
    StrategyParamSet, StrategyParams, StrategyType,
};
