use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

//strategy type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    SmaCrossover,
    Momentum,
    MomentumV2,
}

impl StrategyType {
    pub const ALL: [StrategyType; 3] = [
        StrategyType::SmaCrossover,
        StrategyType::Momentum,
        StrategyType::MomentumV2,
    ];

    //parse strategy type from string
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sma" | "sma_crossover" => Ok(StrategyType::SmaCrossover),
            "momentum" => Ok(StrategyType::Momentum),
            "momentum2" | "momentum_v2" => Ok(StrategyType::MomentumV2),
            _ => Err(BacktestError::config(format!(
                "unknown strategy '{}' (expected one of: sma_crossover, momentum, momentum_v2)",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::SmaCrossover => "sma_crossover",
            StrategyType::Momentum => "momentum",
            StrategyType::MomentumV2 => "momentum_v2",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//analyzers that can be requested for the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalyzerKind {
    Returns,
    DrawDown,
    SharpeRatio,
    TradeAnalyzer,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 4] = [
        AnalyzerKind::Returns,
        AnalyzerKind::DrawDown,
        AnalyzerKind::SharpeRatio,
        AnalyzerKind::TradeAnalyzer,
    ];

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "returns" => Ok(AnalyzerKind::Returns),
            "drawdown" => Ok(AnalyzerKind::DrawDown),
            "sharperatio" | "sharpe" => Ok(AnalyzerKind::SharpeRatio),
            "tradeanalyzer" | "trades" => Ok(AnalyzerKind::TradeAnalyzer),
            _ => Err(BacktestError::config(format!("unknown analyzer '{}'", s))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerKind::Returns => "Returns",
            AnalyzerKind::DrawDown => "DrawDown",
            AnalyzerKind::SharpeRatio => "SharpeRatio",
            AnalyzerKind::TradeAnalyzer => "TradeAnalyzer",
        }
    }
}

//sma crossover strategy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaCrossoverParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for SmaCrossoverParams {
    fn default() -> Self {
        SmaCrossoverParams {
            fast_period: 10,
            slow_period: 30,
        }
    }
}

//rate-of-change momentum parameters; fractions, not percentages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    //roc lookback
    pub period: usize,
    //minimum roc to enter
    pub threshold: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trail_stop: f64,
    //sma period of the trend confirmation
    pub trend_period: usize,
}

impl Default for MomentumParams {
    fn default() -> Self {
        MomentumParams {
            period: 20,
            threshold: 0.02,
            stop_loss: 0.05,
            take_profit: 0.10,
            trail_stop: 0.03,
            trend_period: 50,
        }
    }
}

//rsi momentum with atr risk sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumV2Params {
    pub momentum_period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub risk_per_trade: f64,
    pub min_momentum: f64,
    pub trend_filter: usize,
    pub roc_period: usize,
}

impl Default for MomentumV2Params {
    fn default() -> Self {
        MomentumV2Params {
            momentum_period: 14,
            entry_threshold: 60.0,
            exit_threshold: 40.0,
            atr_period: 14,
            atr_multiplier: 2.0,
            risk_per_trade: 0.02,
            min_momentum: 0.05,
            trend_filter: 50,
            roc_period: 10,
        }
    }
}

//strategy-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StrategyParams {
    SmaCrossover(SmaCrossoverParams),
    Momentum(MomentumParams),
    MomentumV2(MomentumV2Params),
}

//parameter sets for every strategy, keyed by strategy name in the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParamSet {
    pub sma_crossover: SmaCrossoverParams,
    pub momentum: MomentumParams,
    pub momentum_v2: MomentumV2Params,
}

impl StrategyParamSet {
    pub fn params_for(&self, strategy: StrategyType) -> StrategyParams {
        match strategy {
            StrategyType::SmaCrossover => StrategyParams::SmaCrossover(self.sma_crossover.clone()),
            StrategyType::Momentum => StrategyParams::Momentum(self.momentum.clone()),
            StrategyType::MomentumV2 => StrategyParams::MomentumV2(self.momentum_v2.clone()),
        }
    }
}

//complete backtest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfiguration {
    //account settings
    pub cash: f64,
    //fraction of traded value charged per fill
    pub commission: f64,
    //fixed order size for strategies that do not size themselves
    pub stake: u32,

    //data
    pub fromdate: NaiveDate,
    pub todate: NaiveDate,
    pub symbols: Vec<String>,

    //strategy
    pub strategies: StrategyParamSet,

    //reporting
    pub analyzers: Vec<AnalyzerKind>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            cash: 10_000.0,
            commission: 0.001,
            stake: 10,
            fromdate: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            todate: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            symbols: vec!["AAPL".to_string(), "MSFT".to_string(), "GOOGL".to_string()],
            strategies: StrategyParamSet::default(),
            analyzers: AnalyzerKind::ALL.to_vec(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> BacktestError {
    BacktestError::config(msg)
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //rejects settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.cash.is_finite() && self.cash > 0.0) {
            return Err(invalid(format!("cash must be positive, got {}", self.cash)));
        }
        if !(0.0..1.0).contains(&self.commission) {
            return Err(invalid(format!(
                "commission must be in [0, 1), got {}",
                self.commission
            )));
        }
        if self.stake == 0 {
            return Err(invalid("stake must be at least 1"));
        }
        if self.fromdate > self.todate {
            return Err(invalid(format!(
                "fromdate {} is after todate {}",
                self.fromdate, self.todate
            )));
        }
        if self.analyzers.is_empty() {
            return Err(invalid("at least one analyzer is required"));
        }

        let sma = &self.strategies.sma_crossover;
        if sma.fast_period == 0 || sma.fast_period >= sma.slow_period {
            return Err(invalid(format!(
                "sma_crossover needs 0 < fast_period < slow_period, got {} / {}",
                sma.fast_period, sma.slow_period
            )));
        }

        let m = &self.strategies.momentum;
        if m.period == 0 || m.trend_period == 0 {
            return Err(invalid("momentum periods must be > 0"));
        }
        if !(0.0..1.0).contains(&m.trail_stop) || !(0.0..1.0).contains(&m.stop_loss) {
            return Err(invalid("momentum trail_stop and stop_loss must be in [0, 1)"));
        }
        if m.take_profit < 0.0 {
            return Err(invalid("momentum take_profit must be non-negative"));
        }

        let v2 = &self.strategies.momentum_v2;
        if v2.momentum_period == 0
            || v2.atr_period == 0
            || v2.trend_filter == 0
            || v2.roc_period == 0
        {
            return Err(invalid("momentum_v2 periods must be > 0"));
        }
        if !(v2.atr_multiplier.is_finite() && v2.atr_multiplier > 0.0)
            || !(v2.risk_per_trade > 0.0 && v2.risk_per_trade <= 1.0)
        {
            return Err(invalid(
                "momentum_v2 needs atr_multiplier > 0 and risk_per_trade in (0, 1]",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let config = BacktestConfiguration::default();
        assert_eq!(config.cash, 10_000.0);
        assert_eq!(config.commission, 0.001);
        assert_eq!(config.strategies.sma_crossover.fast_period, 10);
        assert_eq!(config.strategies.sma_crossover.slow_period, 30);
        assert_eq!(config.analyzers.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!(StrategyType::parse("sma_crossover").unwrap(), StrategyType::SmaCrossover);
        assert_eq!(StrategyType::parse("Momentum").unwrap(), StrategyType::Momentum);
        assert_eq!(StrategyType::parse("momentum-v2").unwrap(), StrategyType::MomentumV2);
        assert!(matches!(
            StrategyType::parse("mean_reversion"),
            Err(BacktestError::Configuration(_))
        ));
    }

    #[test]
    fn analyzer_names_parse() {
        assert_eq!(AnalyzerKind::parse("SharpeRatio").unwrap(), AnalyzerKind::SharpeRatio);
        assert_eq!(AnalyzerKind::parse("drawdown").unwrap(), AnalyzerKind::DrawDown);
        assert!(AnalyzerKind::parse("Calmar").is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "cash": 50000.0, "strategies": { "sma_crossover": { "fast_period": 5 } } }"#;
        let config: BacktestConfiguration = serde_json::from_str(json).unwrap();

        assert_eq!(config.cash, 50_000.0);
        assert_eq!(config.strategies.sma_crossover.fast_period, 5);
        assert_eq!(config.strategies.sma_crossover.slow_period, 30);
        assert_eq!(config.strategies.momentum, MomentumParams::default());
    }

    #[test]
    fn params_for_picks_matching_set() {
        let set = StrategyParamSet::default();
        assert!(matches!(
            set.params_for(StrategyType::MomentumV2),
            StrategyParams::MomentumV2(p) if p.atr_multiplier == 2.0
        ));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = BacktestConfiguration::default();
        config.strategies.sma_crossover.fast_period = 30;
        assert!(config.validate().is_err());

        let mut config = BacktestConfiguration::default();
        config.fromdate = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(config.validate().is_err());

        let mut config = BacktestConfiguration::default();
        config.commission = 1.0;
        assert!(config.validate().is_err());

        let mut config = BacktestConfiguration::default();
        config.strategies.momentum.trail_stop = 1.0;
        assert!(config.validate().is_err());

        let mut config = BacktestConfiguration::default();
        config.analyzers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BacktestConfiguration::default();
        config.symbols = vec!["NVDA".to_string()];
        config.analyzers = vec![AnalyzerKind::SharpeRatio];
        config.to_json_file(&path).unwrap();

        assert_eq!(BacktestConfiguration::from_json_file(&path).unwrap(), config);
    }
}
