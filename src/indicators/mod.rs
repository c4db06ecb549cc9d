//incremental indicators, one bar per update, None until the window is full

pub mod atr;
pub mod bank;
pub mod crossover;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use bank::IndicatorBank;
pub use crossover::CrossOver;
pub use roc::Roc;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::data::Bar;
use crate::error::{BacktestError, Result};
use std::fmt;

//a streaming indicator fed once per bar
pub trait Indicator: Send {
    //consumes the next bar and returns the value at that bar
    fn update(&mut self, bar: &Bar) -> Option<f64>;

    //value at the most recently consumed bar
    fn value(&self) -> Option<f64>;

    //index of the first bar with a defined value
    fn warmup(&self) -> usize;
}

//indicator identity plus parameters, used as the lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Roc(usize),
    Rsi(usize),
    Atr(usize),
    CrossOver(Box<IndicatorKind>, Box<IndicatorKind>),
}

impl IndicatorKind {
    pub fn crossover(a: IndicatorKind, b: IndicatorKind) -> Self {
        IndicatorKind::CrossOver(Box::new(a), Box::new(b))
    }

    //index of the first bar at which this indicator is defined
    pub fn warmup(&self) -> usize {
        match self {
            IndicatorKind::Sma(n) => n.saturating_sub(1),
            IndicatorKind::Roc(n) | IndicatorKind::Rsi(n) | IndicatorKind::Atr(n) => *n,
            IndicatorKind::CrossOver(a, b) => a.warmup().max(b.warmup()) + 1,
        }
    }

    //builds a streaming instance for a bar-driven kind
    pub fn build(&self) -> Result<Box<dyn Indicator>> {
        let built: Box<dyn Indicator> = match self {
            IndicatorKind::Sma(n) if *n > 0 => Box::new(Sma::new(*n)),
            IndicatorKind::Roc(n) if *n > 0 => Box::new(Roc::new(*n)),
            IndicatorKind::Rsi(n) if *n > 0 => Box::new(Rsi::new(*n)),
            IndicatorKind::Atr(n) if *n > 0 => Box::new(Atr::new(*n)),
            IndicatorKind::CrossOver(..) => {
                return Err(BacktestError::config(format!(
                    "{} is derived from other indicators and has no standalone form",
                    self
                )))
            }
            _ => return Err(BacktestError::config(format!("{}: period must be > 0", self))),
        };
        Ok(built)
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(n) => write!(f, "SMA({})", n),
            IndicatorKind::Roc(n) => write!(f, "ROC({})", n),
            IndicatorKind::Rsi(n) => write!(f, "RSI({})", n),
            IndicatorKind::Atr(n) => write!(f, "ATR({})", n),
            IndicatorKind::CrossOver(a, b) => write!(f, "CROSSOVER({},{})", a, b),
        }
    }
}

//replays a whole bar slice through an indicator, one value per bar
pub fn compute(indicator: &mut dyn Indicator, bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter().map(|bar| indicator.update(bar)).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(IndicatorKind::Sma(20).to_string(), "SMA(20)");
        assert_eq!(
            IndicatorKind::crossover(IndicatorKind::Sma(10), IndicatorKind::Sma(30)).to_string(),
            "CROSSOVER(SMA(10),SMA(30))"
        );
    }

    #[test]
    fn warmup_matches_first_defined_value() {
        let bars = test_support::bars_from_closes(&(1..=40).map(f64::from).collect::<Vec<_>>());

        for kind in [
            IndicatorKind::Sma(5),
            IndicatorKind::Roc(5),
            IndicatorKind::Rsi(5),
            IndicatorKind::Atr(5),
        ] {
            let mut ind = kind.build().unwrap();
            let values = compute(ind.as_mut(), &bars);
            let first = values.iter().position(Option::is_some).unwrap();
            assert_eq!(first, kind.warmup(), "{}", kind);
            assert_eq!(ind.warmup(), kind.warmup(), "{}", kind);
        }
    }

    #[test]
    fn zero_period_is_a_configuration_error() {
        assert!(matches!(
            IndicatorKind::Rsi(0).build(),
            Err(BacktestError::Configuration(_))
        ));
    }

    #[test]
    fn crossover_cannot_be_built_standalone() {
        let kind = IndicatorKind::crossover(IndicatorKind::Sma(1), IndicatorKind::Sma(2));
        assert!(kind.build().is_err());
    }
}
