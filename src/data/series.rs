use crate::data::bar::Bar;
use crate::error::{BacktestError, Result};
use chrono::NaiveDate;

//ordered, immutable daily bars for a single instrument
//dates are strictly increasing; calendar gaps are kept as delivered
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    //validates ordering and builds the series
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self> {
        let symbol = symbol.into();

        if bars.is_empty() {
            return Err(BacktestError::data(format!("no bars for {}", symbol)));
        }

        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(BacktestError::data(format!(
                "{}: dates not strictly increasing ({} followed by {})",
                symbol, pair[0].date, pair[1].date
            )));
        }

        Ok(PriceSeries { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    //always false for a constructed series
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    //restricts the series to [from, to], both inclusive
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> Result<Self> {
        let bars: Vec<Bar> = self
            .bars
            .iter()
            .filter(|bar| bar.date >= from && bar.date <= to)
            .copied()
            .collect();

        if bars.is_empty() {
            return Err(BacktestError::data(format!(
                "no bars for {} between {} and {}",
                self.symbol, from, to
            )));
        }

        Ok(PriceSeries {
            symbol: self.symbol.clone(),
            bars,
        })
    }
}
