//average true range with wilder smoothing
//first n true ranges seed a simple mean, then atr = (prev_atr * (n-1) + tr) / n

use crate::data::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    ranges: usize,
    atr: f64,
    current: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Atr {
            period,
            prev_close: None,
            ranges: 0,
            atr: 0.0,
            current: None,
        }
    }
}

impl Indicator for Atr {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let prev = self.prev_close.replace(bar.close)?;

        let tr = bar.true_range(prev);
        let n = self.period as f64;

        self.ranges += 1;
        if self.ranges <= self.period {
            self.atr += (tr - self.atr) / self.ranges as f64;
        } else {
            self.atr = (self.atr * (n - 1.0) + tr) / n;
        }

        self.current = (self.ranges >= self.period).then_some(self.atr);
        self.current
    }

    fn value(&self) -> Option<f64> {
        self.current
    }

    fn warmup(&self) -> usize {
        self.period
    }
}
