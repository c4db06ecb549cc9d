//relative strength index with wilder smoothing
//seeded with the mean of the first n changes, 100 when avg_loss == 0

use crate::data::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
    current: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Rsi {
            period,
            prev_close: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            current: None,
        }
    }

    fn rsi(&self) -> f64 {
        if self.avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + self.avg_gain / self.avg_loss)
        }
    }
}

impl Indicator for Rsi {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let prev = self.prev_close.replace(bar.close)?;

        let change = bar.close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let n = self.period as f64;

        self.changes += 1;
        if self.changes <= self.period {
            //accumulate the seed as a running mean
            self.avg_gain += (gain - self.avg_gain) / self.changes as f64;
            self.avg_loss += (loss - self.avg_loss) / self.changes as f64;
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        self.current = (self.changes >= self.period).then(|| self.rsi());
        self.current
    }

    fn value(&self) -> Option<f64> {
        self.current
    }

    fn warmup(&self) -> usize {
        self.period
    }
}
