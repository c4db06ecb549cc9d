//rate of change as a fraction: (close[i] - close[i-n]) / close[i-n]

use crate::data::Bar;
use crate::indicators::Indicator;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    closes: VecDeque<f64>,
    current: Option<f64>,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        Roc {
            period,
            closes: VecDeque::with_capacity(period + 1),
            current: None,
        }
    }
}

impl Indicator for Roc {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.closes.push_back(bar.close);
        if self.closes.len() > self.period + 1 {
            self.closes.pop_front();
        }

        self.current = match self.closes.front() {
            Some(&base) if self.closes.len() == self.period + 1 && base != 0.0 => {
                Some((bar.close - base) / base)
            }
            _ => None,
        };
        self.current
    }

    fn value(&self) -> Option<f64> {
        self.current
    }

    fn warmup(&self) -> usize {
        self.period
    }
}
