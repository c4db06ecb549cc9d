//simple moving average of close, running sum over a trailing window

use crate::data::Bar;
use crate::indicators::Indicator;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
    current: Option<f64>,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Sma {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            current: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.window.push_back(bar.close);
        self.sum += bar.close;

        if self.window.len() > self.period {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }

        self.current = (self.window.len() == self.period).then(|| self.sum / self.period as f64);
        self.current
    }

    fn value(&self) -> Option<f64> {
        self.current
    }

    fn warmup(&self) -> usize {
        self.period.saturating_sub(1)
    }
}
