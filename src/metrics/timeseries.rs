use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//a point in the equity curve, recorded at the close of each simulated bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub position_value: f64,
    pub equity: f64,
    //fraction below the running peak
    pub drawdown: f64,
    //simple return against the previous point
    pub returns: f64,
}

//raw per-bar snapshot before drawdown and returns are derived
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub position_value: f64,
}

impl Snapshot {
    pub fn equity(&self) -> f64 {
        self.cash + self.position_value
    }
}

//calculates the equity curve with drawdowns
pub fn calculate_equity_curve(snapshots: &[Snapshot], initial_cash: f64) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(snapshots.len());
    let mut peak = initial_cash;
    let mut prev_equity = initial_cash;

    for snapshot in snapshots {
        let equity = snapshot.equity();

        //update peak
        if equity > peak {
            peak = equity;
        }

        let drawdown = if peak > 0.0 {
            (peak - equity) / peak
        } else {
            0.0
        };

        let returns = if prev_equity != 0.0 {
            (equity - prev_equity) / prev_equity
        } else {
            0.0
        };

        curve.push(EquityPoint {
            date: snapshot.date,
            cash: snapshot.cash,
            position_value: snapshot.position_value,
            equity,
            drawdown,
            returns,
        });
        prev_equity = equity;
    }

    curve
}

//calculates maximum drawdown from equity curve
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    equity_curve
        .iter()
        .map(|point| point.drawdown)
        .fold(0.0, f64::max)
}

//largest peak-to-trough loss in money terms
pub fn max_drawdown_money(equity_curve: &[EquityPoint], initial_cash: f64) -> f64 {
    let mut peak = initial_cash;
    let mut worst = 0.0_f64;
    for point in equity_curve {
        peak = peak.max(point.equity);
        worst = worst.max(peak - point.equity);
    }
    worst
}

//longest run of consecutive bars spent below a prior peak
pub fn max_drawdown_len(equity_curve: &[EquityPoint]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for point in equity_curve {
        if point.drawdown > 0.0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

//per-bar returns taken from the curve, skipping the first point
pub fn calculate_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve.iter().skip(1).map(|p| p.returns).collect()
}
