pub mod position;

pub use position::Position;

use serde::{Deserialize, Serialize};

//cash, holdings and accumulated costs of a single-instrument run
//only the broker mutates it; strategies read it through StrategyContext
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    //starting cash
    pub initial_cash: f64,

    //current cash after fills and commission
    pub cash: f64,

    //the open position (flat when size is 0)
    pub position: Position,

    //pnl of closed shares, net of sell-side commission
    pub realized_pnl: f64,

    //all commission charged so far, both sides
    pub commission_paid: f64,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            initial_cash,
            cash: initial_cash,
            position: Position::default(),
            realized_pnl: 0.0,
            commission_paid: 0.0,
        }
    }

    //market value of the position at a given price
    pub fn position_value(&self, price: f64) -> f64 {
        self.position.market_value(price)
    }

    //total equity: cash plus position marked at price
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position_value(price)
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.position.unrealized_pnl(price)
    }

    //total return as a fraction of initial cash
    pub fn total_return(&self, price: f64) -> f64 {
        (self.equity(price) - self.initial_cash) / self.initial_cash
    }

    //books a buy; the caller has already checked affordability
    pub(crate) fn apply_buy(&mut self, size: u32, price: f64, commission: f64) {
        self.cash -= price * size as f64 + commission;
        self.commission_paid += commission;
        self.position.increase(size, price);
    }

    //books a sell and returns the realized pnl net of its commission
    pub(crate) fn apply_sell(&mut self, size: u32, price: f64, commission: f64) -> f64 {
        self.cash += price * size as f64 - commission;
        self.commission_paid += commission;
        let pnl = self.position.reduce(size, price) - commission;
        self.realized_pnl += pnl;
        pnl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn buy_deducts_cost_and_commission() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.apply_buy(10, 100.0, 1.0);

        assert_relative_eq!(portfolio.cash, 10_000.0 - 1001.0, epsilon = 1e-9);
        assert_relative_eq!(portfolio.commission_paid, 1.0, epsilon = 1e-9);
        assert_relative_eq!(portfolio.equity(100.0), 9_999.0, epsilon = 1e-9);
    }

    #[test]
    fn round_trip_realizes_net_pnl() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.apply_buy(5, 100.0, 0.5);
        let pnl = portfolio.apply_sell(5, 110.0, 0.55);

        assert_relative_eq!(pnl, 50.0 - 0.55, epsilon = 1e-9);
        assert_relative_eq!(portfolio.realized_pnl, 49.45, epsilon = 1e-9);
        assert_relative_eq!(portfolio.commission_paid, 1.05, epsilon = 1e-9);
        assert_relative_eq!(portfolio.cash, 1_000.0 + 50.0 - 1.05, epsilon = 1e-9);
        assert!(portfolio.position.is_flat());
        assert_relative_eq!(portfolio.equity(123.0), portfolio.cash, epsilon = 1e-9);
    }
}
