use serde::{Deserialize, Serialize};

//a long-only holding in the traded instrument
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    //shares held, 0 when flat
    pub size: u32,

    //average entry price, 0 when flat
    pub entry_price: f64,
}

impl Position {
    //returns true if the position is flat (no open position)
    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    //returns true if the position is long
    pub fn is_long(&self) -> bool {
        self.size > 0
    }

    //market value at a given price
    pub fn market_value(&self, price: f64) -> f64 {
        price * self.size as f64
    }

    //unrealized pnl at a given price
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.size as f64
    }

    //adds shares, averaging the entry price
    pub(crate) fn increase(&mut self, size: u32, price: f64) {
        let total = self.size + size;
        self.entry_price =
            (self.entry_price * self.size as f64 + price * size as f64) / total as f64;
        self.size = total;
    }

    //removes shares and returns the gross pnl of the closed part
    //callers guarantee size <= self.size
    pub(crate) fn reduce(&mut self, size: u32, price: f64) -> f64 {
        let pnl = (price - self.entry_price) * size as f64;
        self.size -= size;
        if self.size == 0 {
            self.entry_price = 0.0;
        }
        pnl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn increase_averages_entry() {
        let mut pos = Position::default();
        pos.increase(10, 100.0);
        pos.increase(30, 104.0);
        assert_eq!(pos.size, 40);
        assert_relative_eq!(pos.entry_price, 103.0, epsilon = 1e-9);
    }

    #[test]
    fn partial_then_full_close() {
        let mut pos = Position::default();
        pos.increase(10, 50.0);

        assert_relative_eq!(pos.reduce(4, 55.0), 20.0, epsilon = 1e-9);
        assert_eq!(pos.size, 6);
        assert_relative_eq!(pos.entry_price, 50.0, epsilon = 1e-9);

        assert_relative_eq!(pos.reduce(6, 45.0), -30.0, epsilon = 1e-9);
        assert!(pos.is_flat());
        assert_eq!(pos.entry_price, 0.0);
    }

    #[test]
    fn values_at_price() {
        let pos = Position {
            size: 5,
            entry_price: 20.0,
        };
        assert!(pos.is_long());
        assert_relative_eq!(pos.market_value(22.0), 110.0, epsilon = 1e-9);
        assert_relative_eq!(pos.unrealized_pnl(22.0), 10.0, epsilon = 1e-9);
    }
}
