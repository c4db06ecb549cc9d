use crate::data::Bar;
use crate::engine::execution::{
    Execution, Order, OrderId, OrderNotification, OrderSide, OrderStatus,
};
use crate::portfolio::Portfolio;

//simulated broker: queues market orders and fills them at the next bar's open
//every status change produces exactly one notification
#[derive(Debug, Clone)]
pub struct BrokerSim {
    commission_rate: f64,
    portfolio: Portfolio,
    pending: Vec<Order>,
    filled: Vec<Order>,
    next_order_id: OrderId,
}

impl BrokerSim {
    pub fn new(initial_cash: f64, commission_rate: f64) -> Self {
        BrokerSim {
            commission_rate,
            portfolio: Portfolio::new(initial_cash),
            pending: Vec::new(),
            filled: Vec::new(),
            next_order_id: 1,
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    //commission charged on a fill of size shares at price
    pub fn commission(&self, price: f64, size: u32) -> f64 {
        price * size as f64 * self.commission_rate
    }

    //accepts an order for execution on a later bar
    pub fn submit(&mut self, mut order: Order) -> OrderNotification {
        order.id = self.next_order_id;
        self.next_order_id += 1;

        if order.size == 0 {
            order.status = OrderStatus::Rejected;
            tracing::warn!(order_id = order.id, "rejecting zero-size order");
            return OrderNotification::with_reason(&order, "order size must be positive");
        }

        order.status = OrderStatus::Submitted;
        tracing::debug!(
            order_id = order.id,
            side = ?order.side,
            size = order.size,
            bar = order.requested_at_bar,
            "order submitted"
        );

        let notification = OrderNotification::new(&order);
        self.pending.push(order);
        notification
    }

    //fills everything queued before bar_index at this bar's open
    pub fn process_bar(&mut self, bar_index: usize, bar: &Bar) -> Vec<OrderNotification> {
        let (due, waiting): (Vec<Order>, Vec<Order>) = self
            .pending
            .drain(..)
            .partition(|order| order.requested_at_bar < bar_index);
        self.pending = waiting;

        due.into_iter()
            .map(|order| self.execute(order, bar_index, bar))
            .collect()
    }

    fn execute(&mut self, mut order: Order, bar_index: usize, bar: &Bar) -> OrderNotification {
        let price = bar.open;
        let value = price * order.size as f64;
        let commission = self.commission(price, order.size);

        let pnl = match order.side {
            OrderSide::Buy => {
                let cost = value + commission;
                if cost > self.portfolio.cash {
                    order.status = OrderStatus::Rejected;
                    return OrderNotification::with_reason(
                        &order,
                        format!(
                            "insufficient cash: need {:.2}, have {:.2}",
                            cost, self.portfolio.cash
                        ),
                    );
                }
                self.portfolio.apply_buy(order.size, price, commission);
                None
            }
            OrderSide::Sell => {
                let held = self.portfolio.position.size;
                if order.size > held {
                    order.status = OrderStatus::Rejected;
                    return OrderNotification::with_reason(
                        &order,
                        format!("sell of {} exceeds position of {}", order.size, held),
                    );
                }
                Some(self.portfolio.apply_sell(order.size, price, commission))
            }
        };

        order.status = OrderStatus::Filled;
        order.executed = Some(Execution {
            bar: bar_index,
            date: bar.date,
            price,
            size: order.size,
            value,
            commission,
            pnl,
        });

        let notification = OrderNotification::new(&order);
        self.filled.push(order);
        notification
    }

    //cancels every order still waiting for a fill
    pub fn cancel_all(&mut self) -> Vec<OrderNotification> {
        self.pending
            .drain(..)
            .map(|mut order| {
                order.status = OrderStatus::Canceled;
                OrderNotification::with_reason(&order, "canceled before execution")
            })
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    //filled orders in execution order
    pub fn filled_orders(&self) -> &[Order] {
        &self.filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bar(open: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        Bar::new(date, open, open + 1.0, open - 1.0, open, 1000.0).unwrap()
    }

    #[test]
    fn buy_fills_next_bar_with_commission() {
        let mut broker = BrokerSim::new(10_000.0, 0.001);
        let submitted = broker.submit(Order::buy(10, 0));
        assert_eq!(submitted.status(), OrderStatus::Submitted);

        //not yet: same bar as the request
        assert!(broker.process_bar(0, &bar(99.0)).is_empty());

        let notes = broker.process_bar(1, &bar(100.0));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].status(), OrderStatus::Filled);

        let exec = notes[0].order.executed.unwrap();
        assert_relative_eq!(exec.price, 100.0, epsilon = 1e-9);
        assert_relative_eq!(exec.commission, 1.0, epsilon = 1e-9);
        assert_relative_eq!(broker.portfolio().cash, 10_000.0 - 1001.0, epsilon = 1e-9);
        assert_eq!(broker.portfolio().position.size, 10);
        assert_eq!(broker.pending_count(), 0);
    }

    #[test]
    fn unaffordable_buy_is_rejected_untouched() {
        let mut broker = BrokerSim::new(1_000.0, 0.001);
        broker.submit(Order::buy(10, 0));

        let notes = broker.process_bar(1, &bar(100.0));
        assert_eq!(notes[0].status(), OrderStatus::Rejected);
        assert!(notes[0].reason.as_deref().unwrap().contains("insufficient cash"));
        assert_relative_eq!(broker.portfolio().cash, 1_000.0, epsilon = 1e-9);
        assert!(broker.portfolio().position.is_flat());
        assert!(broker.filled_orders().is_empty());
    }

    #[test]
    fn exact_cash_is_affordable() {
        let mut broker = BrokerSim::new(1_001.0, 0.001);
        broker.submit(Order::buy(10, 0));
        let notes = broker.process_bar(1, &bar(100.0));
        assert_eq!(notes[0].status(), OrderStatus::Filled);
        assert!(broker.portfolio().cash.abs() < 1e-9);
    }

    #[test]
    fn sell_beyond_position_is_rejected() {
        let mut broker = BrokerSim::new(1_000.0, 0.0);
        broker.submit(Order::sell(1, 0));
        let notes = broker.process_bar(1, &bar(10.0));
        assert_eq!(notes[0].status(), OrderStatus::Rejected);
    }

    #[test]
    fn sell_realizes_pnl_net_of_commission() {
        let mut broker = BrokerSim::new(10_000.0, 0.001);
        broker.submit(Order::buy(10, 0));
        broker.process_bar(1, &bar(100.0));
        broker.submit(Order::sell(10, 1));
        let notes = broker.process_bar(2, &bar(110.0));

        let exec = notes[0].order.executed.unwrap();
        assert_relative_eq!(exec.pnl.unwrap(), 100.0 - 1.1, epsilon = 1e-9);
        assert_relative_eq!(broker.portfolio().realized_pnl, 98.9, epsilon = 1e-9);
        assert_relative_eq!(broker.portfolio().commission_paid, 2.1, epsilon = 1e-9);
        assert_relative_eq!(broker.portfolio().cash, 10_000.0 + 100.0 - 2.1, epsilon = 1e-9);
        assert_eq!(broker.filled_orders().len(), 2);
    }

    #[test]
    fn cancel_all_reports_each_pending_once() {
        let mut broker = BrokerSim::new(10_000.0, 0.0);
        let first = broker.submit(Order::buy(1, 3));
        let second = broker.submit(Order::buy(2, 3));
        assert_ne!(first.order.id, second.order.id);

        let notes = broker.cancel_all();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.status() == OrderStatus::Canceled));
        assert!(broker.cancel_all().is_empty());
    }

    #[test]
    fn zero_size_is_rejected_on_submit() {
        let mut broker = BrokerSim::new(10_000.0, 0.0);
        let note = broker.submit(Order::buy(0, 0));
        assert_eq!(note.status(), OrderStatus::Rejected);
        assert_eq!(broker.pending_count(), 0);
    }
}
