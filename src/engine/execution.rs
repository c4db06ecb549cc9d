use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type OrderId = u64;

//order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

//order lifecycle; filled, canceled and rejected are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Submitted,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }
}

//what actually happened when an order filled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub bar: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub size: u32,
    //price * size, before commission
    pub value: f64,
    pub commission: f64,
    //realized pnl net of commission, sells only
    pub pnl: Option<f64>,
}

//a market order, filled at the open of the bar after it was created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: OrderSide,
    pub size: u32,
    pub status: OrderStatus,
    pub requested_at_bar: usize,
    pub executed: Option<Execution>,
}

impl Order {
    //creates a pending order; the broker assigns the id on submit
    pub fn new(side: OrderSide, size: u32, requested_at_bar: usize) -> Self {
        Order {
            id: 0,
            side,
            size,
            status: OrderStatus::Pending,
            requested_at_bar,
            executed: None,
        }
    }

    pub fn buy(size: u32, requested_at_bar: usize) -> Self {
        Self::new(OrderSide::Buy, size, requested_at_bar)
    }

    pub fn sell(size: u32, requested_at_bar: usize) -> Self {
        Self::new(OrderSide::Sell, size, requested_at_bar)
    }

    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == OrderSide::Sell
    }
}

//a single status transition reported back to the strategy
//carries a snapshot of the order as of that transition
#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotification {
    pub order: Order,
    pub reason: Option<String>,
}

impl OrderNotification {
    pub fn new(order: &Order) -> Self {
        OrderNotification {
            order: order.clone(),
            reason: None,
        }
    }

    pub fn with_reason(order: &Order, reason: impl Into<String>) -> Self {
        OrderNotification {
            order: order.clone(),
            reason: Some(reason.into()),
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.order.status
    }
}
