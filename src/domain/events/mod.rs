//! Domain events
use rust_decimal::Decimal;
use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug)]
pub enum DomainEvent {
    Order(OrderEvent),
}

#[derive(Clone, Debug)]
pub enum OrderEvent {
    Placed { order_id: String, user_id: String, total: Decimal },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
    Cancelled { order_id: String, from: OrderStatus },
}
