//! Order Aggregate
//!
//! An order is the immutable snapshot taken when checkout confirms: the cart
//! lines, the computed price breakdown, the shipping address, and a masked
//! payment summary. Only `status` (and its timestamp) ever changes afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::aggregates::CartLine;
use crate::domain::checkout::ShippingForm;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::pricing::PriceBreakdown;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    order_number: String,
    user_id: String,
    status: OrderStatus,
    lines: Vec<CartLine>,
    breakdown: PriceBreakdown,
    shipping_address: ShippingForm,
    payment: PaymentSummary,
    placed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Delivered and Cancelled admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{}", label)
    }
}

/// What the order keeps about the chosen payment method. Card numbers are
/// reduced to their last four digits before the snapshot is taken.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentSummary {
    Card { last4: String },
    Paypal,
    Cod,
}

impl fmt::Display for PaymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card { last4 } => write!(f, "**** **** **** {}", last4),
            Self::Paypal => write!(f, "PayPal"),
            Self::Cod => write!(f, "Cash on Delivery"),
        }
    }
}

impl Order {
    pub fn place(
        user_id: impl Into<String>,
        lines: Vec<CartLine>,
        breakdown: PriceBreakdown,
        shipping_address: ShippingForm,
        payment: PaymentSummary,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut order = Self {
            id: id.clone(),
            order_number: format!("ORD-{:08}", rand::random::<u32>()),
            user_id: user_id.into(),
            status: OrderStatus::Pending,
            lines,
            breakdown,
            shipping_address,
            payment,
            placed_at: now,
            updated_at: now,
            events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: id,
            user_id: order.user_id.clone(),
            total: order.breakdown.total.amount(),
        }));
        order
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn breakdown(&self) -> &PriceBreakdown { &self.breakdown }
    pub fn shipping_address(&self) -> &ShippingForm { &self.shipping_address }
    pub fn payment(&self) -> &PaymentSummary { &self.payment }
    pub fn placed_at(&self) -> DateTime<Utc> { self.placed_at }
    pub fn requires_prescription(&self) -> bool { self.lines.iter().any(|l| l.prescription_required) }

    /// Administrative status change. Any move between non-terminal statuses
    /// is accepted; moving out of a terminal status is not.
    pub fn set_status(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        if self.status != next {
            let from = self.status;
            self.status = next;
            self.touch();
            self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged {
                order_id: self.id.clone(),
                from,
                to: next,
            }));
        }
        Ok(())
    }

    /// Customer-initiated cancellation, allowed while the order is pending,
    /// processing, or shipped.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Shipped => {
                let from = self.status;
                self.status = OrderStatus::Cancelled;
                self.touch();
                self.raise_event(DomainEvent::Order(OrderEvent::Cancelled {
                    order_id: self.id.clone(),
                    from,
                }));
                Ok(())
            }
            _ => Err(OrderError::InvalidTransition { from: self.status, to: OrderStatus::Cancelled }),
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone)]
pub enum OrderError {
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { from, to } => write!(f, "Cannot move order from {} to {}", from, to),
        }
    }
}
