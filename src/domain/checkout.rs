//! Checkout state machine
//!
//! Walks Shipping -> Payment -> Review -> Confirmed, with Cancelled
//! reachable from every non-Confirmed step. Each advance validates its
//! step's required fields and leaves the session where it was on failure.
//!
//! Confirmation is split in two so the order snapshot can be persisted
//! before the session moves: `prepare_order` validates and builds the
//! snapshot without mutating anything, and `complete` flips the step once
//! the caller has stored the order and cleared the cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::domain::aggregates::{Cart, Order, PaymentSummary};
use crate::domain::pricing::PriceBreakdown;
use crate::domain::value_objects::PromoCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Review,
    Confirmed,
    Cancelled,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{}", label)
    }
}

/// Shipping form, prefilled by the UI from the user profile. Phone and
/// country are carried along but only the fields below are required.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingForm {
    #[validate(length(min = 1, message = "required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub phone: String,
    #[validate(length(min = 1, message = "required"))]
    pub address: String,
    #[validate(length(min = 1, message = "required"))]
    pub city: String,
    #[validate(length(min = 1, message = "required"))]
    pub state: String,
    #[validate(length(min = 1, message = "required"))]
    pub zip_code: String,
    pub country: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentMethod {
    #[serde(rename_all = "camelCase")]
    Card { card_number: String, expiry_date: String, cvv: String, name_on_card: String },
    Paypal,
    Cod,
}

impl PaymentMethod {
    /// Card payments require every card field; PayPal and cash on delivery
    /// have nothing further to fill in.
    fn missing_fields(&self) -> Vec<String> {
        let mut missing = vec![];
        if let Self::Card { card_number, expiry_date, cvv, name_on_card } = self {
            for (field, value) in [
                ("card_number", card_number),
                ("expiry_date", expiry_date),
                ("cvv", cvv),
                ("name_on_card", name_on_card),
            ] {
                if value.trim().is_empty() {
                    missing.push(field.to_string());
                }
            }
        }
        missing
    }

    pub fn summary(&self) -> PaymentSummary {
        match self {
            Self::Card { card_number, .. } => {
                let digits: Vec<char> = card_number.chars().filter(|c| c.is_ascii_digit()).collect();
                let last4 = digits.iter().rev().take(4).rev().collect();
                PaymentSummary::Card { last4 }
            }
            Self::Paypal => PaymentSummary::Paypal,
            Self::Cod => PaymentSummary::Cod,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CheckoutSession {
    user_id: String,
    step: CheckoutStep,
    shipping: Option<ShippingForm>,
    payment: Option<PaymentMethod>,
    promo: Option<PromoCode>,
    discount_percent: Decimal,
}

impl CheckoutSession {
    /// Opens a session on the Shipping step. The promo discount is resolved
    /// once, here, and rides along to the confirmed order's breakdown.
    pub fn begin(user_id: impl Into<String>, promo: Option<PromoCode>, discount_percent: Decimal) -> Self {
        Self {
            user_id: user_id.into(),
            step: CheckoutStep::Shipping,
            shipping: None,
            payment: None,
            promo,
            discount_percent,
        }
    }

    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn step(&self) -> CheckoutStep { self.step }
    pub fn shipping(&self) -> Option<&ShippingForm> { self.shipping.as_ref() }
    pub fn payment(&self) -> Option<&PaymentMethod> { self.payment.as_ref() }
    pub fn promo(&self) -> Option<&PromoCode> { self.promo.as_ref() }
    pub fn discount_percent(&self) -> Decimal { self.discount_percent }

    /// Shipping -> Payment.
    pub fn submit_shipping(&mut self, form: ShippingForm) -> Result<CheckoutStep, CheckoutError> {
        if self.step != CheckoutStep::Shipping {
            return Err(CheckoutError::InvalidTransition { step: self.step, action: "submit shipping" });
        }
        if let Err(errors) = form.validate() {
            let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
            fields.sort();
            return Err(CheckoutError::Validation { fields });
        }
        self.shipping = Some(form);
        self.step = CheckoutStep::Payment;
        Ok(self.step)
    }

    /// Payment -> Review.
    pub fn submit_payment(&mut self, method: PaymentMethod) -> Result<CheckoutStep, CheckoutError> {
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::InvalidTransition { step: self.step, action: "submit payment" });
        }
        let mut missing = method.missing_fields();
        if !missing.is_empty() {
            missing.sort();
            return Err(CheckoutError::Validation { fields: missing });
        }
        self.payment = Some(method);
        self.step = CheckoutStep::Review;
        Ok(self.step)
    }

    /// The user's Back button: Payment -> Shipping or Review -> Payment.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.step = match self.step {
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Review => CheckoutStep::Payment,
            step => return Err(CheckoutError::InvalidTransition { step, action: "go back" }),
        };
        Ok(self.step)
    }

    /// Discards the session from any step but Confirmed. The cart is not
    /// touched.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        if self.step == CheckoutStep::Confirmed {
            return Err(CheckoutError::InvalidTransition { step: self.step, action: "cancel" });
        }
        self.step = CheckoutStep::Cancelled;
        Ok(())
    }

    /// Builds the order snapshot for Review -> Confirmed without mutating
    /// the session or the cart. Callers persist the order, clear the cart,
    /// and then call `complete`.
    pub fn prepare_order(&self, cart: &Cart, breakdown: PriceBreakdown) -> Result<Order, CheckoutError> {
        if self.step != CheckoutStep::Review {
            return Err(CheckoutError::InvalidTransition { step: self.step, action: "confirm" });
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let (Some(shipping), Some(payment)) = (self.shipping.as_ref(), self.payment.as_ref()) else {
            return Err(CheckoutError::InvalidTransition { step: self.step, action: "confirm" });
        };
        Ok(Order::place(
            self.user_id.clone(),
            cart.lines().to_vec(),
            breakdown,
            shipping.clone(),
            payment.summary(),
        ))
    }

    /// Review -> Confirmed. Only meaningful after `prepare_order` succeeded
    /// and the snapshot was persisted.
    pub fn complete(&mut self) {
        self.step = CheckoutStep::Confirmed;
    }
}

#[derive(Debug, Clone)]
pub enum CheckoutError {
    Validation { fields: Vec<String> },
    InvalidTransition { step: CheckoutStep, action: &'static str },
    EmptyCart,
}
impl std::error::Error for CheckoutError {}
impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { fields } => write!(f, "Validation failed: {}", fields.join(", ")),
            Self::InvalidTransition { step, action } => write!(f, "Cannot {} from the {} step", action, step),
            Self::EmptyCart => write!(f, "Cart is empty"),
        }
    }
}
