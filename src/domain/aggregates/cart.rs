//! Cart Aggregate
//!
//! One cart per authenticated user. Lines keep insertion order for display,
//! hold at most one entry per product id, and freeze the product's name,
//! price, and prescription flag at add time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    user_id: String,
    lines: Vec<CartLine>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub prescription_required: bool,
}

impl CartLine {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

impl Cart {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), lines: vec![] }
    }

    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn line_count(&self) -> usize { self.lines.len() }
    pub fn item_count(&self) -> u32 { self.lines.iter().map(|l| l.quantity).sum() }
    pub fn requires_prescription(&self) -> bool { self.lines.iter().any(|l| l.prescription_required) }

    pub fn subtotal_amount(&self) -> Decimal {
        self.lines.iter().map(|l| l.unit_price.amount() * Decimal::from(l.quantity)).sum()
    }

    /// Adds `qty` units of `product`, merging into an existing line if one
    /// holds the same product id.
    pub fn add_item(&mut self, product: &Product, qty: u32) -> Result<(), CartError> {
        if qty == 0 { return Err(CartError::InvalidQuantity); }
        if let Some(existing) = self.lines.iter_mut().find(|l| l.product_id == product.id()) {
            existing.quantity = existing.quantity.saturating_add(qty);
        } else {
            self.lines.push(CartLine {
                product_id: product.id().to_string(),
                name: product.name().to_string(),
                unit_price: product.price().clone(),
                quantity: qty,
                prescription_required: product.prescription_required(),
            });
        }
        Ok(())
    }

    /// Sets a line's quantity. Zero deletes the line; an id not in the cart
    /// is left alone either way.
    pub fn update_quantity(&mut self, product_id: &str, qty: u32) {
        if qty == 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = qty;
        }
    }

    pub fn remove_item(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn clear(&mut self) { self.lines.clear(); }
}

#[derive(Debug, Clone)] pub enum CartError { InvalidQuantity }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Invalid quantity") }
}
