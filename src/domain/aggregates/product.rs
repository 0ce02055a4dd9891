//! Product record
//!
//! Products are supplied by the catalog and are read-only to the cart and
//! checkout flow; required fields are validated once, at construction.

use serde::Serialize;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: String,
    name: String,
    description: String,
    price: Money,
    category: String,
    stock: u32,
    prescription_required: bool,
    image_url: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money, category: impl Into<String>) -> Result<Self, ProductError> {
        let id = id.into();
        let name = name.into();
        if id.trim().is_empty() { return Err(ProductError::MissingId); }
        if name.trim().is_empty() { return Err(ProductError::MissingName); }
        if price.amount().is_sign_negative() { return Err(ProductError::NegativePrice); }
        Ok(Self {
            id, name, price, category: category.into(),
            description: String::new(), stock: 0, prescription_required: false, image_url: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }
    pub fn with_stock(mut self, stock: u32) -> Self { self.stock = stock; self }
    pub fn with_prescription(mut self) -> Self { self.prescription_required = true; self }
    pub fn with_image(mut self, url: impl Into<String>) -> Self { self.image_url = Some(url.into()); self }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> &Money { &self.price }
    pub fn category(&self) -> &str { &self.category }
    pub fn stock(&self) -> u32 { self.stock }
    pub fn prescription_required(&self) -> bool { self.prescription_required }
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
}

#[derive(Debug, Clone)] pub enum ProductError { MissingId, MissingName, NegativePrice }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "Missing product id"),
            Self::MissingName => write!(f, "Missing product name"),
            Self::NegativePrice => write!(f, "Negative price"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_product_create() {
        let p = Product::new("MED-001", "Paracetamol 500mg", Money::inr(Decimal::new(599, 2)), "Pain Relief")
            .unwrap()
            .with_stock(50);
        assert_eq!(p.name(), "Paracetamol 500mg");
        assert!(p.is_in_stock());
        assert!(!p.prescription_required());
    }

    #[test]
    fn test_product_requires_name() {
        let err = Product::new("MED-002", "  ", Money::default(), "Vitamins");
        assert!(err.is_err());
    }

    #[test]
    fn test_product_rejects_negative_price() {
        let err = Product::new("MED-003", "Aspirin 75mg", Money::inr(Decimal::new(-1, 0)), "Pain Relief");
        assert!(err.is_err());
    }
}
