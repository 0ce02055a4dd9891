//! Pricing derivation
//!
//! `compute_breakdown` is a pure function from cart lines and a discount
//! percentage to the figures the order summary shows. All arithmetic stays
//! at full precision; rounding happens only in `PriceBreakdown::rounded`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::aggregates::CartLine;
use crate::domain::value_objects::{Money, PromoCode};

/// Tax and shipping knobs, fixed per deployment.
#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub tax_rate: Decimal,
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(8, 2),
            free_shipping_threshold: Decimal::new(50, 0),
            flat_shipping_fee: Decimal::new(999, 2),
            currency: "INR".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub discount_percent: Decimal,
    pub discount_amount: Money,
    pub taxable_amount: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

impl PriceBreakdown {
    pub fn rounded(&self) -> PriceBreakdown {
        PriceBreakdown {
            subtotal: self.subtotal.rounded(),
            discount_percent: self.discount_percent,
            discount_amount: self.discount_amount.rounded(),
            taxable_amount: self.taxable_amount.rounded(),
            tax: self.tax.rounded(),
            shipping_fee: self.shipping_fee.rounded(),
            total: self.total.rounded(),
        }
    }
}

/// Derives subtotal, discount, tax, shipping, and total from cart lines.
///
/// The discount percentage is clamped to 0..=100 and applies to the
/// subtotal only. Shipping qualifies on the pre-discount subtotal, and an
/// empty cart totals zero while still reporting the flat fee.
pub fn compute_breakdown(lines: &[CartLine], discount_percent: Decimal, config: &PricingConfig) -> PriceBreakdown {
    let subtotal: Decimal = lines.iter().map(|l| l.unit_price.amount() * Decimal::from(l.quantity)).sum();
    let percent = discount_percent.clamp(Decimal::ZERO, Decimal::new(100, 0));
    let discount = subtotal * percent / Decimal::new(100, 0);
    let taxable = (subtotal - discount).max(Decimal::ZERO);
    let tax = taxable * config.tax_rate;
    let shipping = if subtotal >= config.free_shipping_threshold { Decimal::ZERO } else { config.flat_shipping_fee };
    let total = if lines.is_empty() { Decimal::ZERO } else { taxable + tax + shipping };

    let money = |amount: Decimal| Money::new(amount, &config.currency);
    PriceBreakdown {
        subtotal: money(subtotal),
        discount_percent: percent,
        discount_amount: money(discount),
        taxable_amount: money(taxable),
        tax: money(tax),
        shipping_fee: money(shipping),
        total: money(total),
    }
}

/// Promo code registry
///
/// Recognized codes map to a discount percentage; anything else resolves to
/// `PromoRejected`, which callers treat as zero discount plus a warning.
#[derive(Clone, Debug)]
pub struct Promotions {
    codes: HashMap<PromoCode, Decimal>,
}

impl Promotions {
    pub fn empty() -> Self { Self { codes: HashMap::new() } }

    /// The codes the storefront ships with.
    pub fn standard() -> Self {
        let mut promos = Self::empty();
        promos.register("save10", Decimal::new(10, 0));
        promos
    }

    pub fn register(&mut self, code: &str, percent: Decimal) {
        if let Ok(code) = PromoCode::new(code) {
            self.codes.insert(code, percent);
        }
    }

    pub fn resolve(&self, code: &str) -> Result<Decimal, PromoRejected> {
        let code = PromoCode::new(code).map_err(|_| PromoRejected)?;
        self.codes.get(&code).copied().ok_or(PromoRejected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct PromoRejected;
impl std::error::Error for PromoRejected {}
impl fmt::Display for PromoRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Promo code not recognized") }
}
