//! Value objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Money value object
///
/// Amounts stay at full precision internally; `rounded` applies the
/// two-decimal presentation rounding used at the API edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn inr(amount: Decimal) -> Self { Self::new(amount, "INR") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_zero(&self) -> bool { self.amount.is_zero() }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
    pub fn rounded(&self) -> Money { Money::new(self.amount.round_dp(2), &self.currency) }
}

impl Default for Money { fn default() -> Self { Self::zero("INR") } }

#[derive(Debug, Clone)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

/// Promo code value object
///
/// Codes are matched case-insensitively; normalization happens here so the
/// promotions registry only ever sees canonical tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromoCode(String);

impl PromoCode {
    pub fn new(value: impl Into<String>) -> Result<Self, PromoCodeError> {
        let value = value.into().trim().to_lowercase();
        if value.is_empty() { return Err(PromoCodeError::Empty); }
        if value.len() > 32 { return Err(PromoCodeError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone)] pub enum PromoCodeError { Empty, TooLong }
impl std::error::Error for PromoCodeError {}
impl fmt::Display for PromoCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "Promo code empty"), Self::TooLong => write!(f, "Promo code too long") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promo_code_normalizes() {
        let code = PromoCode::new("  SAVE10 ").unwrap();
        assert_eq!(code.as_str(), "save10");
    }

    #[test]
    fn test_promo_code_rejects_empty() {
        assert!(PromoCode::new("   ").is_err());
    }

    #[test]
    fn test_money_add() {
        let a = Money::inr(Decimal::new(599, 2));
        let b = Money::inr(Decimal::new(749, 2));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(1348, 2));
    }

    #[test]
    fn test_money_add_rejects_mismatched_currency() {
        let a = Money::inr(Decimal::ONE);
        let b = Money::new(Decimal::ONE, "USD");
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn test_money_rounds_for_presentation() {
        let m = Money::inr(Decimal::new(140184, 5));
        assert_eq!(m.rounded().amount(), Decimal::new(140, 2));
    }
}
