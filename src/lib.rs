//! Medicart
//!
//! Self-hosted pharmacy storefront service.
//!
//! ## Features
//! - Product catalog with search and category filters
//! - Per-user shopping cart with merge-on-add and frozen line prices
//! - Promo code, tax, and shipping derivation
//! - Guided checkout (Shipping -> Payment -> Review -> Confirmed)
//! - Order lifecycle with administrative status management

pub mod catalog;
pub mod domain;
pub mod service;
pub mod store;

use thiserror::Error;

use domain::aggregates::{CartError, OrderError};
use domain::checkout::CheckoutError;
use store::StoreError;

pub use service::Storefront;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum Error {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Product out of stock: {0}")]
    OutOfStock(String),

    #[error("No checkout session in progress")]
    NoCheckoutSession,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
