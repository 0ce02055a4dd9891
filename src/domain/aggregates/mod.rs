//! Aggregates module
pub mod product;
pub mod cart;
pub mod order;

pub use product::{Product, ProductError};
pub use cart::{Cart, CartError, CartLine};
pub use order::{Order, OrderError, OrderStatus, PaymentSummary};
