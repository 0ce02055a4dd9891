//! Persistence primitive and typed stores
//!
//! Everything durable goes through the `KeyValueStore` trait, keyed by user
//! identity the way the original frontend keyed `localStorage`. Tests and
//! the default deployment use the in-memory map; a real backend client can
//! be injected without touching the domain.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::domain::aggregates::{Cart, Order, OrderStatus};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Backend("store mutex poisoned".to_string()))
    }
}

impl KeyValueStore for InMemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError> {
    match store.load(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.save(key, &raw)
}

/// Carts, one JSON document per user under `cart_{user_id}`.
#[derive(Clone)]
pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
}

impl CartStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self { Self { store } }

    fn key(user_id: &str) -> String { format!("cart_{}", user_id) }

    /// A user with no persisted cart gets an empty one.
    pub fn load(&self, user_id: &str) -> Result<Cart, StoreError> {
        Ok(load_json(self.store.as_ref(), &Self::key(user_id))?.unwrap_or_else(|| Cart::empty(user_id)))
    }

    pub fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        save_json(self.store.as_ref(), &Self::key(cart.user_id()), cart)
    }
}

/// Wishlists, a JSON list of product ids per user under `wishlist_{user_id}`.
#[derive(Clone)]
pub struct WishlistStore {
    store: Arc<dyn KeyValueStore>,
}

impl WishlistStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self { Self { store } }

    fn key(user_id: &str) -> String { format!("wishlist_{}", user_id) }

    pub fn load(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(load_json(self.store.as_ref(), &Self::key(user_id))?.unwrap_or_default())
    }

    /// Adds the product id if absent, removes it if present. Returns whether
    /// the product is on the list afterwards.
    pub fn toggle(&self, user_id: &str, product_id: &str) -> Result<bool, StoreError> {
        let mut ids = self.load(user_id)?;
        let present = if let Some(pos) = ids.iter().position(|id| id == product_id) {
            ids.remove(pos);
            false
        } else {
            ids.push(product_id.to_string());
            true
        };
        save_json(self.store.as_ref(), &Self::key(user_id), &ids)?;
        Ok(present)
    }
}

/// All orders live under one `orders` key; customer views filter by user.
#[derive(Clone)]
pub struct OrderStore {
    store: Arc<dyn KeyValueStore>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub revenue: Decimal,
}

impl OrderStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self { Self { store } }

    const KEY: &'static str = "orders";

    pub fn all(&self) -> Result<Vec<Order>, StoreError> {
        Ok(load_json(self.store.as_ref(), Self::KEY)?.unwrap_or_default())
    }

    pub fn for_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
        Ok(self.all()?.into_iter().filter(|o| o.user_id() == user_id).collect())
    }

    pub fn find(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.all()?.into_iter().find(|o| o.id() == order_id))
    }

    /// Inserts the order, or replaces the stored copy with the same id.
    pub fn save(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.all()?;
        match orders.iter_mut().find(|o| o.id() == order.id()) {
            Some(existing) => *existing = order.clone(),
            None => orders.push(order.clone()),
        }
        save_json(self.store.as_ref(), Self::KEY, &orders)
    }

    /// Counts per status plus revenue over non-cancelled orders, backing the
    /// admin dashboard cards.
    pub fn stats(&self) -> Result<OrderStats, StoreError> {
        let orders = self.all()?;
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status() == status).count();
        Ok(OrderStats {
            total: orders.len(),
            pending: count(OrderStatus::Pending),
            processing: count(OrderStatus::Processing),
            shipped: count(OrderStatus::Shipped),
            delivered: count(OrderStatus::Delivered),
            cancelled: count(OrderStatus::Cancelled),
            revenue: orders
                .iter()
                .filter(|o| o.status() != OrderStatus::Cancelled)
                .map(|o| o.breakdown().total.amount())
                .sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Product;
    use crate::domain::checkout::ShippingForm;
    use crate::domain::aggregates::PaymentSummary;
    use crate::domain::pricing::{compute_breakdown, PricingConfig};
    use crate::domain::value_objects::Money;

    fn store() -> Arc<dyn KeyValueStore> { Arc::new(InMemoryStore::new()) }

    fn product() -> Product {
        Product::new("MED-001", "Paracetamol 500mg", Money::inr(Decimal::new(599, 2)), "Pain Relief")
            .unwrap()
            .with_stock(10)
    }

    fn placed_order(user_id: &str) -> Order {
        let mut cart = Cart::empty(user_id);
        cart.add_item(&product(), 2).unwrap();
        let breakdown = compute_breakdown(cart.lines(), Decimal::ZERO, &PricingConfig::default());
        Order::place(user_id, cart.lines().to_vec(), breakdown, ShippingForm::default(), PaymentSummary::Cod)
    }

    #[test]
    fn test_kv_roundtrip() {
        let store = InMemoryStore::new();
        assert!(store.load("missing").unwrap().is_none());
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.load("k").unwrap().is_none());
    }

    #[test]
    fn test_cart_store_keys_by_user() {
        let carts = CartStore::new(store());
        let mut cart = Cart::empty("alice");
        cart.add_item(&product(), 1).unwrap();
        carts.save(&cart).unwrap();

        assert_eq!(carts.load("alice").unwrap().line_count(), 1);
        assert!(carts.load("bob").unwrap().is_empty());
    }

    #[test]
    fn test_wishlist_toggle_is_an_involution() {
        let wishlists = WishlistStore::new(store());
        assert!(wishlists.toggle("alice", "MED-001").unwrap());
        assert!(!wishlists.toggle("alice", "MED-001").unwrap());
        assert!(wishlists.load("alice").unwrap().is_empty());
    }

    #[test]
    fn test_order_store_replaces_by_id() {
        let orders = OrderStore::new(store());
        let mut order = placed_order("alice");
        orders.save(&order).unwrap();
        order.set_status(OrderStatus::Processing).unwrap();
        orders.save(&order).unwrap();

        assert_eq!(orders.all().unwrap().len(), 1);
        let reloaded = orders.find(order.id()).unwrap().unwrap();
        assert_eq!(reloaded.status(), OrderStatus::Processing);
    }

    #[test]
    fn test_order_store_filters_by_user() {
        let orders = OrderStore::new(store());
        orders.save(&placed_order("alice")).unwrap();
        orders.save(&placed_order("bob")).unwrap();
        assert_eq!(orders.for_user("alice").unwrap().len(), 1);
        assert_eq!(orders.for_user("carol").unwrap().len(), 0);
    }

    #[test]
    fn test_stats_exclude_cancelled_revenue() {
        let orders = OrderStore::new(store());
        let kept = placed_order("alice");
        let mut cancelled = placed_order("bob");
        cancelled.cancel().unwrap();
        orders.save(&kept).unwrap();
        orders.save(&cancelled).unwrap();

        let stats = orders.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.revenue, kept.breakdown().total.amount());
    }
}
