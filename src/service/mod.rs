//! Storefront facade
//!
//! The single context object the UI layer drives. It owns the catalog, the
//! per-user stores, the promotions registry, the pricing config, and the
//! in-flight checkout sessions; every cart, checkout, and order operation
//! is a method here, so the whole flow is testable without HTTP.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::catalog::ProductCatalog;
use crate::domain::aggregates::{Cart, CartLine, Order, OrderStatus, PaymentSummary, Product};
use crate::domain::checkout::{CheckoutSession, CheckoutStep, PaymentMethod, ShippingForm};
use crate::domain::pricing::{compute_breakdown, PriceBreakdown, PricingConfig, Promotions};
use crate::domain::value_objects::PromoCode;
use crate::store::{CartStore, KeyValueStore, OrderStats, OrderStore, WishlistStore};
use crate::{Error, Result};

/// What became of a promo code passed with a breakdown read. Rejection is a
/// warning for the UI, never a failing call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromoOutcome {
    None,
    Applied,
    Rejected,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub requires_prescription: bool,
    pub breakdown: PriceBreakdown,
    pub promo: PromoOutcome,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub shipping: Option<ShippingForm>,
    pub payment: Option<PaymentSummary>,
    pub promo_code: Option<String>,
    pub discount_percent: Decimal,
}

impl From<&CheckoutSession> for CheckoutView {
    fn from(session: &CheckoutSession) -> Self {
        Self {
            step: session.step(),
            shipping: session.shipping().cloned(),
            payment: session.payment().map(PaymentMethod::summary),
            promo_code: session.promo().map(|c| c.to_string()),
            discount_percent: session.discount_percent(),
        }
    }
}

pub struct Storefront {
    catalog: Arc<dyn ProductCatalog>,
    carts: CartStore,
    wishlists: WishlistStore,
    orders: OrderStore,
    promotions: Promotions,
    pricing: PricingConfig,
    sessions: Mutex<HashMap<String, CheckoutSession>>,
}

impl Storefront {
    pub fn new(catalog: Arc<dyn ProductCatalog>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            catalog,
            carts: CartStore::new(store.clone()),
            wishlists: WishlistStore::new(store.clone()),
            orders: OrderStore::new(store),
            promotions: Promotions::standard(),
            pricing: PricingConfig::default(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_promotions(mut self, promotions: Promotions) -> Self {
        self.promotions = promotions;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    pub fn products(&self, term: Option<&str>, category: Option<&str>) -> Vec<Product> {
        self.catalog.search(term, category)
    }

    pub fn product(&self, product_id: &str) -> Result<Product> {
        self.catalog.product(product_id).ok_or_else(|| Error::ProductNotFound(product_id.to_string()))
    }

    // ------------------------------------------------------------------
    // Cart
    // ------------------------------------------------------------------

    pub fn cart(&self, user_id: &str, promo: Option<&str>) -> Result<CartView> {
        let cart = self.carts.load(user_id)?;
        Ok(self.view(&cart, promo))
    }

    pub fn add_to_cart(&self, user_id: &str, product_id: &str, qty: u32) -> Result<CartView> {
        let product = self.product(product_id)?;
        if !product.is_in_stock() {
            return Err(Error::OutOfStock(product_id.to_string()));
        }
        let mut cart = self.carts.load(user_id)?;
        cart.add_item(&product, qty)?;
        self.carts.save(&cart)?;
        Ok(self.view(&cart, None))
    }

    pub fn update_quantity(&self, user_id: &str, product_id: &str, qty: u32) -> Result<CartView> {
        let mut cart = self.carts.load(user_id)?;
        cart.update_quantity(product_id, qty);
        self.carts.save(&cart)?;
        Ok(self.view(&cart, None))
    }

    pub fn remove_from_cart(&self, user_id: &str, product_id: &str) -> Result<CartView> {
        let mut cart = self.carts.load(user_id)?;
        cart.remove_item(product_id);
        self.carts.save(&cart)?;
        Ok(self.view(&cart, None))
    }

    pub fn clear_cart(&self, user_id: &str) -> Result<CartView> {
        let mut cart = self.carts.load(user_id)?;
        cart.clear();
        self.carts.save(&cart)?;
        Ok(self.view(&cart, None))
    }

    // ------------------------------------------------------------------
    // Wishlist
    // ------------------------------------------------------------------

    /// Resolves stored ids against the catalog, dropping products that have
    /// since disappeared.
    pub fn wishlist(&self, user_id: &str) -> Result<Vec<Product>> {
        let ids = self.wishlists.load(user_id)?;
        Ok(ids.iter().filter_map(|id| self.catalog.product(id)).collect())
    }

    pub fn toggle_wishlist(&self, user_id: &str, product_id: &str) -> Result<bool> {
        self.product(product_id)?;
        Ok(self.wishlists.toggle(user_id, product_id)?)
    }

    // ------------------------------------------------------------------
    // Checkout
    // ------------------------------------------------------------------

    /// Opens a checkout session on the Shipping step, replacing any session
    /// already in flight for this user. A rejected promo code starts the
    /// session with no discount; the cart page has already warned about it.
    pub fn begin_checkout(&self, user_id: &str, promo: Option<&str>) -> Result<CheckoutView> {
        let cart = self.carts.load(user_id)?;
        if cart.is_empty() {
            return Err(Error::Checkout(crate::domain::checkout::CheckoutError::EmptyCart));
        }
        let (discount, outcome) = self.resolve_promo(promo);
        let promo_code = match outcome {
            PromoOutcome::Applied => promo.and_then(|c| PromoCode::new(c).ok()),
            _ => None,
        };
        let session = CheckoutSession::begin(user_id, promo_code, discount);
        let view = CheckoutView::from(&session);
        self.sessions()?.insert(user_id.to_string(), session);
        Ok(view)
    }

    pub fn checkout(&self, user_id: &str) -> Result<CheckoutView> {
        let sessions = self.sessions()?;
        let session = sessions.get(user_id).ok_or(Error::NoCheckoutSession)?;
        Ok(CheckoutView::from(session))
    }

    pub fn submit_shipping(&self, user_id: &str, form: ShippingForm) -> Result<CheckoutView> {
        let mut sessions = self.sessions()?;
        let session = sessions.get_mut(user_id).ok_or(Error::NoCheckoutSession)?;
        session.submit_shipping(form)?;
        Ok(CheckoutView::from(&*session))
    }

    pub fn submit_payment(&self, user_id: &str, method: PaymentMethod) -> Result<CheckoutView> {
        let mut sessions = self.sessions()?;
        let session = sessions.get_mut(user_id).ok_or(Error::NoCheckoutSession)?;
        session.submit_payment(method)?;
        Ok(CheckoutView::from(&*session))
    }

    pub fn checkout_back(&self, user_id: &str) -> Result<CheckoutView> {
        let mut sessions = self.sessions()?;
        let session = sessions.get_mut(user_id).ok_or(Error::NoCheckoutSession)?;
        session.back()?;
        Ok(CheckoutView::from(&*session))
    }

    /// Discards the session; the cart keeps its lines.
    pub fn cancel_checkout(&self, user_id: &str) -> Result<()> {
        let mut sessions = self.sessions()?;
        let session = sessions.get_mut(user_id).ok_or(Error::NoCheckoutSession)?;
        session.cancel()?;
        sessions.remove(user_id);
        Ok(())
    }

    /// Review -> Confirmed. The order snapshot is persisted before the cart
    /// is cleared, so a failed order write leaves both cart and session as
    /// they were.
    pub fn confirm_checkout(&self, user_id: &str) -> Result<Order> {
        let mut sessions = self.sessions()?;
        let session = sessions.get_mut(user_id).ok_or(Error::NoCheckoutSession)?;
        let mut cart = self.carts.load(user_id)?;
        let breakdown = compute_breakdown(cart.lines(), session.discount_percent(), &self.pricing);
        let mut order = session.prepare_order(&cart, breakdown)?;
        self.orders.save(&order)?;
        cart.clear();
        self.carts.save(&cart)?;
        session.complete();
        sessions.remove(user_id);
        self.drain_events(&mut order);
        tracing::info!(order_id = %order.id(), order_number = %order.order_number(), "order placed");
        Ok(order)
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    pub fn orders_for(&self, user_id: &str) -> Result<Vec<Order>> {
        Ok(self.orders.for_user(user_id)?)
    }

    pub fn order_for(&self, user_id: &str, order_id: &str) -> Result<Order> {
        self.orders
            .find(order_id)?
            .filter(|o| o.user_id() == user_id)
            .ok_or_else(|| Error::OrderNotFound(order_id.to_string()))
    }

    /// Customer cancellation, allowed while the order is pending,
    /// processing, or shipped.
    pub fn cancel_order(&self, user_id: &str, order_id: &str) -> Result<Order> {
        let mut order = self.order_for(user_id, order_id)?;
        order.cancel()?;
        self.orders.save(&order)?;
        self.drain_events(&mut order);
        Ok(order)
    }

    /// Adds a past order's lines back into the cart at current catalog
    /// prices; products no longer stocked are skipped.
    pub fn reorder(&self, user_id: &str, order_id: &str) -> Result<CartView> {
        let order = self.order_for(user_id, order_id)?;
        let mut cart = self.carts.load(user_id)?;
        for line in order.lines() {
            match self.catalog.product(&line.product_id) {
                Some(product) => cart.add_item(&product, line.quantity)?,
                None => tracing::warn!(product_id = %line.product_id, "reorder skipped a delisted product"),
            }
        }
        self.carts.save(&cart)?;
        Ok(self.view(&cart, None))
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub fn all_orders(&self) -> Result<Vec<Order>> {
        Ok(self.orders.all()?)
    }

    pub fn set_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        let mut order = self.orders.find(order_id)?.ok_or_else(|| Error::OrderNotFound(order_id.to_string()))?;
        order.set_status(status)?;
        self.orders.save(&order)?;
        self.drain_events(&mut order);
        Ok(order)
    }

    pub fn order_stats(&self) -> Result<OrderStats> {
        Ok(self.orders.stats()?)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, CheckoutSession>>> {
        self.sessions.lock().map_err(|_| Error::Internal("checkout session lock poisoned".to_string()))
    }

    fn resolve_promo(&self, code: Option<&str>) -> (Decimal, PromoOutcome) {
        match code {
            None => (Decimal::ZERO, PromoOutcome::None),
            Some(code) => match self.promotions.resolve(code) {
                Ok(percent) => (percent, PromoOutcome::Applied),
                Err(_) => (Decimal::ZERO, PromoOutcome::Rejected),
            },
        }
    }

    fn view(&self, cart: &Cart, promo: Option<&str>) -> CartView {
        let (discount, outcome) = self.resolve_promo(promo);
        CartView {
            lines: cart.lines().to_vec(),
            item_count: cart.item_count(),
            requires_prescription: cart.requires_prescription(),
            breakdown: compute_breakdown(cart.lines(), discount, &self.pricing),
            promo: outcome,
        }
    }

    fn drain_events(&self, order: &mut Order) {
        for event in order.take_events() {
            tracing::info!(event = ?event, "domain event");
        }
    }
}
