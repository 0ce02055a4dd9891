//! Medicart - Self-hosted Pharmacy Storefront

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medicart::catalog::{InMemoryCatalog, CATEGORIES};
use medicart::domain::aggregates::{CartError, Order, OrderStatus, Product};
use medicart::domain::checkout::{CheckoutError, PaymentMethod, ShippingForm};
use medicart::service::{CartView, CheckoutView, Storefront};
use medicart::store::{InMemoryStore, OrderStats};
use medicart::Error;

type ApiResult<T> = std::result::Result<T, (StatusCode, String)>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let storefront = Arc::new(Storefront::new(
        Arc::new(InMemoryCatalog::pharmacy()),
        Arc::new(InMemoryStore::new()),
    ));

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "medicart"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/categories", get(|| async { Json(CATEGORIES) }))
        .route("/api/v1/cart/:user", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:user/items", post(add_to_cart))
        .route("/api/v1/cart/:user/items/:product_id", put(update_cart_item).delete(remove_cart_item))
        .route("/api/v1/wishlist/:user", get(get_wishlist))
        .route("/api/v1/wishlist/:user/toggle", post(toggle_wishlist))
        .route("/api/v1/checkout/:user", post(begin_checkout).get(get_checkout).delete(cancel_checkout))
        .route("/api/v1/checkout/:user/shipping", post(submit_shipping))
        .route("/api/v1/checkout/:user/payment", post(submit_payment))
        .route("/api/v1/checkout/:user/back", post(checkout_back))
        .route("/api/v1/checkout/:user/confirm", post(confirm_checkout))
        .route("/api/v1/orders/:user", get(list_orders))
        .route("/api/v1/orders/:user/:id", get(get_order))
        .route("/api/v1/orders/:user/:id/cancel", post(cancel_order))
        .route("/api/v1/orders/:user/:id/reorder", post(reorder))
        .route("/api/v1/admin/orders", get(admin_list_orders))
        .route("/api/v1/admin/orders/:id/status", put(admin_set_status))
        .route("/api/v1/admin/stats", get(admin_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(storefront);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    tracing::info!("🚀 Medicart listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

fn reject(err: Error) -> (StatusCode, String) {
    let status = match &err {
        Error::ProductNotFound(_) | Error::OrderNotFound(_) | Error::NoCheckoutSession => StatusCode::NOT_FOUND,
        Error::OutOfStock(_) | Error::Cart(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Checkout(CheckoutError::Validation { .. }) | Error::Checkout(CheckoutError::EmptyCart) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Checkout(CheckoutError::InvalidTransition { .. }) | Error::Order(_) => StatusCode::CONFLICT,
        Error::Store(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

#[derive(Debug, Deserialize)]
struct ListParams { search: Option<String>, category: Option<String> }

async fn list_products(State(s): State<Arc<Storefront>>, Query(p): Query<ListParams>) -> Json<Vec<Product>> {
    Json(s.products(p.search.as_deref(), p.category.as_deref()))
}

async fn get_product(State(s): State<Arc<Storefront>>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    s.product(&id).map(Json).map_err(reject)
}

#[derive(Debug, Deserialize)]
struct CartQuery { promo: Option<String> }

async fn get_cart(State(s): State<Arc<Storefront>>, Path(user): Path<String>, Query(q): Query<CartQuery>) -> ApiResult<Json<CartView>> {
    s.cart(&user, q.promo.as_deref()).map(Json).map_err(reject)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartRequest {
    product_id: String,
    #[serde(default = "one")]
    quantity: i64,
}

fn one() -> i64 { 1 }

async fn add_to_cart(State(s): State<Arc<Storefront>>, Path(user): Path<String>, Json(r): Json<AddToCartRequest>) -> ApiResult<(StatusCode, Json<CartView>)> {
    let qty = positive_quantity(r.quantity)?;
    let view = s.add_to_cart(&user, &r.product_id, qty).map_err(reject)?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Debug, Deserialize)]
struct UpdateQuantityRequest { quantity: i64 }

async fn update_cart_item(State(s): State<Arc<Storefront>>, Path((user, product_id)): Path<(String, String)>, Json(r): Json<UpdateQuantityRequest>) -> ApiResult<Json<CartView>> {
    let qty = non_negative_quantity(r.quantity)?;
    s.update_quantity(&user, &product_id, qty).map(Json).map_err(reject)
}

async fn remove_cart_item(State(s): State<Arc<Storefront>>, Path((user, product_id)): Path<(String, String)>) -> ApiResult<Json<CartView>> {
    s.remove_from_cart(&user, &product_id).map(Json).map_err(reject)
}

async fn clear_cart(State(s): State<Arc<Storefront>>, Path(user): Path<String>) -> ApiResult<Json<CartView>> {
    s.clear_cart(&user).map(Json).map_err(reject)
}

async fn get_wishlist(State(s): State<Arc<Storefront>>, Path(user): Path<String>) -> ApiResult<Json<Vec<Product>>> {
    s.wishlist(&user).map(Json).map_err(reject)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleWishlistRequest { product_id: String }

async fn toggle_wishlist(State(s): State<Arc<Storefront>>, Path(user): Path<String>, Json(r): Json<ToggleWishlistRequest>) -> ApiResult<Json<serde_json::Value>> {
    let in_wishlist = s.toggle_wishlist(&user, &r.product_id).map_err(reject)?;
    Ok(Json(serde_json::json!({"inWishlist": in_wishlist})))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BeginCheckoutRequest { promo_code: Option<String> }

async fn begin_checkout(State(s): State<Arc<Storefront>>, Path(user): Path<String>, body: Option<Json<BeginCheckoutRequest>>) -> ApiResult<(StatusCode, Json<CheckoutView>)> {
    let r = body.map(|Json(r)| r).unwrap_or_default();
    let view = s.begin_checkout(&user, r.promo_code.as_deref()).map_err(reject)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_checkout(State(s): State<Arc<Storefront>>, Path(user): Path<String>) -> ApiResult<Json<CheckoutView>> {
    s.checkout(&user).map(Json).map_err(reject)
}

async fn submit_shipping(State(s): State<Arc<Storefront>>, Path(user): Path<String>, Json(form): Json<ShippingForm>) -> ApiResult<Json<CheckoutView>> {
    s.submit_shipping(&user, form).map(Json).map_err(reject)
}

async fn submit_payment(State(s): State<Arc<Storefront>>, Path(user): Path<String>, Json(method): Json<PaymentMethod>) -> ApiResult<Json<CheckoutView>> {
    s.submit_payment(&user, method).map(Json).map_err(reject)
}

async fn checkout_back(State(s): State<Arc<Storefront>>, Path(user): Path<String>) -> ApiResult<Json<CheckoutView>> {
    s.checkout_back(&user).map(Json).map_err(reject)
}

async fn cancel_checkout(State(s): State<Arc<Storefront>>, Path(user): Path<String>) -> ApiResult<StatusCode> {
    s.cancel_checkout(&user).map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn confirm_checkout(State(s): State<Arc<Storefront>>, Path(user): Path<String>) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = s.confirm_checkout(&user).map_err(reject)?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(State(s): State<Arc<Storefront>>, Path(user): Path<String>) -> ApiResult<Json<Vec<Order>>> {
    s.orders_for(&user).map(Json).map_err(reject)
}

async fn get_order(State(s): State<Arc<Storefront>>, Path((user, id)): Path<(String, String)>) -> ApiResult<Json<Order>> {
    s.order_for(&user, &id).map(Json).map_err(reject)
}

async fn cancel_order(State(s): State<Arc<Storefront>>, Path((user, id)): Path<(String, String)>) -> ApiResult<Json<Order>> {
    s.cancel_order(&user, &id).map(Json).map_err(reject)
}

async fn reorder(State(s): State<Arc<Storefront>>, Path((user, id)): Path<(String, String)>) -> ApiResult<Json<CartView>> {
    s.reorder(&user, &id).map(Json).map_err(reject)
}

async fn admin_list_orders(State(s): State<Arc<Storefront>>) -> ApiResult<Json<Vec<Order>>> {
    s.all_orders().map(Json).map_err(reject)
}

#[derive(Debug, Deserialize)]
struct SetStatusRequest { status: OrderStatus }

async fn admin_set_status(State(s): State<Arc<Storefront>>, Path(id): Path<String>, Json(r): Json<SetStatusRequest>) -> ApiResult<Json<Order>> {
    s.set_order_status(&id, r.status).map(Json).map_err(reject)
}

async fn admin_stats(State(s): State<Arc<Storefront>>) -> ApiResult<Json<OrderStats>> {
    s.order_stats().map(Json).map_err(reject)
}

fn positive_quantity(qty: i64) -> std::result::Result<u32, (StatusCode, String)> {
    match u32::try_from(qty) {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(reject(Error::Cart(CartError::InvalidQuantity))),
    }
}

fn non_negative_quantity(qty: i64) -> std::result::Result<u32, (StatusCode, String)> {
    u32::try_from(qty).map_err(|_| reject(Error::Cart(CartError::InvalidQuantity)))
}
