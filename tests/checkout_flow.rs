//! End-to-end walk of the storefront: browse, fill a cart, apply a promo,
//! check out, and manage the resulting order.

use std::sync::Arc;

use rust_decimal::Decimal;

use medicart::catalog::InMemoryCatalog;
use medicart::domain::aggregates::OrderStatus;
use medicart::domain::checkout::{CheckoutError, CheckoutStep, PaymentMethod, ShippingForm};
use medicart::service::PromoOutcome;
use medicart::store::InMemoryStore;
use medicart::{Error, Storefront};

fn storefront() -> Storefront {
    Storefront::new(Arc::new(InMemoryCatalog::pharmacy()), Arc::new(InMemoryStore::new()))
}

fn shipping_form() -> ShippingForm {
    ShippingForm {
        first_name: "Sneha".to_string(),
        last_name: "Patel".to_string(),
        email: "sneha.patel@example.com".to_string(),
        phone: "+91 91234 56789".to_string(),
        address: "221 Linking Road".to_string(),
        city: "Mumbai".to_string(),
        state: "MH".to_string(),
        zip_code: "400050".to_string(),
        country: "India".to_string(),
    }
}

fn card() -> PaymentMethod {
    PaymentMethod::Card {
        card_number: "4111 1111 1111 1111".to_string(),
        expiry_date: "09/27".to_string(),
        cvv: "321".to_string(),
        name_on_card: "Sneha Patel".to_string(),
    }
}

#[test]
fn full_checkout_flow_places_an_order() {
    let shop = storefront();
    let user = "sneha";

    // Two Paracetamol, one Ibuprofen.
    shop.add_to_cart(user, "MED-001", 2).unwrap();
    shop.add_to_cart(user, "MED-002", 1).unwrap();

    let cart = shop.cart(user, Some("save10")).unwrap();
    assert_eq!(cart.promo, PromoOutcome::Applied);
    assert_eq!(cart.breakdown.subtotal.amount(), Decimal::new(1947, 2));
    assert_eq!(cart.breakdown.discount_amount.amount(), Decimal::new(1947, 3));
    assert_eq!(cart.breakdown.tax.amount(), Decimal::new(140184, 5));
    assert_eq!(cart.breakdown.shipping_fee.amount(), Decimal::new(999, 2));
    assert_eq!(cart.breakdown.total.amount(), Decimal::new(2891484, 5));

    let view = shop.begin_checkout(user, Some("save10")).unwrap();
    assert_eq!(view.step, CheckoutStep::Shipping);
    assert_eq!(view.discount_percent, Decimal::new(10, 0));

    // A malformed email keeps the session on Shipping.
    let mut bad_form = shipping_form();
    bad_form.email = "not-an-email".to_string();
    match shop.submit_shipping(user, bad_form) {
        Err(Error::Checkout(CheckoutError::Validation { fields })) => assert_eq!(fields, vec!["email"]),
        other => panic!("expected a validation failure, got {:?}", other.map(|v| v.step)),
    }
    assert_eq!(shop.checkout(user).unwrap().step, CheckoutStep::Shipping);

    let view = shop.submit_shipping(user, shipping_form()).unwrap();
    assert_eq!(view.step, CheckoutStep::Payment);

    // Card payments need every card field.
    let incomplete = PaymentMethod::Card {
        card_number: "4111 1111 1111 1111".to_string(),
        expiry_date: "09/27".to_string(),
        cvv: String::new(),
        name_on_card: "Sneha Patel".to_string(),
    };
    assert!(shop.submit_payment(user, incomplete).is_err());

    let view = shop.submit_payment(user, card()).unwrap();
    assert_eq!(view.step, CheckoutStep::Review);

    let order = shop.confirm_checkout(user).unwrap();
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.lines().len(), 2);
    assert_eq!(order.breakdown().total.amount(), Decimal::new(2891484, 5));
    assert_eq!(order.payment().to_string(), "**** **** **** 1111");

    // The cart emptied as part of confirmation.
    assert!(shop.cart(user, None).unwrap().lines.is_empty());

    // Confirming again has no session to act on.
    assert!(matches!(shop.confirm_checkout(user), Err(Error::NoCheckoutSession)));
}

#[test]
fn confirm_fails_once_the_cart_is_emptied_mid_checkout() {
    let shop = storefront();
    let user = "sneha";
    shop.add_to_cart(user, "MED-003", 1).unwrap();
    shop.begin_checkout(user, None).unwrap();
    shop.submit_shipping(user, shipping_form()).unwrap();
    shop.submit_payment(user, PaymentMethod::Cod).unwrap();

    // Cart mutations stay available during checkout; drain it.
    shop.clear_cart(user).unwrap();

    assert!(matches!(
        shop.confirm_checkout(user),
        Err(Error::Checkout(CheckoutError::EmptyCart))
    ));
    assert_eq!(shop.checkout(user).unwrap().step, CheckoutStep::Review);
    assert!(shop.orders_for(user).unwrap().is_empty());
}

#[test]
fn customer_cancellation_respects_the_lifecycle() {
    let shop = storefront();
    let user = "arjun";
    shop.add_to_cart(user, "MED-004", 1).unwrap();
    shop.begin_checkout(user, None).unwrap();
    shop.submit_shipping(user, shipping_form()).unwrap();
    shop.submit_payment(user, PaymentMethod::Paypal).unwrap();
    let order = shop.confirm_checkout(user).unwrap();

    // In transit is still cancellable under the storefront's policy.
    shop.set_order_status(order.id(), OrderStatus::Shipped).unwrap();
    let cancelled = shop.cancel_order(user, order.id()).unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);

    // Terminal means terminal, for customers and admins alike.
    assert!(shop.cancel_order(user, order.id()).is_err());
    assert!(shop.set_order_status(order.id(), OrderStatus::Processing).is_err());

    let stats = shop.order_stats().unwrap();
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.revenue, Decimal::ZERO);
}

#[test]
fn prescription_items_flag_the_cart_and_order() {
    let shop = storefront();
    let user = "priya";
    shop.add_to_cart(user, "MED-006", 1).unwrap();

    assert!(shop.cart(user, None).unwrap().requires_prescription);

    shop.begin_checkout(user, None).unwrap();
    shop.submit_shipping(user, shipping_form()).unwrap();
    shop.submit_payment(user, PaymentMethod::Cod).unwrap();
    let order = shop.confirm_checkout(user).unwrap();
    assert!(order.requires_prescription());
}
