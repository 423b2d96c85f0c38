//! Checkout against in-memory backends.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use audie_boutique_core::ports::StoreError;
use audie_boutique_core::{
    Cart, LineItem, Money, OrderStatus, PricingError, ProductId, ShippingMode, UserId, UserRole,
    ValidationError,
};
use audie_boutique_integration_tests::{
    MemoryBackend, Operation, address, eur, storefront_state, user,
};
use audie_boutique_storefront::services::{CheckoutError, CheckoutRequest};
use audie_boutique_storefront::state::AppState;

fn line(name: &str, price: &str, quantity: u32) -> LineItem {
    LineItem::new(ProductId::random(), name, eur(price), quantity).unwrap()
}

fn three_line_cart() -> Cart {
    let mut cart = Cart::new();
    cart.add(line("Robe Léa", "89.99", 1)).unwrap();
    cart.add(line("Manteau Inès", "125.00", 2)).unwrap();
    cart.add(line("Sac Nina", "75.00", 1)).unwrap();
    cart
}

async fn setup() -> (Arc<MemoryBackend>, AppState, UserId) {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    let id = customer.id;
    backend.add_customer(customer).await;
    let state = storefront_state(&backend);
    (backend, state, id)
}

fn delivery_to(address_id: audie_boutique_core::AddressId) -> CheckoutRequest {
    CheckoutRequest {
        mode: ShippingMode::Delivery,
        address_id: Some(address_id),
        promo: None,
    }
}

#[tokio::test]
async fn test_delivery_over_threshold_ships_free() {
    let (backend, state, customer) = setup().await;
    let home = address(customer);
    backend.add_address(home.clone()).await;
    let mut cart = three_line_cart();

    let order = state
        .checkout()
        .place_order(customer, &mut cart, &delivery_to(home.id))
        .await
        .unwrap();

    assert_eq!(order.totals.subtotal(), eur("414.99"));
    assert_eq!(order.totals.shipping(), Money::ZERO);
    assert_eq!(order.totals.total(), eur("414.99"));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.is_shipping);
    assert_eq!(order.address_id, Some(home.id));
    assert_eq!(order.items.len(), 3);
    assert!(cart.is_empty());
    assert_eq!(backend.stored_orders().await.len(), 1);
}

#[tokio::test]
async fn test_delivery_under_threshold_pays_shipping() {
    let (backend, state, customer) = setup().await;
    let home = address(customer);
    backend.add_address(home.clone()).await;
    let mut cart = Cart::new();
    cart.add(line("Foulard", "30", 1)).unwrap();

    let order = state
        .checkout()
        .place_order(customer, &mut cart, &delivery_to(home.id))
        .await
        .unwrap();

    assert_eq!(order.totals.shipping(), eur("5.90"));
    assert_eq!(order.totals.total(), eur("35.90"));
}

#[tokio::test]
async fn test_pickup_needs_no_address() {
    let (_backend, state, customer) = setup().await;
    let mut cart = Cart::new();
    cart.add(line("Foulard", "30", 1)).unwrap();
    let request = CheckoutRequest {
        mode: ShippingMode::Pickup,
        address_id: None,
        promo: Some("BIENVENUE".into()),
    };

    let order = state
        .checkout()
        .place_order(customer, &mut cart, &request)
        .await
        .unwrap();

    assert!(!order.is_shipping);
    assert_eq!(order.address_id, None);
    assert_eq!(order.totals.shipping(), Money::ZERO);
    assert_eq!(order.totals.discount(), eur("3"));
    assert_eq!(order.totals.total(), eur("27"));
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let (backend, state, customer) = setup().await;
    let mut cart = Cart::new();
    let request = CheckoutRequest {
        mode: ShippingMode::Pickup,
        ..CheckoutRequest::default()
    };

    let err = state
        .checkout()
        .place_order(customer, &mut cart, &request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::EmptyCart)
    ));
    assert!(backend.stored_orders().await.is_empty());
}

#[tokio::test]
async fn test_delivery_requires_address() {
    let (_backend, state, customer) = setup().await;
    let mut cart = three_line_cart();

    let err = state
        .checkout()
        .place_order(customer, &mut cart, &CheckoutRequest::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::AddressRequired)
    ));
    assert_eq!(cart.items().len(), 3);
}

#[tokio::test]
async fn test_someone_elses_address_is_unavailable() {
    let (backend, state, customer) = setup().await;
    let other = address(UserId::random());
    backend.add_address(other.clone()).await;
    let mut cart = three_line_cart();

    let err = state
        .checkout()
        .place_order(customer, &mut cart, &delivery_to(other.id))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::AddressUnavailable(id) if id == other.id));
}

#[tokio::test]
async fn test_deleted_address_is_unavailable() {
    let (backend, state, customer) = setup().await;
    let mut old = address(customer);
    old.is_active = false;
    backend.add_address(old.clone()).await;
    let mut cart = three_line_cart();

    let err = state
        .checkout()
        .place_order(customer, &mut cart, &delivery_to(old.id))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::AddressUnavailable(_)));
}

#[tokio::test]
async fn test_oversized_discount_is_rejected() {
    let (_backend, state, customer) = setup().await;
    let mut cart = Cart::new();
    cart.add(line("Foulard", "30", 1)).unwrap();
    let request = CheckoutRequest {
        mode: ShippingMode::Pickup,
        address_id: None,
        promo: Some("CADEAU500".into()),
    };

    let err = state
        .checkout()
        .place_order(customer, &mut cart, &request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Pricing(PricingError::DiscountExceedsTotal { .. })
    ));
    assert!(!cart.is_empty());
}

#[tokio::test]
async fn test_unknown_promo_is_rejected() {
    let (_backend, state, customer) = setup().await;
    let mut cart = three_line_cart();
    let request = CheckoutRequest {
        mode: ShippingMode::Pickup,
        address_id: None,
        promo: Some("NOPE".into()),
    };

    let err = state
        .checkout()
        .place_order(customer, &mut cart, &request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::UnknownPromoCode(code)) if code == "NOPE"
    ));
}

#[tokio::test]
async fn test_store_failure_keeps_cart() {
    let (backend, state, customer) = setup().await;
    backend.fail(Operation::InsertOrder, StoreError::Timeout).await;
    let mut cart = three_line_cart();
    let request = CheckoutRequest {
        mode: ShippingMode::Pickup,
        ..CheckoutRequest::default()
    };

    let err = state
        .checkout()
        .place_order(customer, &mut cart, &request)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Store(StoreError::Timeout)));
    assert_eq!(cart.items().len(), 3);
}

#[test]
fn test_quote_shows_remaining_for_free_shipping() {
    let backend = MemoryBackend::new();
    let state = storefront_state(&backend);
    let mut cart = Cart::new();
    cart.add(line("Foulard", "30", 2)).unwrap();

    let quote = state
        .checkout()
        .quote(&cart, ShippingMode::Delivery, None)
        .unwrap();

    assert_eq!(quote.item_count, 2);
    assert_eq!(quote.totals.shipping(), eur("5.90"));
    assert_eq!(quote.remaining_for_free_shipping, eur("20"));
    assert_eq!(quote.totals.total(), eur("65.90"));
}
