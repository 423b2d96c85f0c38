//! Storefront HTTP API with in-memory sessions and backends.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tower_sessions::MemoryStore;

use audie_boutique_core::{Money, Product, User, UserId, UserRole};
use audie_boutique_integration_tests::{
    MemoryBackend, TestResponse, address, eur, product, request, send, storefront_state, user,
};
use audie_boutique_storefront::middleware::create_session_layer;

const CLIENT: (&str, &str) = ("authorization", "Bearer client-token");

struct Fixture {
    backend: Arc<MemoryBackend>,
    app: Router,
    customer: User,
    dress: Product,
    coat: Product,
}

async fn fixture() -> Fixture {
    let backend = MemoryBackend::new();
    let customer = user(UserRole::Client, "Claire Martin", "claire@example.com");
    backend.add_user(customer.clone(), "client-token").await;
    backend
        .add_user(user(UserRole::Agent, "Marc", "marc@audieboutique.com"), "agent-token")
        .await;

    let dress = product("Robe Léa", "89.99");
    let coat = product("Manteau Inès", "125.00");
    backend.add_product(dress.clone()).await;
    backend.add_product(coat.clone()).await;

    let sessions = create_session_layer(MemoryStore::default(), false);
    let app = audie_boutique_storefront::app(storefront_state(&backend), sessions);
    Fixture {
        backend,
        app,
        customer,
        dress,
        coat,
    }
}

fn money(value: &Value) -> Money {
    value.as_str().unwrap().parse().unwrap()
}

async fn add(f: &Fixture, cookie: Option<&str>, body: Value) -> TestResponse {
    let headers: Vec<(&str, &str)> = cookie.map(|c| ("cookie", c)).into_iter().collect();
    send(&f.app, request("POST", "/api/cart/items", &headers, Some(body))).await
}

/// Fill a fresh cart with the dress and two coats, returning the session cookie.
async fn filled_cart(f: &Fixture) -> String {
    let first = add(f, None, json!({ "product_id": f.dress.id })).await;
    assert_eq!(first.status, StatusCode::OK);
    let cookie = first.cookie().unwrap();
    let second = add(
        f,
        Some(&cookie),
        json!({ "product_id": f.coat.id, "quantity": 2, "size": "M" }),
    )
    .await;
    assert_eq!(second.status, StatusCode::OK);
    cookie
}

#[tokio::test]
async fn test_cart_lives_in_session() {
    let f = fixture().await;
    let cookie = filled_cart(&f).await;

    let response = send(
        &f.app,
        request("GET", "/api/cart", &[("cookie", cookie.as_str())], None),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let items = response.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["index"], 1);
    assert_eq!(items[1]["selected_size"], "M");
    assert_eq!(money(&items[1]["line_total"]), eur("250.00"));
    assert_eq!(response.body["quote"]["item_count"], 3);
    assert_eq!(money(&response.body["quote"]["subtotal"]), eur("339.99"));
}

#[tokio::test]
async fn test_new_session_has_empty_cart() {
    let f = fixture().await;
    let response = send(&f.app, request("GET", "/api/cart", &[], None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["items"].as_array().unwrap().is_empty());
    assert_eq!(money(&response.body["quote"]["total"]), Money::ZERO);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let f = fixture().await;
    let response = add(&f, None, json!({ "product_id": UserId::random().to_string() })).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inactive_product_is_rejected() {
    let f = fixture().await;
    let mut retired = product("Jupe Zoé", "40");
    retired.is_active = false;
    f.backend.add_product(retired.clone()).await;

    let response = add(&f, None, json!({ "product_id": retired.id })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_remove_lines() {
    let f = fixture().await;
    let cookie = filled_cart(&f).await;

    let response = send(
        &f.app,
        request(
            "PATCH",
            "/api/cart/items/1",
            &[("cookie", cookie.as_str())],
            Some(json!({ "quantity": 1 })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(money(&response.body["quote"]["subtotal"]), eur("214.99"));

    let response = send(
        &f.app,
        request("DELETE", "/api/cart/items/0", &[("cookie", cookie.as_str())], None),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["items"].as_array().unwrap().len(), 1);

    let response = send(
        &f.app,
        request("DELETE", "/api/cart/items/5", &[("cookie", cookie.as_str())], None),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_with_promo_code() {
    let f = fixture().await;
    let cookie = filled_cart(&f).await;

    let response = send(
        &f.app,
        request(
            "GET",
            "/api/cart/quote?mode=pickup&promo=bienvenue",
            &[("cookie", cookie.as_str())],
            None,
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["mode"], "pickup");
    assert_eq!(money(&response.body["discount"]), eur("34.00"));
    assert_eq!(money(&response.body["total"]), eur("305.99"));

    let response = send(
        &f.app,
        request(
            "GET",
            "/api/cart/quote?promo=NOPE",
            &[("cookie", cookie.as_str())],
            None,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let f = fixture().await;
    let cookie = filled_cart(&f).await;

    let response = send(
        &f.app,
        request(
            "POST",
            "/api/checkout",
            &[("cookie", cookie.as_str())],
            Some(json!({ "mode": "pickup" })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_cannot_place_orders() {
    let f = fixture().await;
    let cookie = filled_cart(&f).await;

    let response = send(
        &f.app,
        request(
            "POST",
            "/api/checkout",
            &[("cookie", cookie.as_str()), ("authorization", "Bearer agent-token")],
            Some(json!({ "mode": "pickup" })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let f = fixture().await;
    let home = address(f.customer.id);
    f.backend.add_address(home.clone()).await;
    let cookie = filled_cart(&f).await;

    let response = send(
        &f.app,
        request(
            "POST",
            "/api/checkout",
            &[("cookie", cookie.as_str()), CLIENT],
            Some(json!({ "mode": "delivery", "address_id": home.id })),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["status"], "pending");
    assert_eq!(response.body["is_shipping"], true);
    assert_eq!(money(&response.body["shipping"]), Money::ZERO);
    assert_eq!(money(&response.body["total"]), eur("339.99"));
    assert_eq!(f.backend.stored_orders().await.len(), 1);

    let cart = send(
        &f.app,
        request("GET", "/api/cart", &[("cookie", cookie.as_str())], None),
    )
    .await;
    assert!(cart.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let f = fixture().await;
    let cookie = filled_cart(&f).await;

    let response = send(
        &f.app,
        request(
            "POST",
            "/api/checkout",
            &[("cookie", cookie.as_str()), CLIENT],
            Some(json!({ "mode": "delivery" })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let cart = send(
        &f.app,
        request("GET", "/api/cart", &[("cookie", cookie.as_str())], None),
    )
    .await;
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_address_book() {
    let f = fixture().await;

    let created = send(
        &f.app,
        request(
            "POST",
            "/api/addresses",
            &[CLIENT],
            Some(json!({
                "full_name": "Claire Martin",
                "street": "3 quai Voltaire",
                "postal_code": "69002",
                "city": "Lyon",
                "country": "France",
            })),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["id"].as_str().unwrap().to_owned();

    let listed = send(&f.app, request("GET", "/api/addresses", &[CLIENT], None)).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let removed = send(
        &f.app,
        request("DELETE", &format!("/api/addresses/{id}"), &[CLIENT], None),
    )
    .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let listed = send(&f.app, request("GET", "/api/addresses", &[CLIENT], None)).await;
    assert!(listed.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_incomplete_address_is_rejected() {
    let f = fixture().await;
    let response = send(
        &f.app,
        request(
            "POST",
            "/api/addresses",
            &[CLIENT],
            Some(json!({
                "full_name": "Claire Martin",
                "street": " ",
                "postal_code": "69002",
                "city": "Lyon",
                "country": "France",
            })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_someone_elses_address_is_not_found() {
    let f = fixture().await;
    let theirs = address(UserId::random());
    f.backend.add_address(theirs.clone()).await;

    let response = send(
        &f.app,
        request(
            "DELETE",
            &format!("/api/addresses/{}", theirs.id),
            &[CLIENT],
            None,
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(f.backend.stored_address(theirs.id).await.unwrap().is_active);
}
