//! HTTP tests for the storefront cart, checkout and search endpoints.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`ww-cli migrate`)
//! - A seeded catalog containing product `1` (`ww-cli seed catalog --file ...`)
//! - The storefront running (`cargo run -p wendy-woo-storefront`)
//!
//! Run with: `cargo test -p wendy-woo-integration-tests -- --ignored`

use reqwest::{Client, StatusCode, redirect::Policy};
use serde_json::{Value, json};

/// Base URL for the storefront (configurable via environment).
fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Product known to exist in the seeded catalog.
fn seeded_product_id() -> String {
    std::env::var("SEEDED_PRODUCT_ID").unwrap_or_else(|_| "1".to_string())
}

/// A client with its own cookie jar, so each test gets a fresh session.
fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

async fn json_body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("Failed to parse JSON response")
}

// ============================================================================
// Cart API
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront with a seeded catalog"]
async fn test_cart_api_add_update_remove() {
    let client = session_client();
    let base = base_url();
    let id = seeded_product_id();

    let resp = client
        .post(format!("{base}/api/cart/add/{id}"))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let added = json_body(resp).await;
    assert_eq!(added["success"], json!(true));
    assert_eq!(added["total_items"], json!(1));
    let unit_price = added["total_price"].as_i64().expect("total_price is a number");

    let resp = client
        .post(format!("{base}/api/cart/update"))
        .json(&json!({ "item_id": id, "quantity": 3 }))
        .send()
        .await
        .expect("Failed to update cart");
    let updated = json_body(resp).await;
    assert_eq!(updated["total_items"], json!(3));
    assert_eq!(updated["total_price"], json!(unit_price * 3));

    let data = json_body(
        client
            .get(format!("{base}/api/cart/data"))
            .send()
            .await
            .expect("Failed to get cart data"),
    )
    .await;
    let items = data["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], json!(3));

    let resp = client
        .post(format!("{base}/api/cart/remove"))
        .json(&json!({ "item_id": id }))
        .send()
        .await
        .expect("Failed to remove from cart");
    let removed = json_body(resp).await;
    assert_eq!(removed["total_items"], json!(0));
    assert_eq!(removed["total_price"], json!(0));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_cart_api_rejects_bad_input() {
    let client = session_client();
    let base = base_url();

    let resp = client
        .post(format!("{base}/api/cart/add/999999"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Product not found"));

    let resp = client
        .post(format!("{base}/api/cart/update"))
        .json(&json!({ "item_id": "abc", "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{base}/api/cart/update"))
        .body("not json")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Pages and Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront with a seeded catalog"]
async fn test_add_to_cart_form_redirects_to_shop() {
    let client = session_client();
    let base = base_url();
    let id = seeded_product_id();

    let resp = client
        .post(format!("{base}/add-to-cart/{id}"))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()["location"].to_str().unwrap_or_default();
    assert!(location.starts_with("/shopnow?success="));

    let page = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .expect("Failed to get cart page")
        .text()
        .await
        .expect("Failed to read cart page");
    assert!(page.contains("id=\"cartTable\""));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_checkout_requires_login() {
    let client = session_client();

    let resp = client
        .get(format!("{}/checkout", base_url()))
        .send()
        .await
        .expect("Failed to get checkout");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()["location"].to_str().unwrap_or_default(),
        "/login?next=%2Fcheckout"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_check_auth_reports_anonymous_visitor() {
    let body = json_body(
        session_client()
            .get(format!("{}/api/check-auth", base_url()))
            .send()
            .await
            .expect("Failed to check auth"),
    )
    .await;

    assert_eq!(body["authenticated"], json!(false));
    assert_eq!(body["username"], Value::Null);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_search_suggestions_empty_query() {
    let body = json_body(
        session_client()
            .get(format!("{}/api/search?q=", base_url()))
            .send()
            .await
            .expect("Failed to search"),
    )
    .await;

    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_health() {
    let resp = session_client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to get health");

    assert_eq!(resp.status(), StatusCode::OK);
}
