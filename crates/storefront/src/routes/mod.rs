//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /menu                      - Menu page
//! GET  /location                  - Shop location
//!
//! # Catalog
//! GET  /shopnow                   - Categories with their products
//! GET  /product/{id}              - Product detail with reviews
//! POST /product/{id}/add-review   - Add a review (login, multipart)
//! GET  /search?q=                 - Search results page
//!
//! # Cart
//! GET  /cart                      - Cart page
//! POST /add-to-cart/{product_id}  - Add one, redirect to /shopnow
//! GET  /checkout                  - Login / empty cart gate
//! GET  /checkout/payment          - Payment confirmation (login)
//!
//! # Accounts
//! GET|POST /signup                - Sign up
//! GET  /verify-email/{token}      - Activate account from emailed link
//! GET|POST /login                 - Login (optional ?next=)
//! POST /logout                    - Logout
//! GET|POST /forgot-password       - Request a reset link
//! GET|POST /reset/{token}         - Set a new password
//! GET  /password-reset-complete   - Reset done
//! GET  /profile                   - Profile (login)
//!
//! # Enquiries
//! GET|POST /enquiries             - Contact form (multipart)
//! GET  /enquiry-success           - Enquiry sent
//!
//! # JSON API
//! POST /api/cart/add/{product_id} - Add one
//! POST /api/cart/update           - Set quantity, `{item_id, quantity}`
//! POST /api/cart/remove           - Remove, `{item_id}`
//! GET  /api/cart/data             - Lines and totals
//! GET  /api/check-auth            - Login state
//! GET  /api/search?q=             - Search suggestions
//! GET  /debug/cart                - Raw cart dump (debug builds of config only)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod enquiries;
pub mod form;
pub mod home;
pub mod reviews;
pub mod search;
pub mod shop;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Static pages and catalog browsing.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/menu", get(home::menu))
        .route("/location", get(home::location))
        .route("/shopnow", get(shop::index))
        .route("/product/{id}", get(shop::product))
        .route("/search", get(search::page))
        .route("/profile", get(account::profile))
}

/// Cart pages and the checkout stub.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/add-to-cart/{product_id}", post(cart::add_to_cart))
        .route("/checkout", get(checkout::checkout))
        .route("/checkout/payment", get(checkout::payment))
}

/// Account pages. Form posts share one rate limit.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset/{token}", post(auth::reset))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/signup", get(auth::signup_page))
        .route("/verify-email/{token}", get(auth::verify_email))
        .route("/login", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", get(auth::forgot_password_page))
        .route("/reset/{token}", get(auth::reset_page))
        .route("/password-reset-complete", get(auth::reset_complete))
        .merge(limited)
}

/// Multipart forms carrying an optional photo.
pub fn upload_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/enquiries", post(enquiries::submit))
        .route("/product/{id}/add-review", post(reviews::add_review))
        .route_layer(form_rate_limiter())
        .layer(DefaultBodyLimit::max(form::UPLOAD_BODY_LIMIT));

    Router::new()
        .route("/enquiries", get(enquiries::page))
        .route("/enquiry-success", get(enquiries::success))
        .merge(limited)
}

/// JSON endpoints used by the cart and search scripts.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/add/{product_id}", post(cart::api_add))
        .route("/cart/update", post(cart::api_update))
        .route("/cart/remove", post(cart::api_remove))
        .route("/cart/data", get(cart::api_data))
        .route("/check-auth", get(cart::check_auth))
        .route("/search", get(search::suggest))
        .route_layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(page_routes())
        .merge(cart_routes())
        .merge(auth_routes())
        .merge(upload_routes())
        .nest("/api", api_routes())
        .route("/debug/cart", get(cart::debug))
}
