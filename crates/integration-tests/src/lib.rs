//! Integration tests for Wendy Woo.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p wendy-woo-integration-tests
//!
//! # HTTP tests against a running storefront with a seeded catalog
//! STOREFRONT_BASE_URL=http://localhost:3000 \
//!     cargo test -p wendy-woo-integration-tests -- --ignored
//! ```
//!
//! # Test Files
//!
//! - `cart_session` - cart engine over a real `tower_sessions::Session`
//! - `storefront_http` - cart, checkout and search endpoints over HTTP
