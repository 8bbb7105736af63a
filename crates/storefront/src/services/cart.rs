//! Session cart engine.
//!
//! A [`CartEngine`] is built per request from the visitor's session and a
//! catalog handle. Every mutation loads the [`CartState`] from the session,
//! applies the change, reconciles the whole mapping against current catalog
//! prices and writes the mapping plus the recomputed totals back.
//!
//! Catalog misses are soft: an entry whose product no longer exists is left
//! in the mapping and simply excluded from totals and line listings. Only
//! operations naming a product directly (add, set quantity) report
//! [`CartError::NotFound`].
//!
//! There is no locking. Two concurrent requests from the same session both
//! read, mutate and write, and the later write wins.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::num::NonZeroU32;

use serde_json::Value;
use thiserror::Error;
use tower_sessions::Session;

use wendy_woo_core::cart::QuantityError;
use wendy_woo_core::{CartLine, CartState, CartSummary, Price, ProductId, QuantityUpdate, Reconciliation};

use crate::db::RepositoryError;
use crate::models::{Product, session_keys};
use crate::services::catalog::Catalog;

/// Storage for the three cart fields of a session.
pub trait CartSession: Send + Sync {
    /// Load the cart, defaulting to empty when the session has none.
    fn load_cart(&self) -> impl Future<Output = Result<CartState, CartError>> + Send;

    /// Write the mapping and both cached totals.
    fn store_cart(&self, cart: &CartState) -> impl Future<Output = Result<(), CartError>> + Send;

    /// Write only the cached totals, leaving the stored mapping untouched.
    fn store_summary(
        &self,
        summary: CartSummary,
    ) -> impl Future<Output = Result<(), CartError>> + Send;
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The named product does not exist.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// Malformed product identifier or quantity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The catalog could not be queried.
    #[error("catalog error: {0}")]
    Catalog(#[from] RepositoryError),

    /// The session could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl CartError {
    /// Message safe to show to the shopper.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Product not found".to_string(),
            Self::InvalidArgument(msg) => msg.clone(),
            Self::Catalog(_) | Self::Session(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Whether this is a server-side failure rather than bad input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::Session(_))
    }
}

impl From<QuantityError> for CartError {
    fn from(err: QuantityError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Result of adding one unit of a product.
#[derive(Debug, Clone)]
pub struct ItemAdded {
    /// The product that was added.
    pub product: Product,
    /// Quantity after the add.
    pub quantity: u32,
    /// Totals after the add.
    pub summary: CartSummary,
}

/// Resolved cart contents for display.
#[derive(Debug, Clone, Default)]
pub struct CartContents {
    /// One line per entry whose product still exists.
    pub lines: Vec<CartLine<Product>>,
    /// Totals over `lines`.
    pub summary: CartSummary,
}

/// Raw view of a cart for diagnostics.
#[derive(Debug, Clone)]
pub struct CartInspection {
    /// Stored mapping, including entries that no longer resolve.
    pub items: BTreeMap<ProductId, u32>,
    /// Totals as cached in the session.
    pub cached: CartSummary,
    /// Totals recomputed now.
    pub current: CartSummary,
    /// IDs whose product is gone.
    pub missing: Vec<ProductId>,
}

/// Cart operations bound to one session and one catalog.
pub struct CartEngine<'a, S, C> {
    session: &'a S,
    catalog: &'a C,
}

impl<'a, S, C> CartEngine<'a, S, C>
where
    S: CartSession,
    C: Catalog,
{
    /// Bind an engine to a session and catalog.
    #[must_use]
    pub const fn new(session: &'a S, catalog: &'a C) -> Self {
        Self { session, catalog }
    }

    /// Add one unit of `product_id`, creating the entry at quantity 1.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the product does not exist.
    pub async fn add_item(&self, product_id: ProductId) -> Result<ItemAdded, CartError> {
        let product = self
            .catalog
            .find_product(product_id)
            .await?
            .ok_or(CartError::NotFound(product_id))?;

        let mut cart = self.session.load_cart().await?;
        let quantity = cart.increment(product_id);
        let summary = self.commit(cart).await?;

        tracing::info!(%product_id, quantity, total_items = summary.total_item_count, "Added item to cart");
        Ok(ItemAdded {
            product,
            quantity,
            summary,
        })
    }

    /// Replace the quantity of `product_id`; `quantity <= 0` removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidArgument` if the quantity is out of range and
    /// `CartError::NotFound` if a positive quantity names a missing product.
    pub async fn set_item_quantity(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartSummary, CartError> {
        let update = QuantityUpdate::from_requested(quantity)?;

        if matches!(update, QuantityUpdate::Set(_))
            && self.catalog.find_product(product_id).await?.is_none()
        {
            return Err(CartError::NotFound(product_id));
        }

        let mut cart = self.session.load_cart().await?;
        cart.apply(product_id, update);
        let summary = self.commit(cart).await?;

        tracing::info!(%product_id, quantity, "Updated cart quantity");
        Ok(summary)
    }

    /// Remove `product_id`. Removing an absent product is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session or catalog fails.
    pub async fn remove_item(&self, product_id: ProductId) -> Result<CartSummary, CartError> {
        let mut cart = self.session.load_cart().await?;
        let removed = cart.remove(product_id);
        let summary = self.commit(cart).await?;

        tracing::info!(%product_id, removed, "Removed item from cart");
        Ok(summary)
    }

    /// Recompute the totals from the mapping and cache them in the session.
    ///
    /// The stored mapping is not rewritten, so entries the decoder skipped
    /// stay in the session exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session or catalog fails.
    pub async fn compute_summary(&self) -> Result<CartSummary, CartError> {
        let cart = self.session.load_cart().await?;
        let summary = self.reconcile(&cart).await?.summary;
        self.session.store_summary(summary).await?;
        Ok(summary)
    }

    /// Resolved lines and totals, without touching the session.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session or catalog fails.
    pub async fn list_cart_lines(&self) -> Result<CartContents, CartError> {
        let cart = self.session.load_cart().await?;
        let reconciliation = self.reconcile(&cart).await?;
        Ok(CartContents {
            lines: reconciliation.lines,
            summary: reconciliation.summary,
        })
    }

    /// Raw mapping, cached totals and unresolved IDs.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session or catalog fails.
    pub async fn inspect(&self) -> Result<CartInspection, CartError> {
        let cart = self.session.load_cart().await?;
        let reconciliation = self.reconcile(&cart).await?;
        Ok(CartInspection {
            items: cart.items().iter().map(|(id, q)| (*id, q.get())).collect(),
            cached: cart.cached_summary(),
            current: reconciliation.summary,
            missing: reconciliation.missing,
        })
    }

    /// Reconcile, cache the fresh totals and persist.
    async fn commit(&self, mut cart: CartState) -> Result<CartSummary, CartError> {
        let summary = self.reconcile(&cart).await?.summary;
        cart.apply_summary(summary);
        self.session.store_cart(&cart).await?;
        Ok(summary)
    }

    async fn reconcile(&self, cart: &CartState) -> Result<Reconciliation<Product>, CartError> {
        let mut found = HashMap::with_capacity(cart.items().len());
        for &product_id in cart.items().keys() {
            if let Some(product) = self.catalog.find_product(product_id).await? {
                found.insert(product_id, product);
            }
        }

        let reconciliation = cart.reconcile(|id| found.remove(&id));
        if !reconciliation.missing.is_empty() {
            tracing::debug!(missing = ?reconciliation.missing, "Cart references products that no longer exist");
        }
        Ok(reconciliation)
    }
}

// =============================================================================
// Client Input
// =============================================================================

/// Parse an item identifier sent as a JSON number or numeric string.
///
/// # Errors
///
/// Returns `CartError::InvalidArgument` for anything else.
pub fn parse_item_id(value: &Value) -> Result<ProductId, CartError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()).map(ProductId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CartError::InvalidArgument(format!("Invalid item id: {value}")))
}

/// Parse a quantity sent as a JSON integer or numeric string; absent means 1.
///
/// # Errors
///
/// Returns `CartError::InvalidArgument` for fractions, non-numeric strings
/// and other JSON types.
pub fn parse_quantity(value: Option<&Value>) -> Result<i64, CartError> {
    let parsed = match value {
        None | Some(Value::Null) => Some(1),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    parsed.ok_or_else(|| {
        CartError::InvalidArgument(format!(
            "Invalid quantity: {}",
            value.map_or_else(String::new, ToString::to_string)
        ))
    })
}

// =============================================================================
// Session Storage
// =============================================================================

/// Encode the mapping for the session: `{"3": 2, "7": 1}`.
#[must_use]
pub fn encode_items(cart: &CartState) -> BTreeMap<String, u32> {
    cart.items()
        .iter()
        .map(|(id, quantity)| (id.to_string(), quantity.get()))
        .collect()
}

/// Decode a stored mapping, skipping pairs that cannot be valid entries.
#[must_use]
pub fn decode_items(raw: BTreeMap<String, Value>) -> BTreeMap<ProductId, NonZeroU32> {
    raw.into_iter()
        .filter_map(|(key, value)| {
            let entry = key.parse::<ProductId>().ok().zip(
                value
                    .as_u64()
                    .and_then(|q| u32::try_from(q).ok())
                    .and_then(NonZeroU32::new),
            );
            if entry.is_none() {
                tracing::warn!(key = %key, value = %value, "Skipping malformed cart entry in session");
            }
            entry
        })
        .collect()
}

impl CartSession for Session {
    async fn load_cart(&self) -> Result<CartState, CartError> {
        let raw: BTreeMap<String, Value> = self.get(session_keys::CART).await?.unwrap_or_default();
        let count: u32 = self.get(session_keys::CART_COUNT).await?.unwrap_or(0);
        let total: i64 = self.get(session_keys::CART_TOTAL).await?.unwrap_or(0);

        Ok(CartState::from_parts(
            decode_items(raw),
            CartSummary {
                total_item_count: count,
                total_price: Price::new(total),
            },
        ))
    }

    async fn store_cart(&self, cart: &CartState) -> Result<(), CartError> {
        self.insert(session_keys::CART, encode_items(cart)).await?;
        self.store_summary(cart.cached_summary()).await
    }

    async fn store_summary(&self, summary: CartSummary) -> Result<(), CartError> {
        self.insert(session_keys::CART_COUNT, summary.total_item_count)
            .await?;
        self.insert(session_keys::CART_TOTAL, summary.total_price.yen())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use wendy_woo_core::CategoryId;

    use super::*;

    #[derive(Default)]
    struct FakeCatalog {
        products: Mutex<HashMap<ProductId, Product>>,
    }

    impl FakeCatalog {
        fn with(products: &[(i32, i64)]) -> Self {
            let catalog = Self::default();
            for &(id, yen) in products {
                catalog.put(id, yen);
            }
            catalog
        }

        fn put(&self, id: i32, yen: i64) {
            let product = Product {
                id: ProductId::new(id),
                category_id: CategoryId::new(1),
                name: format!("Product {id}"),
                description: String::new(),
                image: None,
                price: Price::new(yen),
                is_available: true,
            };
            self.products.lock().unwrap().insert(product.id, product);
        }

        fn delete(&self, id: i32) {
            self.products.lock().unwrap().remove(&ProductId::new(id));
        }
    }

    impl Catalog for FakeCatalog {
        async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            Ok(self.products.lock().unwrap().get(&id).cloned())
        }

        async fn search_products(
            &self,
            query: &str,
            limit: i64,
        ) -> Result<Vec<Product>, RepositoryError> {
            let needle = query.to_lowercase();
            let mut found: Vec<Product> = self
                .products
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            found.sort_by_key(|p| p.id);
            found.truncate(usize::try_from(limit).unwrap_or(0));
            Ok(found)
        }
    }

    #[derive(Default)]
    struct FakeSession {
        cart: Mutex<CartState>,
        mapping_writes: AtomicUsize,
    }

    impl CartSession for FakeSession {
        async fn load_cart(&self) -> Result<CartState, CartError> {
            Ok(self.cart.lock().unwrap().clone())
        }

        async fn store_cart(&self, cart: &CartState) -> Result<(), CartError> {
            *self.cart.lock().unwrap() = cart.clone();
            self.mapping_writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn store_summary(&self, summary: CartSummary) -> Result<(), CartError> {
            self.cart.lock().unwrap().apply_summary(summary);
            Ok(())
        }
    }

    impl FakeSession {
        fn stored(&self) -> CartState {
            self.cart.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_add_item_twice_accumulates() {
        let catalog = FakeCatalog::with(&[(5, 800)]);
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);

        engine.add_item(ProductId::new(5)).await.unwrap();
        let added = engine.add_item(ProductId::new(5)).await.unwrap();

        assert_eq!(added.quantity, 2);
        assert_eq!(added.summary.total_item_count, 2);
        assert_eq!(added.summary.total_price, Price::new(1600));
        assert_eq!(session.stored().cached_summary(), added.summary);
    }

    #[tokio::test]
    async fn test_add_distinct_items_sums_prices() {
        let catalog = FakeCatalog::with(&[(1, 300), (2, 450), (3, 1200)]);
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);

        for id in 1..=3 {
            engine.add_item(ProductId::new(id)).await.unwrap();
        }

        let summary = engine.compute_summary().await.unwrap();
        assert_eq!(summary.total_item_count, 3);
        assert_eq!(summary.total_price, Price::new(1950));
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let catalog = FakeCatalog::default();
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);

        let err = engine.add_item(ProductId::new(42)).await.unwrap_err();
        assert!(matches!(err, CartError::NotFound(id) if id == ProductId::new(42)));
        assert!(session.stored().is_empty());
    }

    #[tokio::test]
    async fn test_set_negative_quantity_removes_entry() {
        let catalog = FakeCatalog::with(&[(3, 500), (7, 1200)]);
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);
        engine.set_item_quantity(ProductId::new(3), 2).await.unwrap();
        engine.add_item(ProductId::new(7)).await.unwrap();

        let summary = engine
            .set_item_quantity(ProductId::new(3), -1)
            .await
            .unwrap();

        assert_eq!(session.stored().quantity(ProductId::new(3)), None);
        assert_eq!(summary.total_item_count, 1);
        assert_eq!(summary.total_price, Price::new(1200));
    }

    #[tokio::test]
    async fn test_set_zero_on_absent_entry_stores_nothing() {
        let catalog = FakeCatalog::default();
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);

        engine.set_item_quantity(ProductId::new(9), 0).await.unwrap();

        assert!(session.stored().is_empty());
    }

    #[tokio::test]
    async fn test_set_positive_quantity_for_missing_product_fails() {
        let catalog = FakeCatalog::default();
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);

        let err = engine.set_item_quantity(ProductId::new(9), 2).await.unwrap_err();
        assert!(matches!(err, CartError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_absent_item_is_noop() {
        let catalog = FakeCatalog::with(&[(1, 100)]);
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);
        engine.add_item(ProductId::new(1)).await.unwrap();

        let summary = engine.remove_item(ProductId::new(2)).await.unwrap();

        assert_eq!(summary.total_item_count, 1);
        assert_eq!(session.stored().items().len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_product_excluded_but_kept_in_mapping() {
        let catalog = FakeCatalog::with(&[(3, 500), (7, 1200)]);
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);
        engine.add_item(ProductId::new(3)).await.unwrap();
        engine.add_item(ProductId::new(7)).await.unwrap();

        catalog.delete(7);
        let summary = engine.compute_summary().await.unwrap();
        let contents = engine.list_cart_lines().await.unwrap();

        assert_eq!(summary.total_item_count, 1);
        assert_eq!(summary.total_price, Price::new(500));
        assert_eq!(contents.lines.len(), 1);
        assert_eq!(session.stored().quantity(ProductId::new(7)), Some(1));
    }

    #[tokio::test]
    async fn test_summary_follows_price_changes() {
        let catalog = FakeCatalog::with(&[(1, 100)]);
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);
        engine.set_item_quantity(ProductId::new(1), 3).await.unwrap();

        catalog.put(1, 150);
        let summary = engine.compute_summary().await.unwrap();

        assert_eq!(summary.total_price, Price::new(450));
        assert_eq!(session.stored().cached_summary().total_price, Price::new(450));
    }

    #[tokio::test]
    async fn test_compute_summary_writes_totals_only() {
        let catalog = FakeCatalog::with(&[(1, 100), (2, 250)]);
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);
        engine.add_item(ProductId::new(1)).await.unwrap();
        engine.add_item(ProductId::new(2)).await.unwrap();
        let writes_before = session.mapping_writes.load(Ordering::SeqCst);
        catalog.put(2, 300);

        let summary = engine.compute_summary().await.unwrap();

        assert_eq!(session.mapping_writes.load(Ordering::SeqCst), writes_before);
        assert_eq!(summary.total_price, Price::new(400));
        assert_eq!(session.stored().cached_summary(), summary);
    }

    #[tokio::test]
    async fn test_inspect_reports_missing() {
        let catalog = FakeCatalog::with(&[(1, 100), (2, 200)]);
        let session = FakeSession::default();
        let engine = CartEngine::new(&session, &catalog);
        engine.add_item(ProductId::new(1)).await.unwrap();
        engine.add_item(ProductId::new(2)).await.unwrap();
        catalog.delete(2);

        let inspection = engine.inspect().await.unwrap();

        assert_eq!(inspection.missing, vec![ProductId::new(2)]);
        assert_eq!(inspection.cached.total_item_count, 2);
        assert_eq!(inspection.current.total_item_count, 1);
    }

    #[test]
    fn test_parse_item_id() {
        assert_eq!(parse_item_id(&json!(3)).unwrap(), ProductId::new(3));
        assert_eq!(parse_item_id(&json!("3")).unwrap(), ProductId::new(3));
        assert!(parse_item_id(&json!("three")).is_err());
        assert!(parse_item_id(&json!(null)).is_err());
        assert!(parse_item_id(&json!(1.5)).is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(None).unwrap(), 1);
        assert_eq!(parse_quantity(Some(&json!(4))).unwrap(), 4);
        assert_eq!(parse_quantity(Some(&json!("-1"))).unwrap(), -1);
        assert!(parse_quantity(Some(&json!(2.5))).is_err());
        assert!(parse_quantity(Some(&json!("lots"))).is_err());
        assert!(parse_quantity(Some(&json!([1]))).is_err());
    }

    #[test]
    fn test_session_encoding_uses_string_keys() {
        let mut cart = CartState::new();
        cart.increment(ProductId::new(3));
        cart.increment(ProductId::new(3));
        cart.increment(ProductId::new(7));

        let encoded = serde_json::to_value(encode_items(&cart)).unwrap();
        assert_eq!(encoded, json!({"3": 2, "7": 1}));
    }

    #[test]
    fn test_decode_drops_malformed_entries() {
        let raw: BTreeMap<String, Value> =
            serde_json::from_value(json!({"3": 2, "abc": 1, "4": 0, "5": "x", "6": -2})).unwrap();

        let items = decode_items(raw);

        assert_eq!(items.len(), 1);
        assert_eq!(items.get(&ProductId::new(3)).map(|q| q.get()), Some(2));
    }
}
