//! Cart engine over a real `tower_sessions::Session`.
//!
//! The catalog is an in-memory stand-in so these run without a database;
//! the session is the same type the handlers use, backed by `MemoryStore`.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tower_sessions::{MemoryStore, Session};

use wendy_woo_core::{CategoryId, Price, ProductId};
use wendy_woo_storefront::db::RepositoryError;
use wendy_woo_storefront::models::{Product, session_keys};
use wendy_woo_storefront::services::Catalog;
use wendy_woo_storefront::services::cart::{CartEngine, CartError, CartSession};

#[derive(Default)]
struct MemoryCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl MemoryCatalog {
    fn with(products: &[(i32, &str, i64)]) -> Self {
        let catalog = Self::default();
        for &(id, name, yen) in products {
            catalog.put(id, name, yen);
        }
        catalog
    }

    fn put(&self, id: i32, name: &str, yen: i64) {
        let product = Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: name.to_string(),
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

impl Catalog for MemoryCatalog {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn search_products(
        &self,
        _query: &str,
        _limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(Vec::new())
    }
}

fn new_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

async fn stored_items(session: &Session) -> BTreeMap<String, Value> {
    session
        .get(session_keys::CART)
        .await
        .unwrap()
        .unwrap_or_default()
}

async fn stored_totals(session: &Session) -> (u32, i64) {
    let count = session.get(session_keys::CART_COUNT).await.unwrap().unwrap();
    let total = session.get(session_keys::CART_TOTAL).await.unwrap().unwrap();
    (count, total)
}

#[tokio::test]
async fn test_add_writes_mapping_and_cached_totals() {
    let catalog = MemoryCatalog::with(&[(3, "Matcha Roll", 800), (7, "Yuzu Tart", 450)]);
    let session = new_session();
    let engine = CartEngine::new(&session, &catalog);

    engine.add_item(ProductId::new(3)).await.unwrap();
    engine.add_item(ProductId::new(3)).await.unwrap();
    let added = engine.add_item(ProductId::new(7)).await.unwrap();

    assert_eq!(added.product.name, "Yuzu Tart");
    assert_eq!(added.quantity, 1);

    let items = stored_items(&session).await;
    assert_eq!(items.get("3"), Some(&json!(2)));
    assert_eq!(items.get("7"), Some(&json!(1)));
    assert_eq!(stored_totals(&session).await, (3, 2050));
}

#[tokio::test]
async fn test_totals_follow_current_catalog_prices() {
    let catalog = MemoryCatalog::with(&[(3, "Matcha Roll", 800)]);
    let session = new_session();
    let engine = CartEngine::new(&session, &catalog);

    engine.set_item_quantity(ProductId::new(3), 2).await.unwrap();
    catalog.put(3, "Matcha Roll", 900);

    let summary = engine.compute_summary().await.unwrap();

    assert_eq!(summary.total_price, Price::new(1800));
    assert_eq!(stored_totals(&session).await, (2, 1800));
}

#[tokio::test]
async fn test_deleted_product_stays_in_mapping_but_leaves_totals() {
    let catalog = MemoryCatalog::with(&[(3, "Matcha Roll", 800), (7, "Yuzu Tart", 450)]);
    let session = new_session();
    let engine = CartEngine::new(&session, &catalog);

    engine.set_item_quantity(ProductId::new(3), 1).await.unwrap();
    engine.set_item_quantity(ProductId::new(7), 2).await.unwrap();
    catalog.delete(7);

    let contents = engine.list_cart_lines().await.unwrap();
    assert_eq!(contents.lines.len(), 1);
    assert_eq!(contents.summary.total_item_count, 1);
    assert_eq!(contents.summary.total_price, Price::new(800));

    // Listing is read-only: cached totals still reflect the last write.
    assert_eq!(stored_totals(&session).await, (3, 1700));

    let inspection = engine.inspect().await.unwrap();
    assert_eq!(inspection.missing, vec![ProductId::new(7)]);
    assert_eq!(inspection.items.get(&ProductId::new(7)), Some(&2));
}

#[tokio::test]
async fn test_quantity_zero_removes_without_catalog_lookup() {
    let catalog = MemoryCatalog::with(&[(3, "Matcha Roll", 800)]);
    let session = new_session();
    let engine = CartEngine::new(&session, &catalog);

    engine.add_item(ProductId::new(3)).await.unwrap();
    catalog.delete(3);

    let summary = engine.set_item_quantity(ProductId::new(3), 0).await.unwrap();

    assert_eq!(summary.total_item_count, 0);
    assert!(stored_items(&session).await.is_empty());
}

#[tokio::test]
async fn test_unknown_product_leaves_session_untouched() {
    let catalog = MemoryCatalog::with(&[(3, "Matcha Roll", 800)]);
    let session = new_session();
    let engine = CartEngine::new(&session, &catalog);

    engine.add_item(ProductId::new(3)).await.unwrap();

    let err = engine.add_item(ProductId::new(99)).await.unwrap_err();
    assert!(matches!(err, CartError::NotFound(id) if id == ProductId::new(99)));
    assert_eq!(err.public_message(), "Product not found");

    let err = engine
        .set_item_quantity(ProductId::new(99), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::NotFound(_)));

    assert_eq!(stored_items(&session).await.len(), 1);
    assert_eq!(stored_totals(&session).await, (1, 800));
}

#[tokio::test]
async fn test_remove_absent_item_is_a_noop() {
    let catalog = MemoryCatalog::with(&[(3, "Matcha Roll", 800)]);
    let session = new_session();
    let engine = CartEngine::new(&session, &catalog);

    engine.add_item(ProductId::new(3)).await.unwrap();
    let summary = engine.remove_item(ProductId::new(42)).await.unwrap();

    assert_eq!(summary.total_item_count, 1);
    assert_eq!(summary.total_price, Price::new(800));
}

#[tokio::test]
async fn test_malformed_session_entries_are_skipped_on_load() {
    let session = new_session();
    session
        .insert(
            session_keys::CART,
            json!({ "3": 2, "abc": 1, "4": 0, "5": "two" }),
        )
        .await
        .unwrap();

    let cart = session.load_cart().await.unwrap();

    assert_eq!(cart.quantity(ProductId::new(3)), Some(2));
    assert_eq!(cart.items().len(), 1);
}

#[tokio::test]
async fn test_summary_keeps_unparseable_entries_in_session() {
    let catalog = MemoryCatalog::with(&[(3, "Matcha Roll", 800)]);
    let session = new_session();
    let stored = json!({ "3": 2, "abc": 1 });
    session
        .insert(session_keys::CART, stored.clone())
        .await
        .unwrap();

    let summary = CartEngine::new(&session, &catalog)
        .compute_summary()
        .await
        .unwrap();

    assert_eq!(summary.total_item_count, 2);
    assert_eq!(summary.total_price, Price::new(1600));
    let raw: Value = session.get(session_keys::CART).await.unwrap().unwrap();
    assert_eq!(raw, stored);
    assert_eq!(stored_totals(&session).await, (2, 1600));
}

#[tokio::test]
async fn test_empty_session_has_empty_cart() {
    let catalog = MemoryCatalog::default();
    let session = new_session();

    let contents = CartEngine::new(&session, &catalog)
        .list_cart_lines()
        .await
        .unwrap();

    assert!(contents.lines.is_empty());
    assert_eq!(contents.summary.total_item_count, 0);
    assert_eq!(contents.summary.total_price, Price::new(0));
}
