//! Catalog lookup seam shared by the cart engine and product search.

use std::future::Future;

use wendy_woo_core::ProductId;

use crate::db::RepositoryError;
use crate::models::Product;

/// Read access to the product catalog.
pub trait Catalog: Send + Sync {
    /// Look up a product by ID.
    fn find_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Case-insensitive substring search over name and description.
    fn search_products(
        &self,
        query: &str,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;
}
