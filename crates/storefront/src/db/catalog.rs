//! Catalog repository: categories and products.

use sqlx::PgPool;

use wendy_woo_core::ProductId;

use super::RepositoryError;
use crate::models::{Category, CategoryWithProducts, NewProduct, Product};
use crate::services::Catalog;

const PRODUCT_COLUMNS: &str =
    "id, category_id, name, description, image, price, is_available";

/// Catalog backed by `PostgreSQL`.
#[derive(Clone, Copy)]
pub struct PgCatalog<'a> {
    pool: &'a PgPool,
}

impl<'a> PgCatalog<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Products whose name or description contains `query`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let pattern = like_pattern(query);
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product \
             WHERE name ILIKE $1 ESCAPE '\\' OR description ILIKE $1 ESCAPE '\\' \
             ORDER BY name, id \
             LIMIT $2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Every category with its products, both ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_categories_with_products(
        &self,
    ) -> Result<Vec<CategoryWithProducts>, RepositoryError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM category ORDER BY name, id")
                .fetch_all(self.pool)
                .await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY name, id"
        ))
        .fetch_all(self.pool)
        .await?;

        // Both sides are small; group in memory rather than N+1 queries.
        let mut grouped: Vec<CategoryWithProducts> = categories
            .into_iter()
            .map(|category| CategoryWithProducts {
                category,
                products: Vec::new(),
            })
            .collect();
        for product in products {
            if let Some(group) = grouped
                .iter_mut()
                .find(|g| g.category.id == product.category_id)
            {
                group.products.push(product);
            }
        }

        Ok(grouped)
    }

    /// Insert a category, or return the existing one with the same name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(&self, name: &str) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO category (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, name",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO product (category_id, name, description, image, price, is_available) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.price)
        .bind(product.is_available)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Delete every category and, by cascade, every product and review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM category")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl Catalog for PgCatalog<'_> {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.get_product(id).await
    }

    async fn search_products(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.search(query, limit).await
    }
}

/// Build an `ILIKE` substring pattern with the wildcards in `query` escaped.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_query() {
        assert_eq!(like_pattern("mochi"), "%mochi%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
