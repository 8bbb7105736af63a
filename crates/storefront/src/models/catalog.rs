//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use wendy_woo_core::{CategoryId, Price, Priced, ProductId, Rating, ReviewId, UserId};

/// A product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    /// Path relative to the media root, e.g. `products/mochi.jpg`.
    pub image: Option<String>,
    pub price: Price,
    pub is_available: bool,
}

impl Product {
    /// Site path of the product detail page.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/product/{}", self.id)
    }
}

impl Priced for Product {
    fn unit_price(&self) -> Price {
        self.price
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A category and everything listed under it, for the shop page.
#[derive(Debug, Clone)]
pub struct CategoryWithProducts {
    pub category: Category,
    pub products: Vec<Product>,
}

/// A review as shown on the product page.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Display name of the reviewer.
    pub author: String,
    pub rating: Rating,
    pub comment: String,
    /// Photo path relative to the media root.
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A review about to be stored.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    pub comment: String,
    pub photo: Option<String>,
}

/// A product about to be seeded into the catalog.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub price: Price,
    pub is_available: bool,
}
