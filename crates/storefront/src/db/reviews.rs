//! Product review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use wendy_woo_core::{ProductId, Rating, ReviewId, UserId};

use super::RepositoryError;
use crate::models::{NewReview, Review};

/// Row shape of the review listing query.
#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    author: String,
    rating: i16,
    comment: String,
    photo: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(row.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating for review {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            author: row.author,
            rating,
            comment: row.comment,
            photo: row.photo,
            created_at: row.created_at,
        })
    }
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored rating is out of range.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.product_id, r.user_id,
                   COALESCE(NULLIF(TRIM(u.first_name), ''), u.email) AS author,
                   r.rating, r.comment, r.photo, r.created_at
            FROM product_review r
            JOIN app_user u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    /// Whether `user_id` has already reviewed `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_for(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM product_review WHERE product_id = $1 AND user_id = $2)",
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Store a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, review: &NewReview) -> Result<ReviewId, RepositoryError> {
        let (id,): (ReviewId,) = sqlx::query_as(
            r"
            INSERT INTO product_review (product_id, user_id, rating, comment, photo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(&review.photo)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "review"))?;

        Ok(id)
    }
}
