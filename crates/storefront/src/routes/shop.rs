//! Catalog page handlers: the shop listing and product detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use wendy_woo_core::{ProductId, Rating, average_rating};

use crate::db::ReviewRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext};
use crate::models::{CategoryWithProducts, Product, Review};
use crate::state::AppState;

/// Shop listing template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopTemplate {
    pub ctx: PageContext,
    pub categories: Vec<CategoryWithProducts>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product.html")]
pub struct ProductTemplate {
    pub ctx: PageContext,
    pub product: Product,
    pub reviews: Vec<Review>,
    pub average_rating: f64,
    pub review_count: usize,
    /// Whether the visitor may submit a review (logged in, not yet reviewed).
    pub can_review: bool,
    pub ratings: [u8; 5],
}

/// `GET /shopnow`: every category with its products.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<ShopTemplate, AppError> {
    let categories = state.catalog().list_categories_with_products().await?;
    Ok(ShopTemplate { ctx, categories })
}

/// `GET /product/{id}`
#[instrument(skip(state, user, ctx))]
pub async fn product(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    OptionalAuth(user): OptionalAuth,
    ctx: PageContext,
) -> Result<ProductTemplate, AppError> {
    let product = state
        .catalog()
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;

    let ratings: Vec<Rating> = reviews.iter().map(|r| r.rating).collect();
    let can_review =
        user.is_some_and(|user| reviews.iter().all(|review| review.user_id != user.id));

    Ok(ProductTemplate {
        ctx,
        average_rating: average_rating(&ratings),
        review_count: reviews.len(),
        product,
        reviews,
        can_review,
        ratings: [5, 4, 3, 2, 1],
    })
}
