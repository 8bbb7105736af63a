//! Review submission handler.

use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
};
use tracing::instrument;

use wendy_woo_core::{ProductId, Rating};

use crate::db::{RepositoryError, ReviewRepository};
use crate::error::AppError;
use crate::middleware::auth::login_url;
use crate::middleware::{Flash, OptionalAuth, with_flash};
use crate::models::NewReview;
use crate::routes::form::SubmittedForm;
use crate::services::uploads;
use crate::state::AppState;

const ALREADY_REVIEWED: &str = "You have already reviewed this product.";

/// `POST /product/{id}/add-review` (multipart: rating, comment, photo).
///
/// Every outcome redirects back to the product page with a flash message.
#[instrument(skip(state, user, multipart))]
pub async fn add_review(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    OptionalAuth(user): OptionalAuth,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let product_url = format!("/product/{product_id}");
    let Some(user) = user else {
        return Ok(Redirect::to(&login_url(&product_url)));
    };
    let back = |flash: Flash| Ok(Redirect::to(&with_flash(&product_url, &flash)));

    if state.catalog().get_product(product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {product_id}")));
    }

    let reviews = ReviewRepository::new(state.pool());
    if reviews.exists_for(product_id, user.id).await? {
        return back(Flash::Warning(ALREADY_REVIEWED.to_string()));
    }

    let mut form = SubmittedForm::read(multipart).await?;

    let Some(rating) = form
        .text("rating")
        .parse::<i64>()
        .ok()
        .and_then(|stars| Rating::new(stars).ok())
    else {
        return back(Flash::Error(
            "Please choose a rating from 1 to 5 stars.".to_string(),
        ));
    };

    let comment = form.text("comment").to_string();
    if comment.is_empty() {
        return back(Flash::Error("Please write a comment.".to_string()));
    }

    let photo = match form.take_photo() {
        Ok(photo) => photo,
        Err(err) => return back(Flash::Error(err.public_message())),
    };
    let photo_path = match &photo {
        Some(photo) => Some(uploads::store_review_photo(&state.config().media_dir, photo).await?),
        None => None,
    };

    let review = NewReview {
        product_id,
        user_id: user.id,
        rating,
        comment,
        photo: photo_path,
    };

    match reviews.create(&review).await {
        Ok(review_id) => {
            tracing::info!(%review_id, %product_id, user_id = %user.id, "Review added");
            back(Flash::Success("Thank you for your review!".to_string()))
        }
        Err(RepositoryError::Conflict(_)) => back(Flash::Warning(ALREADY_REVIEWED.to_string())),
        Err(err) => Err(err.into()),
    }
}
