//! Checkout handlers.
//!
//! Payment is cash on delivery only, so checkout is a confirmation page: no
//! order is recorded and the cart is left as it is.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::auth::login_url;
use crate::middleware::{Flash, OptionalAuth, PageContext, RequireAuth, with_flash};
use crate::services::cart::{CartContents, CartEngine, CartSession};
use crate::state::AppState;

/// Payment confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub ctx: PageContext,
    pub contents: CartContents,
}

/// `GET /checkout`: send the visitor to the right step.
#[instrument(skip(session, user))]
pub async fn checkout(
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response, AppError> {
    if user.is_none() {
        return Ok(Redirect::to(&login_url("/checkout")).into_response());
    }

    if session.load_cart().await?.is_empty() {
        let flash = Flash::Warning("Your cart is empty!".to_string());
        return Ok(Redirect::to(&with_flash("/cart", &flash)).into_response());
    }

    Ok(Redirect::to("/checkout/payment").into_response())
}

/// `GET /checkout/payment` (login required).
#[instrument(skip(state, session, ctx))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_user): RequireAuth,
    ctx: PageContext,
) -> Result<PaymentTemplate, AppError> {
    let catalog = state.catalog();
    let contents = CartEngine::new(&session, &catalog).list_cart_lines().await?;
    Ok(PaymentTemplate { ctx, contents })
}
