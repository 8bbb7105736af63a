//! Cart route handlers.
//!
//! Two surfaces over the same [`CartEngine`]: a form post that redirects back
//! to the shop with a flash message, and a JSON API used by the cart page
//! scripts. JSON endpoints never use the generic error page; every failure is
//! `{ "success": false, "error": ... }`.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use wendy_woo_core::{CartSummary, ProductId};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{Flash, OptionalAuth, PageContext, with_flash};
use crate::services::cart::{
    CartContents, CartEngine, CartError, parse_item_id, parse_quantity,
};
use crate::state::AppState;

// =============================================================================
// JSON Shapes
// =============================================================================

/// One cart line as sent to the browser.
#[derive(Debug, Serialize)]
pub struct CartItemJson {
    pub id: ProductId,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
    pub total_price: i64,
}

/// Successful cart API response.
#[derive(Debug, Serialize)]
pub struct CartJson {
    pub success: bool,
    pub total_items: u32,
    pub total_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CartItemJson>>,
}

impl From<CartSummary> for CartJson {
    fn from(summary: CartSummary) -> Self {
        Self {
            success: true,
            total_items: summary.total_item_count,
            total_price: summary.total_price.yen(),
            items: None,
        }
    }
}

impl From<CartContents> for CartJson {
    fn from(contents: CartContents) -> Self {
        let items = contents
            .lines
            .into_iter()
            .map(|line| CartItemJson {
                id: line.product.id,
                price: line.product.price.yen(),
                name: line.product.name,
                quantity: line.quantity,
                total_price: line.line_total.yen(),
            })
            .collect();

        Self {
            items: Some(items),
            ..Self::from(contents.summary)
        }
    }
}

/// Failed cart API response.
#[derive(Debug, Serialize)]
pub struct CartFailureJson {
    pub success: bool,
    pub error: String,
}

/// Render a cart operation result as JSON.
fn cart_json<T: Into<CartJson>>(result: Result<T, CartError>) -> Response {
    match result {
        Ok(value) => Json(value.into()).into_response(),
        Err(err) => cart_failure(err),
    }
}

fn cart_failure(err: CartError) -> Response {
    let status = match &err {
        CartError::NotFound(_) => StatusCode::NOT_FOUND,
        CartError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        CartError::Catalog(_) | CartError::Session(_) => {
            let event_id = sentry::capture_error(&err);
            tracing::error!(error = %err, sentry_event_id = %event_id, "Cart operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(CartFailureJson {
            success: false,
            error: err.public_message(),
        }),
    )
        .into_response()
}

/// Parse a JSON request body, reporting malformed JSON as a cart failure.
fn parse_body(body: &Bytes) -> Result<Value, CartError> {
    serde_json::from_slice(body)
        .map_err(|e| CartError::InvalidArgument(format!("Invalid request body: {e}")))
}

// =============================================================================
// Pages
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub contents: CartContents,
}

/// Display the cart page.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
) -> Result<CartShowTemplate, AppError> {
    let catalog = state.catalog();
    let contents = CartEngine::new(&session, &catalog).list_cart_lines().await?;
    ctx.cart_count = contents.summary.total_item_count;

    Ok(CartShowTemplate { ctx, contents })
}

/// Add one unit from a shop page form and go back to the shop.
#[instrument(skip(state, session))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    let catalog = state.catalog();
    let added = CartEngine::new(&session, &catalog)
        .add_item(product_id)
        .await
        .map_err(|e| match e {
            CartError::NotFound(id) => AppError::NotFound(format!("product {id}")),
            other => AppError::Cart(other),
        })?;

    add_breadcrumb(
        "cart",
        "Added item to cart",
        Some(&[("product_id", &product_id.to_string())]),
    );

    let flash = Flash::Success(format!("Added {} to cart!", added.product.name));
    Ok(Redirect::to(&with_flash("/shopnow", &flash)))
}

// =============================================================================
// JSON API
// =============================================================================

/// `POST /api/cart/add/{product_id}`
#[instrument(skip(state, session))]
pub async fn api_add(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
) -> Response {
    let catalog = state.catalog();
    let result = async {
        let product_id = parse_item_id(&Value::String(product_id))?;
        let added = CartEngine::new(&session, &catalog).add_item(product_id).await?;
        Ok::<_, CartError>(added.summary)
    }
    .await;

    cart_json(result)
}

/// `POST /api/cart/update` with `{ "item_id": .., "quantity": .. }`.
#[instrument(skip(state, session, body))]
pub async fn api_update(State(state): State<AppState>, session: Session, body: Bytes) -> Response {
    let catalog = state.catalog();
    let result = async {
        let body = parse_body(&body)?;
        let product_id = parse_item_id(body.get("item_id").unwrap_or(&Value::Null))?;
        let quantity = parse_quantity(body.get("quantity"))?;
        CartEngine::new(&session, &catalog)
            .set_item_quantity(product_id, quantity)
            .await
    }
    .await;

    cart_json(result)
}

/// `POST /api/cart/remove` with `{ "item_id": .. }`.
#[instrument(skip(state, session, body))]
pub async fn api_remove(State(state): State<AppState>, session: Session, body: Bytes) -> Response {
    let catalog = state.catalog();
    let result = async {
        let body = parse_body(&body)?;
        let product_id = parse_item_id(body.get("item_id").unwrap_or(&Value::Null))?;
        CartEngine::new(&session, &catalog)
            .remove_item(product_id)
            .await
    }
    .await;

    cart_json(result)
}

/// `GET /api/cart/data`: totals and every resolvable line.
#[instrument(skip(state, session))]
pub async fn api_data(State(state): State<AppState>, session: Session) -> Response {
    let catalog = state.catalog();
    cart_json(CartEngine::new(&session, &catalog).list_cart_lines().await)
}

/// Login state for the cart page's checkout button.
#[derive(Debug, Serialize)]
pub struct AuthStatusJson {
    pub authenticated: bool,
    pub username: Option<String>,
}

/// `GET /api/check-auth`
pub async fn check_auth(OptionalAuth(user): OptionalAuth) -> Json<AuthStatusJson> {
    Json(AuthStatusJson {
        authenticated: user.is_some(),
        username: user.map(|u| u.email.into_inner()),
    })
}

/// Raw cart view for diagnostics.
#[derive(Debug, Serialize)]
pub struct CartDebugJson {
    pub items: BTreeMap<String, u32>,
    pub cached: CartSummary,
    pub current: CartSummary,
    pub missing: Vec<ProductId>,
}

/// `GET /debug/cart`, only when debug mode is on.
#[instrument(skip(state, session))]
pub async fn debug(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    if !state.config().debug {
        return Err(AppError::NotFound("/debug/cart".to_string()));
    }

    let catalog = state.catalog();
    let inspection = CartEngine::new(&session, &catalog).inspect().await?;
    let items = inspection
        .items
        .iter()
        .map(|(id, quantity)| (id.to_string(), *quantity))
        .collect();

    tracing::info!(
        items = ?inspection.items,
        cached = ?inspection.cached,
        current = ?inspection.current,
        missing = ?inspection.missing,
        "Cart debug"
    );

    Ok(Json(CartDebugJson {
        items,
        cached: inspection.cached,
        current: inspection.current,
        missing: inspection.missing,
    })
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wendy_woo_core::{CartLine, CategoryId, Price};

    use super::*;
    use crate::models::Product;

    fn product(id: i32, yen: i64) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Cake {id}"),
            description: String::new(),
            image: None,
            price: Price::new(yen),
            is_available: true,
        }
    }

    #[test]
    fn test_summary_json_omits_items() {
        let json = serde_json::to_value(CartJson::from(CartSummary {
            total_item_count: 3,
            total_price: Price::new(2200),
        }))
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "success": true, "total_items": 3, "total_price": 2200 })
        );
    }

    #[test]
    fn test_contents_json_lists_lines() {
        let contents = CartContents {
            lines: vec![CartLine {
                product: product(3, 500),
                quantity: 2,
                line_total: Price::new(1000),
            }],
            summary: CartSummary {
                total_item_count: 2,
                total_price: Price::new(1000),
            },
        };

        let json = serde_json::to_value(CartJson::from(contents)).unwrap();

        assert_eq!(
            json["items"],
            serde_json::json!([
                { "id": 3, "name": "Cake 3", "price": 500, "quantity": 2, "total_price": 1000 }
            ])
        );
    }

    #[test]
    fn test_failure_statuses() {
        assert_eq!(
            cart_failure(CartError::NotFound(ProductId::new(1))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            cart_failure(CartError::InvalidArgument("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_malformed_body_is_invalid_argument() {
        let err = parse_body(&Bytes::from_static(b"{not json")).unwrap_err();
        assert!(matches!(err, CartError::InvalidArgument(_)));
    }
}
