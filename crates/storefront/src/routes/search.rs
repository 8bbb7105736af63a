//! Search route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::Product;
use crate::services::Catalog;
use crate::state::AppState;

/// Results returned by the instant-search API.
const SUGGESTION_LIMIT: i64 = 5;

/// Results shown on the search page.
const PAGE_LIMIT: i64 = 50;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// One instant-search suggestion.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SuggestionJson {
    pub id: i32,
    pub name: String,
    /// Display price, e.g. `¥800`.
    pub price: String,
    pub url: String,
}

impl From<Product> for SuggestionJson {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.as_i32(),
            price: product.price.to_string(),
            url: product.url(),
            name: product.name,
        }
    }
}

/// Instant-search response.
#[derive(Debug, Serialize)]
pub struct SuggestionsJson {
    pub results: Vec<SuggestionJson>,
}

/// Search results page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchPageTemplate {
    pub ctx: PageContext,
    pub query: String,
    pub products: Vec<Product>,
}

/// `GET /search?q=`
#[instrument(skip(state, ctx))]
pub async fn page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    ctx: PageContext,
) -> Result<SearchPageTemplate, AppError> {
    let q = query.q.trim().to_string();
    let products = if q.is_empty() {
        Vec::new()
    } else {
        state.catalog().search_products(&q, PAGE_LIMIT).await?
    };

    Ok(SearchPageTemplate {
        ctx,
        query: q,
        products,
    })
}

/// `GET /api/search?q=`: at most five suggestions.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SuggestionsJson>, AppError> {
    let q = query.q.trim();
    let results = if q.is_empty() {
        Vec::new()
    } else {
        state
            .catalog()
            .search_products(q, SUGGESTION_LIMIT)
            .await?
            .into_iter()
            .map(SuggestionJson::from)
            .collect()
    };

    Ok(Json(SuggestionsJson { results }))
}
