//! Account page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::User;
use crate::state::AppState;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub user: User,
}

/// `GET /profile` (login required).
#[instrument(skip(state, current, ctx))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
) -> Result<ProfileTemplate, AppError> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    Ok(ProfileTemplate { ctx, user })
}
