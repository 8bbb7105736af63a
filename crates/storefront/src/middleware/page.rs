//! Per-page context for the shared layout.
//!
//! Every full page shows the cart badge, the login state and any flash
//! message carried on the redirect as `?success=`, `?warning=` or `?error=`.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// A one-shot message shown at the top of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Success(String),
    Warning(String),
    Error(String),
}

impl Flash {
    /// CSS modifier for the message box.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Warning(_) => "warning",
            Self::Error(_) => "error",
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Warning(text) | Self::Error(text) => text,
        }
    }

    /// Parse the flash out of a query string.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Option<Self> {
        let query = query?;
        url::form_urlencoded::parse(query.as_bytes()).find_map(|(key, value)| {
            match key.as_ref() {
                "success" => Some(Self::Success(value.into_owned())),
                "warning" => Some(Self::Warning(value.into_owned())),
                "error" => Some(Self::Error(value.into_owned())),
                _ => None,
            }
        })
    }
}

/// Layout data available to every page template.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    /// Cached item count from the session; no catalog lookup.
    pub cart_count: u32,
    pub flash: Option<Flash>,
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let flash = Flash::from_query(parts.uri.query());
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self {
                flash,
                ..Self::default()
            });
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let cart_count = session
            .get::<u32>(session_keys::CART_COUNT)
            .await
            .ok()
            .flatten()
            .unwrap_or(0);

        Ok(Self {
            user,
            cart_count,
            flash,
        })
    }
}

/// Append a flash message to a redirect target.
#[must_use]
pub fn with_flash(path: &str, flash: &Flash) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!(
        "{path}{separator}{}={}",
        flash.kind(),
        urlencoding::encode(flash.text())
    )
}
