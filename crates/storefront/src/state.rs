//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::PgCatalog;
use crate::services::auth::AuthService;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    email: EmailService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `email` - Outgoing email (SMTP or log mode)
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, email: EmailService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Catalog backed by the pool.
    #[must_use]
    pub fn catalog(&self) -> PgCatalog<'_> {
        PgCatalog::new(&self.inner.pool)
    }

    /// Account service keyed by the session secret.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.pool, &self.inner.config.session_secret)
    }
}
