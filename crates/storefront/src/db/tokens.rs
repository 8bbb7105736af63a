//! Account token repository.
//!
//! Only a digest of each emailed token is stored. Redeeming a token is a
//! single `UPDATE ... RETURNING`, so a token can be used at most once even
//! under concurrent requests.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use wendy_woo_core::UserId;

use super::RepositoryError;
use crate::models::TokenPurpose;

/// Repository for emailed account tokens.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token digest for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO account_token (user_id, purpose, token_digest, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user_id)
        .bind(purpose.as_str())
        .bind(digest)
        .bind(expires_at)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "token"))?;

        Ok(())
    }

    /// Mark a live token as used and return its owner.
    ///
    /// Returns `None` if no unused, unexpired token with this digest and
    /// purpose exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(
        &self,
        purpose: TokenPurpose,
        digest: &str,
    ) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(UserId,)> = sqlx::query_as(
            r"
            UPDATE account_token
            SET used_at = NOW()
            WHERE token_digest = $1
              AND purpose = $2
              AND used_at IS NULL
              AND expires_at > NOW()
            RETURNING user_id
            ",
        )
        .bind(digest)
        .bind(purpose.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(user_id,)| user_id))
    }

    /// Check a token without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn peek(
        &self,
        purpose: TokenPurpose,
        digest: &str,
    ) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(UserId,)> = sqlx::query_as(
            r"
            SELECT user_id FROM account_token
            WHERE token_digest = $1
              AND purpose = $2
              AND used_at IS NULL
              AND expires_at > NOW()
            ",
        )
        .bind(digest)
        .bind(purpose.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(user_id,)| user_id))
    }
}
