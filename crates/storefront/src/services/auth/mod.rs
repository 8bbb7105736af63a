//! Authentication service.
//!
//! Password accounts with emailed one-time tokens for email verification and
//! password reset. Tokens are 32 random bytes (base64url); only a keyed
//! SHA-256 digest is stored, so a database leak does not yield usable links.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use wendy_woo_core::Email;

use crate::db::RepositoryError;
use crate::db::users::NewUser;
use crate::db::{TokenRepository, UserRepository};
use crate::models::{TokenPurpose, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of first and last names.
const MAX_NAME_LENGTH: usize = 30;

/// How long emailed links stay valid.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Sign-up form input.
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    secret: &'a SecretString,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// `secret` keys the token digests (the session secret).
    #[must_use]
    pub const fn new(pool: &'a PgPool, secret: &'a SecretString) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            secret,
        }
    }

    /// Create an inactive account and a verification token for it.
    ///
    /// Returns the user and the raw token to embed in the emailed link.
    ///
    /// # Errors
    ///
    /// Returns a validation variant for bad input and
    /// `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(&self, form: &Registration<'_>) -> Result<(User, String), AuthError> {
        let email = Email::parse(form.email)?;
        let first_name = validate_name(form.first_name, "First name")?;
        let last_name = validate_name(form.last_name, "Last name")?;
        validate_new_password(form.password, form.password_confirm)?;

        let password_hash = hash_password(form.password)?;

        let user = self
            .users
            .create(&NewUser {
                email: &email,
                first_name,
                last_name,
                password_hash: &password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.issue_token(&user, TokenPurpose::VerifyEmail).await?;
        tracing::info!(user_id = %user.id, "Registered new account");
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// and `AuthError::Inactive` if the account was never verified.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_hash = self
            .users
            .get_password_hash(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        Ok(user)
    }

    /// Redeem a verification token and activate its account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token cannot be redeemed.
    pub async fn verify_email(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self
            .tokens
            .consume(TokenPurpose::VerifyEmail, &self.digest(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.users.activate(user_id).await?;
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(user)
    }

    /// Issue a password reset token for the account with this email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account uses the email.
    pub async fn request_password_reset(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = self.issue_token(&user, TokenPurpose::PasswordReset).await?;
        Ok((user, token))
    }

    /// Whether a reset token is currently redeemable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn reset_token_is_valid(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self
            .tokens
            .peek(TokenPurpose::PasswordReset, &self.digest(token))
            .await?
            .is_some())
    }

    /// Redeem a reset token and set a new password.
    ///
    /// # Errors
    ///
    /// Returns a validation variant for a bad password and
    /// `AuthError::InvalidToken` if the token cannot be redeemed.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(password, password_confirm)?;
        let password_hash = hash_password(password)?;

        let user_id = self
            .tokens
            .consume(TokenPurpose::PasswordReset, &self.digest(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.users.set_password(user_id, &password_hash).await?;
        tracing::info!(%user_id, "Password reset");
        Ok(())
    }

    async fn issue_token(&self, user: &User, purpose: TokenPurpose) -> Result<String, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
        self.tokens
            .create(user.id, purpose, &self.digest(&token), expires_at)
            .await?;
        Ok(token)
    }

    fn digest(&self, token: &str) -> String {
        token_digest(self.secret, token)
    }
}

/// 32 random bytes, base64url without padding.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Keyed digest stored in place of the token.
fn token_digest(secret: &SecretString, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.expose_secret().as_bytes());
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn validate_name<'s>(value: &'s str, label: &str) -> Result<&'s str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::InvalidField(format!("{label} is required.")));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidField(format!(
            "{label} must be at most {MAX_NAME_LENGTH} characters."
        )));
    }
    Ok(value)
}

fn validate_new_password(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
