//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] wendy_woo_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Correct credentials, but the email was never verified.
    #[error("account is not active")]
    Inactive,

    /// No account with this email.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A submitted form field is missing or too long.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// Emailed token is unknown, expired, already used or for another purpose.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message shown next to the form.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Enter a valid email address.".to_string(),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::Inactive => {
                "Your account is not active. Please check your email for the verification link."
                    .to_string()
            }
            Self::UserNotFound => "No account found with this email address".to_string(),
            Self::UserAlreadyExists => "This email is already registered.".to_string(),
            Self::WeakPassword(msg) | Self::InvalidField(msg) => msg.clone(),
            Self::PasswordMismatch => "The two password fields didn't match.".to_string(),
            Self::InvalidToken => {
                "This link is invalid or has expired. Please request a new one.".to_string()
            }
            Self::Repository(_) | Self::PasswordHash => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}
