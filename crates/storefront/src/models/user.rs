//! User domain types.

use chrono::{DateTime, Utc};

use wendy_woo_core::{Email, UserId};

/// A storefront account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// Accounts stay inactive until the emailed link is followed.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name used in greetings: first name, or the email when blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            self.email.as_str()
        } else {
            &self.first_name
        }
    }
}

/// What an emailed account token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    VerifyEmail,
    PasswordReset,
}

impl TokenPurpose {
    /// Value stored in `account_token.purpose`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VerifyEmail => "verify_email",
            Self::PasswordReset => "password_reset",
        }
    }
}
