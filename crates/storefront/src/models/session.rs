//! Session-related types.

use serde::{Deserialize, Serialize};

use wendy_woo_core::{Email, UserId};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address (also their username).
    pub email: Email,
    /// First name for greetings.
    pub first_name: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart mapping (product ID string to quantity).
    pub const CART: &str = "cart";

    /// Key for the cached cart item count.
    pub const CART_COUNT: &str = "cart_count";

    /// Key for the cached cart total in yen.
    pub const CART_TOTAL: &str = "cart_total";
}
