//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Product lookup trait implemented by the database layer
//! - `cart` - Session cart engine (add, set quantity, remove, totals)
//! - `auth` - Password accounts with emailed verification and reset links
//! - `email` - Transactional email via SMTP, or the log when unconfigured
//! - `uploads` - Photo validation and storage for reviews and enquiries

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod email;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use cart::{CartEngine, CartError};
pub use catalog::Catalog;
pub use email::{EmailError, EmailService};
pub use uploads::UploadError;
