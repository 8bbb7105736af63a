//! Domain models for the storefront.

pub mod catalog;
pub mod enquiry;
pub mod session;
pub mod user;

pub use catalog::{Category, CategoryWithProducts, NewProduct, NewReview, Product, Review};
pub use enquiry::{Enquiry, InquiryType, UploadedPhoto};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{TokenPurpose, User};
