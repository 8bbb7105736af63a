//! Contact form types.

use std::fmt;
use std::str::FromStr;

use wendy_woo_core::Email;

/// Maximum length of the enquirer's name.
pub const MAX_ENQUIRY_NAME_LENGTH: usize = 100;

/// Topic selected on the enquiry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryType {
    Orders,
    ProductIngredients,
    Others,
}

impl InquiryType {
    /// All topics in form order.
    pub const ALL: [Self; 3] = [Self::Orders, Self::ProductIngredients, Self::Others];

    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::ProductIngredients => "product_ingredients",
            Self::Others => "others",
        }
    }

    /// Human-readable label used in emails and the select box.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Orders => "Orders",
            Self::ProductIngredients => "Product Ingredients",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for InquiryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InquiryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown inquiry type: {s}"))
    }
}

/// A photo uploaded with a form, held in memory.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    /// Client-supplied file name.
    pub file_name: String,
    /// MIME type derived from the extension.
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// A validated enquiry.
#[derive(Debug, Clone)]
pub struct Enquiry {
    pub inquiry_type: InquiryType,
    pub name: String,
    pub email: Email,
    pub message: String,
    pub photo: Option<UploadedPhoto>,
}
