//! Star rating attached to a product review.

use serde::{Deserialize, Serialize};

/// Error returned for a rating outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between 1 and 5 (got {0})")]
pub struct RatingError(pub i64);

/// A review rating of one to five stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Rating(u8);

impl Rating {
    /// Lowest allowed rating.
    pub const MIN: u8 = 1;
    /// Highest allowed rating.
    pub const MAX: u8 = 5;

    /// Validate a rating.
    ///
    /// # Errors
    ///
    /// Returns `RatingError` when `stars` is outside `1..=5`.
    pub fn new(stars: i64) -> Result<Self, RatingError> {
        u8::try_from(stars)
            .ok()
            .filter(|s| (Self::MIN..=Self::MAX).contains(s))
            .map(Self)
            .ok_or(RatingError(stars))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }

    /// Human label, e.g. "1 Star" or "4 Stars".
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            1 => "1 Star",
            2 => "2 Stars",
            3 => "3 Stars",
            4 => "4 Stars",
            _ => "5 Stars",
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

/// Mean of a set of ratings, `0.0` when there are none.
#[must_use]
pub fn average_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: u32 = ratings.iter().map(|r| u32::from(r.0)).sum();
    #[allow(clippy::cast_precision_loss)] // review counts are tiny
    let count = ratings.len() as f64;
    f64::from(total) / count
}
