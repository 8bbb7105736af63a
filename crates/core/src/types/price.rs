//! Type-safe price representation.
//!
//! Prices in the shop are whole yen: the currency has no minor unit, so the
//! amount is a plain integer and arithmetic is exact.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Serialize};

/// An amount of money in yen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a price from a yen amount.
    #[must_use]
    pub const fn new(yen: i64) -> Self {
        Self(yen)
    }

    /// Get the amount in yen.
    #[must_use]
    pub const fn yen(&self) -> i64 {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates instead of overflowing.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Price {
    fn from(yen: i64) -> Self {
        Self(yen)
    }
}

/// Formats as `¥1200`.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "¥{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let yen = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(yen))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times() {
        assert_eq!(Price::new(500).times(2), Price::new(1000));
        assert_eq!(Price::new(500).times(0), Price::ZERO);
    }

    #[test]
    fn test_times_saturates() {
        assert_eq!(Price::new(i64::MAX).times(2), Price::new(i64::MAX));
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::new(1000), Price::new(1200)].into_iter().sum();
        assert_eq!(total, Price::new(2200));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::new(800).to_string(), "¥800");
    }
}
