//! Percentage discount applied to a product's unit price.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Discount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    /// The percentage is below 0 or above 100.
    #[error("discount must be between 0 and 100 (got {0})")]
    OutOfRange(Decimal),
}

/// A discount percentage in the inclusive range `0..=100`.
///
/// A zero discount is valid and prices exactly like no discount at all.
///
/// ```
/// use bodegon_core::Discount;
/// use rust_decimal::Decimal;
///
/// assert!(Discount::new(Decimal::from(20)).is_ok());
/// assert!(Discount::new(Decimal::from(101)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Discount(Decimal);

impl Discount {
    /// Create a discount from a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::OutOfRange`] outside `0..=100`.
    pub fn new(percent: Decimal) -> Result<Self, DiscountError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(DiscountError::OutOfRange(percent));
        }
        Ok(Self(percent))
    }

    /// The percentage value.
    #[must_use]
    pub const fn percent(self) -> Decimal {
        self.0
    }

    /// Whether this discount leaves the price unchanged.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Discount {
    type Error = DiscountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Discount> for Decimal {
    fn from(discount: Discount) -> Self {
        discount.0
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Discount::new(Decimal::ZERO).is_ok());
        assert!(Discount::new(Decimal::ONE_HUNDRED).is_ok());
        assert!(Discount::new(Decimal::new(-1, 2)).is_err());
        assert!(Discount::new(Decimal::new(10001, 2)).is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let ok: Discount = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(ok.percent(), Decimal::new(125, 1));
        assert!(serde_json::from_str::<Discount>("\"150\"").is_err());
    }
}
