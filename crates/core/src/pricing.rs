//! Order pricing rules.
//!
//! All amounts are [`Decimal`]s in the store currency. Results are rounded to
//! [`CURRENCY_SCALE`] fraction digits with midpoint-away-from-zero rounding
//! (`0.075` becomes `0.08`), the usual convention for receipts.
//!
//! Arithmetic is checked: a line or order total that leaves the storable
//! range is a [`PricingError`] rather than a panic.
//!
//! ```
//! use bodegon_core::{Discount, compute_item_total, compute_order_total};
//! use rust_decimal::Decimal;
//!
//! let rum = compute_item_total(Decimal::new(1500, 2), None, 2).unwrap();
//! let wine = compute_item_total(
//!     Decimal::from(100),
//!     Some(Discount::new(Decimal::from(20)).unwrap()),
//!     3,
//! )
//! .unwrap();
//! assert_eq!(rum, Decimal::new(3000, 2));
//! assert_eq!(wine, Decimal::new(24000, 2));
//! assert_eq!(compute_order_total([rum, wine]).unwrap(), Decimal::new(27000, 2));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::types::Discount;

/// Number of fraction digits kept on every computed amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Largest unit price a product may carry (`NUMERIC(10, 2)`).
pub const MAX_PRICE: Decimal = Decimal::from_parts(0x540B_E3FF, 0x2, 0, false, 2); // 9_999_999_999 / 10^2

/// Largest line or order total that can be stored (`NUMERIC(12, 2)`).
pub const MAX_TOTAL: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2); // 999_999_999_999 / 10^2

/// Errors from total computation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PricingError {
    /// The total does not fit the storable range.
    #[error("total exceeds the maximum of 9999999999.99")]
    Overflow,
}

/// Round an amount to the currency scale, padding to exactly two digits.
#[must_use]
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_SCALE);
    rounded
}

fn within_total_range(amount: Decimal) -> Result<Decimal, PricingError> {
    let amount = round_currency(amount);
    if amount > MAX_TOTAL {
        return Err(PricingError::Overflow);
    }
    Ok(amount)
}

/// Compute the total for one order line.
///
/// With no discount (or a zero discount) this is `unit_price * quantity`;
/// otherwise the discount percentage is taken off the unit price first.
///
/// Quantity is not validated here: callers reject non-positive quantities
/// before pricing.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the total exceeds [`MAX_TOTAL`].
pub fn compute_item_total(
    unit_price: Decimal,
    discount: Option<Discount>,
    quantity: i32,
) -> Result<Decimal, PricingError> {
    let unit = match discount {
        Some(discount) if !discount.is_zero() => unit_price
            .checked_mul(discount.percent())
            .and_then(|off| off.checked_div(Decimal::ONE_HUNDRED))
            .and_then(|off| unit_price.checked_sub(off))
            .ok_or(PricingError::Overflow)?,
        _ => unit_price,
    };
    let total = unit
        .checked_mul(Decimal::from(quantity))
        .ok_or(PricingError::Overflow)?;
    within_total_range(total)
}

/// Sum line totals into an order total. Zero for an empty order.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the sum exceeds [`MAX_TOTAL`].
pub fn compute_order_total<I>(item_totals: I) -> Result<Decimal, PricingError>
where
    I: IntoIterator<Item = Decimal>,
{
    let total = item_totals
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or(PricingError::Overflow)?;
    within_total_range(total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pct(n: i64) -> Option<Discount> {
        Some(Discount::new(Decimal::from(n)).unwrap())
    }

    #[test]
    fn test_item_total_without_discount() {
        let total = compute_item_total(Decimal::new(1500, 2), None, 2).unwrap();
        assert_eq!(total, Decimal::new(3000, 2));
    }

    #[test]
    fn test_item_total_with_discount() {
        let total = compute_item_total(Decimal::new(10000, 2), pct(20), 3).unwrap();
        assert_eq!(total, Decimal::new(24000, 2));
    }

    #[test]
    fn test_zero_discount_prices_like_none() {
        let price = Decimal::new(1999, 2);
        assert_eq!(
            compute_item_total(price, pct(0), 4).unwrap(),
            compute_item_total(price, None, 4).unwrap()
        );
    }

    #[test]
    fn test_full_discount_is_free() {
        assert_eq!(
            compute_item_total(Decimal::new(4250, 2), pct(100), 7).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_rounds_to_cents() {
        // 9.99 * 0.85 = 8.4915
        let total = compute_item_total(Decimal::new(999, 2), pct(15), 1).unwrap();
        assert_eq!(total, Decimal::new(849, 2));
        assert_eq!(total.scale(), 2);

        // 0.10 * 0.75 = 0.075, midpoint rounds away from zero
        let total = compute_item_total(Decimal::new(10, 2), pct(25), 1).unwrap();
        assert_eq!(total, Decimal::new(8, 2));
    }

    #[test]
    fn test_integral_prices_keep_two_digits() {
        let total = compute_item_total(Decimal::from(15), None, 2).unwrap();
        assert_eq!(total.to_string(), "30.00");
    }

    #[test]
    fn test_order_total_sums_items() {
        let total = compute_order_total([Decimal::new(3000, 2), Decimal::new(24000, 2)]).unwrap();
        assert_eq!(total, Decimal::new(27000, 2));
    }

    #[test]
    fn test_order_total_empty_is_zero() {
        assert_eq!(compute_order_total(Vec::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_item_total_at_limits() {
        let total = compute_item_total(MAX_PRICE, None, 100).unwrap();
        assert_eq!(total, Decimal::new(999_999_999_900, 2));
        assert_eq!(
            compute_item_total(MAX_PRICE, None, 1000),
            Err(PricingError::Overflow)
        );
    }

    #[test]
    fn test_item_total_never_panics_on_huge_amounts() {
        assert_eq!(
            compute_item_total(Decimal::MAX, None, 2),
            Err(PricingError::Overflow)
        );
        assert_eq!(
            compute_item_total(Decimal::MAX, pct(50), i32::MAX),
            Err(PricingError::Overflow)
        );
    }

    #[test]
    fn test_order_total_overflow() {
        assert_eq!(
            compute_order_total([MAX_TOTAL, Decimal::new(1, 2)]),
            Err(PricingError::Overflow)
        );
        assert_eq!(
            compute_order_total([Decimal::MAX, Decimal::MAX]),
            Err(PricingError::Overflow)
        );
    }
}
