//! Order pricing rules.
//!
//! All currency amounts are [`Decimal`] in major units. The storefront runs
//! a single-currency deployment; conversion to the gateway's minor units
//! happens at the payment boundary, not here.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Tax rate applied to the item subtotal (15%).
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Item subtotal above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);

/// Flat shipping charge below the free-shipping threshold.
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// The server-computed price breakdown of an order.
///
/// Totals are always derived from authoritative product prices; amounts a
/// client sends alongside an order request are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of unit price x quantity over all line items.
    pub items_price: Decimal,
    /// Tax on the item subtotal.
    pub tax_price: Decimal,
    /// Flat rate, or zero above the free-shipping threshold.
    pub shipping_price: Decimal,
    /// Grand total: items + tax + shipping.
    pub total_price: Decimal,
}

impl OrderTotals {
    /// Compute the breakdown for `(unit_price, qty)` line items.
    ///
    /// Shipping is free only when the item subtotal strictly exceeds
    /// [`FREE_SHIPPING_THRESHOLD`]; a subtotal of exactly that amount still
    /// pays [`FLAT_SHIPPING`].
    #[must_use]
    pub fn compute(lines: impl IntoIterator<Item = (Decimal, i32)>) -> Self {
        let items_price: Decimal = lines
            .into_iter()
            .map(|(unit_price, qty)| unit_price * Decimal::from(qty))
            .sum::<Decimal>()
            .round_dp(2);

        let tax_price = (items_price * TAX_RATE)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING
        };

        let total_price = items_price + tax_price + shipping_price;

        Self {
            items_price,
            tax_price,
            shipping_price,
            total_price,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_breakdown_below_free_shipping() {
        // 2 x 500 = 1000, below the threshold: flat shipping applies.
        let totals = OrderTotals::compute([(dec("500"), 2)]);
        assert_eq!(totals.items_price, dec("1000.00"));
        assert_eq!(totals.shipping_price, dec("100.00"));
        assert_eq!(totals.tax_price, dec("150.00"));
        assert_eq!(totals.total_price, dec("1250.00"));
    }

    #[test]
    fn test_free_shipping_above_threshold() {
        let totals = OrderTotals::compute([(dec("1200.50"), 2)]);
        assert_eq!(totals.items_price, dec("2401.00"));
        assert_eq!(totals.shipping_price, dec("0.00"));
        assert_eq!(totals.total_price, dec("2401.00") + totals.tax_price);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // Exactly 2000 still pays shipping.
        let totals = OrderTotals::compute([(dec("1000"), 2)]);
        assert_eq!(totals.items_price, dec("2000.00"));
        assert_eq!(totals.shipping_price, dec("100.00"));
    }

    #[test]
    fn test_multiple_lines_sum() {
        let totals = OrderTotals::compute([(dec("199.99"), 1), (dec("49.50"), 3)]);
        assert_eq!(totals.items_price, dec("348.49"));
        // 15% of 348.49 = 52.2735, rounds half-away-from-zero to 52.27
        assert_eq!(totals.tax_price, dec("52.27"));
        assert_eq!(totals.total_price, dec("500.76"));
    }

    #[test]
    fn test_empty_lines_zero() {
        let totals = OrderTotals::compute(std::iter::empty::<(Decimal, i32)>());
        assert_eq!(totals.items_price, Decimal::ZERO);
        assert_eq!(totals.tax_price, dec("0.00"));
        // An empty order never reaches pricing, but the math stays total.
        assert_eq!(totals.shipping_price, dec("100.00"));
    }

    #[test]
    fn test_constants() {
        assert_eq!(TAX_RATE, dec("0.15"));
        assert_eq!(FREE_SHIPPING_THRESHOLD, dec("2000"));
        assert_eq!(FLAT_SHIPPING, dec("100"));
    }
}
