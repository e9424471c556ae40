//! Pricing
//!
//! Cart aggregates and conversions between decimal amounts and minor units.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};

use crate::items::LineItem;

/// Calculates `Σ(price × quantity)` over the items, in the given currency.
///
/// An empty slice totals to zero. Arithmetic saturates rather than wrapping.
pub fn total_price(items: &[LineItem], currency: &'static Currency) -> Money<'static, Currency> {
    let minor = items.iter().fold(0_i64, |acc, item| {
        acc.saturating_add(item.line_total().to_minor_units())
    });

    Money::from_minor(minor, currency)
}

/// Calculates `Σ quantity` over the items.
pub fn total_quantity(items: &[LineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity())).sum()
}

/// Converts a major-unit decimal (e.g. `12.50`) into minor units (`1250`).
///
/// Returns `None` if the amount has more precision than the currency allows
/// or does not fit in an `i64`.
pub fn minor_units_from_decimal(amount: Decimal, currency: &Currency) -> Option<i64> {
    let scale = 10_i64.checked_pow(currency.exponent)?;
    let minor = amount.checked_mul(Decimal::from(scale))?;

    if !minor.fract().is_zero() {
        return None;
    }

    minor.to_i64()
}

/// Converts minor units back to an exact major-unit decimal.
pub fn decimal_from_minor_units(minor: i64, currency: &Currency) -> Decimal {
    Decimal::new(minor, currency.exponent)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rusty_money::iso::{JPY, USD};
    use testresult::TestResult;

    use crate::items::{LineItemKey, NewLineItem};

    use super::*;

    fn line(id: &str, minor: i64, quantity: u32) -> LineItem {
        LineItem::from_new(
            NewLineItem::new(LineItemKey::product(id), id, Money::from_minor(minor, USD)),
            quantity,
        )
    }

    #[test]
    fn total_price_sums_line_totals() {
        let items = [line("1", 15000, 2), line("2", 25000, 1)];

        assert_eq!(total_price(&items, USD), Money::from_minor(55000, USD));
        assert_eq!(total_quantity(&items), 3);
    }

    #[test]
    fn total_price_empty_is_zero() {
        assert_eq!(total_price(&[], USD), Money::from_minor(0, USD));
        assert_eq!(total_quantity(&[]), 0);
    }

    #[test]
    fn five_dollars_times_three_is_exact() {
        let items = [line("6", 500, 3)];

        assert_eq!(total_price(&items, USD).to_minor_units(), 1500);
    }

    #[test]
    fn minor_units_round_trip() -> TestResult {
        let amount = Decimal::from_str("12.50")?;

        assert_eq!(minor_units_from_decimal(amount, USD), Some(1250));
        assert_eq!(decimal_from_minor_units(1250, USD).to_string(), "12.50");

        Ok(())
    }

    #[test]
    fn minor_units_reject_excess_precision() -> TestResult {
        assert_eq!(minor_units_from_decimal(Decimal::from_str("1.005")?, USD), None);
        assert_eq!(minor_units_from_decimal(Decimal::from_str("1.5")?, JPY), None);

        Ok(())
    }
}
