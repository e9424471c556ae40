//! Utils

use rust_decimal::RoundingStrategy;
use rusty_money::{Money, iso::Currency};

use crate::pricing::decimal_from_minor_units;

/// Options for [`format_price`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFormat {
    /// Show the minor units (`$150.00`) or round to whole units (`$150`)
    pub show_cents: bool,
}

impl Default for PriceFormat {
    fn default() -> Self {
        Self { show_cents: true }
    }
}

/// Formats money the way the storefront displays it: symbol first, with
/// thousands separators (`$1,500.00`).
///
/// Without cents, amounts round half away from zero (`$149.50` → `$150`).
pub fn format_price(price: &Money<'static, Currency>, format: PriceFormat) -> String {
    let currency = price.currency();
    let places = if format.show_cents { currency.exponent } else { 0 };

    let amount = decimal_from_minor_units(price.to_minor_units(), currency)
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = amount.abs().to_string();
    let (whole, fraction) = digits
        .split_once('.')
        .map_or((digits.as_str(), None), |(whole, fraction)| {
            (whole, Some(fraction))
        });

    let mut formatted = format!("{sign}{}{}", currency.symbol, group_thousands(whole));

    if let Some(fraction) = fraction {
        formatted.push('.');
        formatted.push_str(fraction);
    }

    formatted
}

fn group_thousands(digits: &str) -> String {
    let len = digits.chars().count();
    let mut grouped = String::with_capacity(len + len / 3);

    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (len - position) % 3 == 0 {
            grouped.push(',');
        }

        grouped.push(digit);
    }

    grouped
}

/// Shortens `text` to at most `max_chars` characters followed by `...`.
///
/// Text that already fits is returned unchanged. Whitespace left at the cut
/// is trimmed before the ellipsis.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars).collect();

    format!("{}...", kept.trim())
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{EUR, JPY, USD};

    use super::*;

    const CENTS: PriceFormat = PriceFormat { show_cents: true };
    const WHOLE: PriceFormat = PriceFormat { show_cents: false };

    #[test]
    fn formats_with_cents_and_separators() {
        assert_eq!(format_price(&Money::from_minor(150_000, USD), CENTS), "$1,500.00");
        assert_eq!(format_price(&Money::from_minor(500, USD), CENTS), "$5.00");
        assert_eq!(format_price(&Money::from_minor(0, USD), CENTS), "$0.00");
        assert_eq!(
            format_price(&Money::from_minor(123_456_789, USD), CENTS),
            "$1,234,567.89"
        );
    }

    #[test]
    fn formats_whole_units() {
        assert_eq!(format_price(&Money::from_minor(15000, USD), WHOLE), "$150");
        assert_eq!(format_price(&Money::from_minor(14950, USD), WHOLE), "$150");
        assert_eq!(format_price(&Money::from_minor(14949, USD), WHOLE), "$149");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_price(&Money::from_minor(-1250, USD), CENTS), "-$12.50");
    }

    #[test]
    fn formats_other_currencies() {
        assert_eq!(format_price(&Money::from_minor(1500, JPY), CENTS), "¥1,500");
        assert_eq!(format_price(&Money::from_minor(250, EUR), CENTS), "€2.50");
    }

    #[test]
    fn default_format_shows_cents() {
        assert_eq!(PriceFormat::default(), CENTS);
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_text("Balloon Arch", 12), "Balloon Arch");
        assert_eq!(truncate_text("", 0), "");
    }

    #[test]
    fn truncate_trims_before_ellipsis() {
        assert_eq!(truncate_text("Single balloon arch", 7), "Single...");
        assert_eq!(truncate_text("Single balloon arch", 10), "Single bal...");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_text("Café crème", 4), "Café...");
    }
}
