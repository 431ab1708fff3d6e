//! Price parsing and the variant price-bound predicate used by catalog filters.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Largest value that fits a `NUMERIC(10,2)` column.
// 99_999_999.99, i.e. 9_999_999_999 * 10^-2 split into 32-bit limbs.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Parse a user-supplied price.
///
/// Accepts `"12.50"`, `"12,50"` and surrounding whitespace. Returns `None`
/// for anything unparsable, negative or too large for storage. The result is
/// rounded to two decimal places.
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };
    let value = Decimal::from_str(&normalized).ok()?.round_dp(2);
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    if value > MAX_PRICE {
        return None;
    }
    Some(value)
}

/// Price bounds for a product listing.
///
/// `min` and `max` are evaluated independently against the product's
/// variants: the product passes when *some* variant is `>= min` and *some*
/// (possibly different) variant is `<= max`. Variants priced `[10, 90]`
/// pass `min = 80, max = 20` even though no single variant lies in range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceBounds {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceBounds {
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// In-memory form of the storage-side price filter.
#[must_use]
pub fn passes_price_bounds(variant_prices: &[Decimal], bounds: PriceBounds) -> bool {
    let min_ok = bounds
        .min
        .is_none_or(|min| variant_prices.iter().any(|p| *p >= min));
    let max_ok = bounds
        .max
        .is_none_or(|max| variant_prices.iter().any(|p| *p <= max));
    min_ok && max_ok
}
