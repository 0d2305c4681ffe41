//! Money amounts in Vietnamese dong.
//!
//! The marketplace prices everything in VND and the backend sends plain JSON
//! numbers, so `Money` is a thin wrapper over [`Decimal`] with the display
//! rules used across the dashboards (dot-grouped thousands, no fraction).

use core::fmt;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::RoundingStrategy;
use serde::{Deserialize, Serialize};

/// An amount of Vietnamese dong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dong.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from whole dong.
    #[must_use]
    pub fn from_dong(dong: i64) -> Self {
        Self(Decimal::from(dong))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Apply a percentage discount (0-100) and round to whole dong.
    #[must_use]
    pub fn discounted(&self, percent: Decimal) -> Self {
        let factor = (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED;
        Self((self.0 * factor).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Format with dot-grouped thousands, e.g. `45.000 VND`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} VND", group_thousands(self.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

fn group_thousands(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }

    if negative { format!("-{out}") } else { out }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_dong(0).display(), "0 VND");
        assert_eq!(Money::from_dong(950).display(), "950 VND");
        assert_eq!(Money::from_dong(45_000).display(), "45.000 VND");
        assert_eq!(Money::from_dong(1_234_567).display(), "1.234.567 VND");
        assert_eq!(Money::from_dong(-12_000).display(), "-12.000 VND");
    }

    #[test]
    fn test_deserializes_from_json_number() {
        let money: Money = serde_json::from_str("45000").unwrap();
        assert_eq!(money, Money::from_dong(45_000));

        let json = serde_json::to_string(&Money::from_dong(15_000)).unwrap();
        assert_eq!(json, "15000.0");
    }

    #[test]
    fn test_discounted() {
        let price = Money::from_dong(50_000);
        assert_eq!(price.discounted(Decimal::from(10)), Money::from_dong(45_000));
        assert_eq!(price.discounted(Decimal::ZERO), price);
        assert_eq!(price.discounted(Decimal::ONE_HUNDRED), Money::ZERO);
    }

    #[test]
    fn test_line_total() {
        assert_eq!(Money::from_dong(30_000) * 3, Money::from_dong(90_000));
        assert_eq!(
            Money::from_dong(1) + Money::from_dong(2),
            Money::from_dong(3)
        );
    }
}
