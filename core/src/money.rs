//! Cents-backed money type.
//!
//! All cart pricing is integer cents. Arithmetic saturates rather than
//! wrapping so the pricing calculator never fails for valid numeric inputs.

use serde::{Deserialize, Serialize};

/// Monetary amount in cents.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars.
    ///
    /// Saturates at `u64::MAX` cents on overflow.
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, saturating on overflow.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Multiplies by a count, saturating on overflow.
    #[must_use]
    pub const fn saturating_mul(self, count: u64) -> Self {
        Self(self.0.saturating_mul(count))
    }

    /// Scales by `numerator / denominator`, rounding half up.
    ///
    /// Used for period normalization (e.g. a weekly rate charged for three
    /// days is `rate * 3 / 7`). A zero denominator returns the amount
    /// unchanged rather than dividing.
    #[must_use]
    pub fn prorate(self, numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            return self;
        }
        let scaled = u128::from(self.0) * u128::from(numerator) + u128::from(denominator / 2);
        let cents = scaled / u128::from(denominator);
        Self(u64::try_from(cents).unwrap_or(u64::MAX))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_dollars_is_cents() {
        assert_eq!(Money::from_dollars(70).cents(), 7000);
    }

    #[test]
    fn saturating_add_caps_at_max() {
        let max = Money::from_cents(u64::MAX);
        assert_eq!(max.saturating_add(Money::from_cents(1)), max);
    }

    #[test]
    fn prorate_rounds_half_up() {
        // 70 dollars * 3 / 7 = 30 dollars exactly
        assert_eq!(
            Money::from_dollars(70).prorate(3, 7),
            Money::from_dollars(30)
        );
        // 100 cents * 1 / 3 = 33.33 -> 33
        assert_eq!(Money::from_cents(100).prorate(1, 3), Money::from_cents(33));
        // 100 cents * 1 / 2 rounds 50 exactly
        assert_eq!(Money::from_cents(100).prorate(1, 2), Money::from_cents(50));
        // 5 cents * 1 / 2 = 2.5 -> 3
        assert_eq!(Money::from_cents(5).prorate(1, 2), Money::from_cents(3));
    }

    #[test]
    fn prorate_zero_denominator_is_identity() {
        let m = Money::from_cents(123);
        assert_eq!(m.prorate(5, 0), m);
    }

    #[test]
    fn sum_folds_totals() {
        let total: Money = [Money::from_cents(10), Money::from_cents(32)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(42));
    }

    #[test]
    fn display_formats_dollars_and_cents() {
        assert_eq!(Money::from_cents(7005).to_string(), "$70.05");
    }
}
