//! Fixed-point currency and discount arithmetic.
//!
//! Amounts are held in minor units (cents) and discounts in basis points
//! (hundredths of a percent), so `DECIMAL(10,2)` prices and `DECIMAL(5,2)`
//! discount percentages are represented exactly.

use std::fmt;
use std::iter::Sum;

use serde::{Serialize, Serializer};

/// Basis points in 100%.
pub const FULL_RATE_BP: u32 = 10_000;

/// A currency amount in minor units (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole currency units, e.g. `Money::from_major(5000)` is `5000.00`.
    pub const fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Multiply by a line quantity, `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Price after applying `rate`, rounded half-up to the cent.
    pub fn discounted(self, rate: DiscountRate) -> Money {
        let keep = i128::from(FULL_RATE_BP - rate.basis_points());
        let scaled = i128::from(self.0) * keep;
        let full = i128::from(FULL_RATE_BP);
        let rounded = if scaled >= 0 {
            (scaled + full / 2) / full
        } else {
            (scaled - full / 2) / full
        };
        Money(rounded as i64)
    }
}

/// Saturates at the `i64` bounds; use `checked_add` where overflow must be reported.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, amount| Money(acc.0.saturating_add(amount.0)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Serialized as a decimal string (`"10800.00"`), matching the wire format
/// of `DECIMAL` columns.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A discount percentage between 0 and 100, held in basis points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiscountRate(u32);

impl DiscountRate {
    pub const ZERO: DiscountRate = DiscountRate(0);

    pub fn from_basis_points(bp: u32) -> Option<Self> {
        (bp <= FULL_RATE_BP).then_some(Self(bp))
    }

    pub fn from_percent(percent: u32) -> Option<Self> {
        percent
            .checked_mul(100)
            .and_then(Self::from_basis_points)
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for DiscountRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
