//! Exact decimal money type.
//!
//! # Motivation
//!
//! Cash balances, trade proceeds and position values are accumulated over
//! thousands of simulated days. Binary floating point drifts under that kind
//! of accumulation, so every monetary amount in this system is a
//! [`rust_decimal::Decimal`] wrapped in `Money`.
//!
//! `Money` wraps the raw `Decimal` so the type system prevents:
//! - Implicit construction from a bare number (no `From<Decimal>` impl).
//! - Mixing money with share counts or screening ratios in arithmetic.
//!
//! # Arithmetic
//!
//! - `Add`, `Sub`, `Neg`, `AddAssign`, `SubAssign` and `Sum` are closed over
//!   `Money`.
//! - `times_qty(qty)` multiplies a per-share price by an integer share count.
//! - `scale(factor)` multiplies by a dimensionless decimal (fee multipliers).
//! - `checked_div` / `ratio` never panic on a zero denominator; callers get
//!   `None` and must decide what a degenerate division means.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An exact monetary amount.
///
/// # Construction
///
/// Use [`Money::new`] for explicit construction. There is intentionally no
/// `From<Decimal>` implementation.
///
/// # Retrieval
///
/// Use [`Money::raw`] to extract the underlying `Decimal` when crossing a
/// layer boundary that needs a plain number (CSV output, return ratios).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero monetary amount.
    pub const ZERO: Money = Money(Decimal::ZERO);

    #[inline]
    pub const fn new(raw: Decimal) -> Self {
        Money(raw)
    }

    /// Construct from an integer amount of currency units.
    #[inline]
    pub fn from_units(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    #[inline]
    pub const fn raw(self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Multiply a per-share price by a share count.
    ///
    /// `qty` is a plain share count, not a Money value.
    #[inline]
    pub fn times_qty(self, qty: u64) -> Money {
        Money(self.0 * Decimal::from(qty))
    }

    /// Multiply by a dimensionless factor (e.g. `1 + buy_fee`).
    #[inline]
    pub fn scale(self, factor: Decimal) -> Money {
        Money(self.0 * factor)
    }

    /// Divide by another amount, yielding a dimensionless ratio.
    ///
    /// Returns `None` when `rhs` is zero.
    #[inline]
    pub fn ratio(self, rhs: Money) -> Option<Decimal> {
        self.0.checked_div(rhs.0)
    }

    /// Divide by a dimensionless decimal. Returns `None` when `rhs` is zero.
    #[inline]
    pub fn checked_div(self, rhs: Decimal) -> Option<Money> {
        self.0.checked_div(rhs).map(Money)
    }
}

impl Add for Money {
    type Output = Money;
    #[inline]
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    #[inline]
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    #[inline]
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_is_additive_identity() {
        let a = Money::new(dec!(42.5));
        assert_eq!(a + Money::ZERO, a);
        assert_eq!(Money::ZERO + a, a);
    }

    #[test]
    fn add_and_sub_roundtrip() {
        let a = Money::new(dec!(100));
        let b = Money::new(dec!(25.25));
        assert_eq!((a + b) - b, a);
    }

    #[test]
    fn decimal_tenths_do_not_drift() {
        // 0.1 summed ten times is exactly 1 in decimal, unlike f64.
        let total: Money = (0..10).map(|_| Money::new(dec!(0.1))).sum();
        assert_eq!(total, Money::from_units(1));
    }

    #[test]
    fn times_qty_and_scale() {
        let px = Money::new(dec!(12.5));
        assert_eq!(px.times_qty(200), Money::from_units(2_500));
        assert_eq!(
            Money::from_units(1_000).scale(dec!(1.001)),
            Money::new(dec!(1001))
        );
    }

    #[test]
    fn ratio_by_zero_is_none() {
        assert_eq!(Money::from_units(5).ratio(Money::ZERO), None);
        assert_eq!(Money::from_units(5).checked_div(Decimal::ZERO), None);
        assert_eq!(
            Money::from_units(5).ratio(Money::from_units(4)),
            Some(dec!(1.25))
        );
    }

    #[test]
    fn sign_helpers() {
        assert!(Money::new(dec!(-0.01)).is_negative());
        assert!(!Money::ZERO.is_negative());
        assert!(Money::new(dec!(0.01)).is_positive());
        assert!(Money::ZERO.is_zero());
    }

    #[test]
    fn display_normalizes_trailing_zeros() {
        assert_eq!(format!("{}", Money::new(dec!(1.500))), "1.5");
        assert_eq!(format!("{}", Money::new(dec!(-2.75))), "-2.75");
    }
}
