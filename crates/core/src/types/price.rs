//! Type-safe price representation using decimal arithmetic.
//!
//! Brightique sells in Indian rupees and displays whole-rupee amounts with
//! Indian digit grouping (`₹1,24,999`), so formatting lives here rather than
//! in every view.

use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A rupee amount.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Format for display with no fractional digits (e.g. `₹1,24,999`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = rounded.abs().trunc().to_string();
        let grouped = match self.currency_code {
            CurrencyCode::INR => group_indian(&digits),
            _ => group_thousands(&digits),
        };
        format!("{sign}{}{grouped}", self.currency_code.symbol())
    }
}

impl Add for Price {
    type Output = Self;

    /// Adds amounts. The left-hand currency wins; carts are single-currency.
    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(CurrencyCode::default()), Add::add)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

/// Group as `12,34,567`: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Group as `1,234,567`.
fn group_thousands(digits: &str) -> String {
    let mut groups = Vec::new();
    let mut rest = digits;
    while rest.len() > 3 {
        let (left, triple) = rest.split_at(rest.len() - 3);
        groups.push(triple);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();
    groups.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_small_amount() {
        assert_eq!(Price::inr(Decimal::new(999, 0)).display(), "₹999");
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(Price::inr(Decimal::new(124_999, 0)).display(), "₹1,24,999");
        assert_eq!(Price::inr(Decimal::new(1_234_567, 0)).display(), "₹12,34,567");
        assert_eq!(Price::inr(Decimal::new(1000, 0)).display(), "₹1,000");
    }

    #[test]
    fn test_display_rounds_to_whole_units() {
        assert_eq!(Price::inr(Decimal::new(129_950, 2)).display(), "₹1,300");
        assert_eq!(Price::inr(Decimal::new(129_949, 2)).display(), "₹1,299");
    }

    #[test]
    fn test_display_other_currency_uses_thousands() {
        let price = Price::new(Decimal::new(1_234_567, 0), CurrencyCode::USD);
        assert_eq!(price.display(), "$1,234,567");
    }

    #[test]
    fn test_times_and_sum() {
        let lamp = Price::inr(Decimal::new(2_500, 0));
        let shade = Price::inr(Decimal::new(750, 0));
        let total: Price = [lamp * 2, shade.times(3)].into_iter().sum();
        assert_eq!(total.amount, Decimal::new(7_250, 0));
        assert_eq!(total.currency_code, CurrencyCode::INR);
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let total: Price = std::iter::empty().sum();
        assert_eq!(total, Price::zero(CurrencyCode::INR));
        assert_eq!(total.display(), "₹0");
    }
}
