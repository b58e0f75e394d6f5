//! Amount type for handling human-entered monetary values.
//!
//! Cells in the source spreadsheets carry currency noise: dollar signs,
//! thousands separators, stray whitespace, and sometimes nothing at all.
//! `Amount` wraps `Decimal` with a lossy parser: anything that cannot be
//! read as a number is zero. Blank cells mean "no money moved", not "error",
//! so parsing never fails.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// A signed currency amount.
///
/// Equality and ordering compare the numeric value. Formatting is canonical
/// (`$1,234.56`) regardless of how the source cell was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parses a cell that may contain currency noise. Never fails.
    ///
    /// Keeps digits, a single leading minus sign, and the first decimal
    /// point; strips everything else (currency symbols, commas, text). An
    /// empty or unreadable cell yields exactly zero.
    pub fn parse_lossy(raw: &str) -> Self {
        let mut cleaned = String::with_capacity(raw.len());
        let mut seen_digit = false;
        let mut seen_point = false;
        let mut negative = false;
        for c in raw.trim().chars() {
            match c {
                '0'..='9' => {
                    seen_digit = true;
                    cleaned.push(c);
                }
                '.' if !seen_point => {
                    seen_point = true;
                    cleaned.push(c);
                }
                '-' if !seen_digit => negative = true,
                _ => {}
            }
        }
        let Ok(mut value) = Decimal::from_str(&cleaned) else {
            return Self::ZERO;
        };
        if negative {
            value.set_sign_negative(true);
        }
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// The amount rounded to the nearest whole currency unit, half away from
    /// zero. Used only at the display/summary boundary.
    pub fn rounded(&self) -> i64 {
        self.0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or_default()
    }

    /// Zero if the amount is negative, otherwise the amount unchanged.
    pub fn clamp_zero(&self) -> Self {
        if self.is_negative() {
            Self::ZERO
        } else {
            *self
        }
    }

    /// Canonical storage representation: the bare decimal with trailing
    /// zeros stripped, e.g. `-1234.56`. Natural keys compare this text in
    /// the store, so `45` and `45.00` must store identically.
    pub fn to_storage(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, magnitude) = if self.is_negative() {
            ("-", self.0.abs())
        } else {
            ("", self.0)
        };
        write!(
            f,
            "{sign}${}",
            format_num::format_num!(",.2", magnitude.to_f64().unwrap_or_default())
        )
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_storage())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Amount::parse_lossy(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_dollar_and_commas() {
        assert_eq!(Amount::parse_lossy("$1,234.56").value(), dec("1234.56"));
    }

    #[test]
    fn test_parse_blank_is_zero() {
        assert_eq!(Amount::parse_lossy("").value(), Decimal::ZERO);
        assert_eq!(Amount::parse_lossy("   ").value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(Amount::parse_lossy("abc").value(), Decimal::ZERO);
        assert_eq!(Amount::parse_lossy("n/a").value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_negative_sign_preserved() {
        assert_eq!(Amount::parse_lossy("-12.50").value(), dec("-12.50"));
        assert_eq!(Amount::parse_lossy("-$50.00").value(), dec("-50.00"));
    }

    #[test]
    fn test_interior_dash_is_not_a_sign() {
        assert_eq!(Amount::parse_lossy("12-50").value(), dec("1250"));
    }

    #[test]
    fn test_second_decimal_point_ignored() {
        assert_eq!(Amount::parse_lossy("1.2.3").value(), dec("1.23"));
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(Amount::parse_lossy("1234.5").to_string(), "$1,234.50");
        assert_eq!(Amount::parse_lossy("-50").to_string(), "-$50.00");
    }

    #[test]
    fn test_rounded_half_away_from_zero() {
        assert_eq!(Amount::parse_lossy("2.5").rounded(), 3);
        assert_eq!(Amount::parse_lossy("-2.5").rounded(), -3);
        assert_eq!(Amount::parse_lossy("2.4").rounded(), 2);
    }

    #[test]
    fn test_clamp_zero() {
        assert_eq!(Amount::parse_lossy("-3").clamp_zero(), Amount::ZERO);
        let positive = Amount::parse_lossy("3");
        assert_eq!(positive.clamp_zero(), positive);
    }

    #[test]
    fn test_sum() {
        let total: Amount = ["1.10", "2.20", "3.30"]
            .iter()
            .map(|s| Amount::parse_lossy(s))
            .sum();
        assert_eq!(total.value(), dec("6.60"));
    }

    #[test]
    fn test_serde_round_trip() {
        let amount = Amount::parse_lossy("-1234.56");
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"-1234.56\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
