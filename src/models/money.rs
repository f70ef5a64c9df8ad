//! Money type for representing currency amounts
//!
//! Internally stores amounts in cents (i64), so sums and differences of
//! close amounts are exact and a zero difference really is zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Largest whole-unit amount `Money::parse` accepts
pub const MAX_UNITS: i64 = 1_000_000_000_000;

/// Represents a monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use controlclose::models::Money;
    /// let amount = Money::from_cents(1050); // 10.50
    /// assert_eq!(amount.to_string(), "10.50");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from whole units and cents
    pub const fn from_units_cents(units: i64, cents: i64) -> Self {
        Self(units * 100 + cents)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units portion (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Amount as a float, for spreadsheet-style exports only
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse a money amount from a string
    ///
    /// Accepts "10", "10.5", "10.50", "10,50", "-10.50", "€10.50" and
    /// "$10.50". More than two fractional digits is rejected, as is anything
    /// beyond `MAX_UNITS`.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        parse_amount(s, false)
    }

    /// Like `parse`, but extra fractional digits are rounded half away from
    /// zero to the nearest cent ("94.005" is 94.01)
    pub fn parse_rounded(s: &str) -> Result<Self, MoneyParseError> {
        parse_amount(s, true)
    }

    /// Parse an optional form field: blank input yields `None`
    pub fn parse_optional(s: &str) -> Result<Option<Self>, MoneyParseError> {
        if s.trim().is_empty() {
            Ok(None)
        } else {
            Self::parse(s).map(Some)
        }
    }

    /// Format with a currency symbol, e.g. `€12.50` or `-€3.00`
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!("-{}{}.{:02}", symbol, self.units().abs(), self.cents_part())
        } else {
            format!("{}{}.{:02}", symbol, self.units(), self.cents_part())
        }
    }

    /// Format with an explicit sign for non-negative amounts, e.g. `+1.50`
    pub fn format_signed(&self) -> String {
        if self.is_negative() {
            self.to_string()
        } else {
            format!("+{}", self)
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = if self.is_negative() {
            format!("-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            format!("{}.{:02}", self.units(), self.cents_part())
        };
        f.pad(&text)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> std::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

fn parse_amount(input: &str, round: bool) -> Result<Money, MoneyParseError> {
    let s = input.trim();

    let (negative, s) = match s.strip_prefix('-') {
        Some(stripped) => (true, stripped.trim_start()),
        None => (false, s),
    };

    let s = s
        .strip_prefix('€')
        .or_else(|| s.strip_prefix('$'))
        .unwrap_or(s)
        .trim();

    if s.is_empty() {
        return Err(MoneyParseError::Empty);
    }

    let invalid = || MoneyParseError::InvalidFormat(input.trim().to_string());

    let normalized = s.replace(',', ".");
    let (whole, frac) = match normalized.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (normalized.as_str(), ""),
    };

    if frac.contains('.') || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 2 && !round {
        return Err(MoneyParseError::TooPrecise(input.trim().to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || (whole.is_empty() && frac.is_empty()) {
        return Err(invalid());
    }

    let too_large = || MoneyParseError::TooLarge(input.trim().to_string());
    let units: i64 = if whole.is_empty() {
        0
    } else {
        // all digits, so a parse failure can only be overflow
        whole.parse().map_err(|_| too_large())?
    };
    if units > MAX_UNITS {
        return Err(too_large());
    }

    let digits = frac.as_bytes();
    let digit = |i: usize| digits.get(i).map_or(0, |d| i64::from(d - b'0'));
    let mut cents = digit(0) * 10 + digit(1);
    if digit(2) >= 5 {
        cents += 1;
    }

    let total = units * 100 + cents;
    if total > MAX_UNITS * 100 {
        return Err(too_large());
    }

    Ok(Money(if negative { -total } else { total }))
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    Empty,
    InvalidFormat(String),
    TooPrecise(String),
    TooLarge(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::Empty => write!(f, "Amount is empty"),
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            MoneyParseError::TooPrecise(s) => {
                write!(f, "Amount has more than two decimals: {}", s)
            }
            MoneyParseError::TooLarge(s) => write!(f, "Amount is too large: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents(1050);
        assert_eq!(m.cents(), 1050);
        assert_eq!(m.units(), 10);
        assert_eq!(m.cents_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(-100).to_string(), "-1.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(format!("{:>8}", Money::from_cents(5)), "    0.05");
    }

    #[test]
    fn test_format_with_symbol() {
        assert_eq!(Money::from_cents(9500).format_with_symbol("€"), "€95.00");
        assert_eq!(Money::from_cents(-100).format_with_symbol("€"), "-€1.00");
        assert_eq!(Money::from_cents(150).format_signed(), "+1.50");
        assert_eq!(Money::zero().format_signed(), "+0.00");
        assert_eq!(Money::from_cents(-150).format_signed(), "-1.50");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("€10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("$10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-10.50").unwrap().cents(), -1050);
        assert_eq!(Money::parse("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse("10,50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("0.05").unwrap().cents(), 5);
        assert_eq!(Money::parse(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse(" 2.5 ").unwrap().cents(), 250);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Money::parse(""), Err(MoneyParseError::Empty));
        assert_eq!(Money::parse("€"), Err(MoneyParseError::Empty));
        assert!(matches!(
            Money::parse("1.234"),
            Err(MoneyParseError::TooPrecise(_))
        ));
        assert!(matches!(
            Money::parse("abc"),
            Err(MoneyParseError::InvalidFormat(_))
        ));
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse(".").is_err());
    }

    #[test]
    fn test_parse_caps_huge_amounts() {
        assert!(matches!(
            Money::parse("92233720368547758"),
            Err(MoneyParseError::TooLarge(_))
        ));
        assert!(matches!(
            Money::parse("99999999999999999999999"),
            Err(MoneyParseError::TooLarge(_))
        ));
        assert_eq!(
            Money::parse("1000000000000").unwrap().cents(),
            MAX_UNITS * 100
        );
        assert!(Money::parse("1000000000000.01").is_err());
    }

    #[test]
    fn test_parse_rounded() {
        assert_eq!(Money::parse_rounded("94.005").unwrap().cents(), 9401);
        assert_eq!(Money::parse_rounded("94.004").unwrap().cents(), 9400);
        assert_eq!(Money::parse_rounded("-2,499").unwrap().cents(), -250);
        assert_eq!(Money::parse_rounded("0.999").unwrap().cents(), 100);
        assert_eq!(Money::parse_rounded("10.5").unwrap().cents(), 1050);
        assert!(Money::parse_rounded("abc").is_err());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max + Money::from_cents(1), max);
        assert_eq!(Money::from_cents(i64::MIN) - Money::from_cents(1), Money::from_cents(i64::MIN));
        assert_eq!((-Money::from_cents(i64::MIN)).cents(), i64::MAX);
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(Money::parse_optional("  ").unwrap(), None);
        assert_eq!(
            Money::parse_optional("3").unwrap(),
            Some(Money::from_cents(300))
        );
        assert!(Money::parse_optional("x").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!((b - a).abs().cents(), 500);
    }

    #[test]
    fn test_sum() {
        let amounts = vec![
            Money::from_cents(100),
            Money::from_cents(200),
            Money::from_cents(300),
        ];
        let by_ref: Money = amounts.iter().sum();
        let total: Money = amounts.into_iter().sum();
        assert_eq!(total.cents(), 600);
        assert_eq!(by_ref, total);
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");
    }
}
