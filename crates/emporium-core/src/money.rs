//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Form input "19.90" parsed as f64 and summed over a report:             │
//! │    19.90 + 0.10 = 19.999999999999996  ❌                                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "19.90" ──parse──► 1990 cents ──store──► INTEGER column              │
//! │    Display only converts back at the edge: 1990 → "19.90"               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use emporium_core::money::Money;
//!
//! let price: Money = "19,90".parse().unwrap();
//! assert_eq!(price.cents(), 1990);
//! assert_eq!((price * 3).to_string(), "59.70");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::validation::{validate_amount_cents, ValidationResult};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos/cents).
///
/// Signed so that differences (report discrepancies) can be represented;
/// entity validation rejects negative prices and totals. Arithmetic
/// saturates at the `i64` bounds instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::money::Money;
    ///
    /// let line = Money::from_cents(299).multiply_quantity(3);
    /// assert_eq!(line.cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

/// Turns a price typed into a form into cents.
///
/// Rejects anything that is not a non-negative amount within
/// [`MAX_AMOUNT_CENTS`](crate::validation::MAX_AMOUNT_CENTS).
///
/// ## Example
/// ```rust
/// use emporium_core::money::parse_price_cents;
///
/// assert_eq!(parse_price_cents("18,90").unwrap(), 1890);
/// assert!(parse_price_cents("-1").is_err());
/// ```
pub fn parse_price_cents(text: &str) -> ValidationResult<i64> {
    let cents = text.parse::<Money>()?.cents();
    validate_amount_cents("price", cents)?;
    Ok(cents)
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal amount as typed into a form.
///
/// ## Accepted Input
/// - Either `.` or `,` as the decimal separator: `"12.5"`, `"12,50"`
/// - At most two fractional digits
/// - An optional leading `-` (the entity layer decides whether it is allowed)
/// - Surrounding whitespace is ignored
///
/// Anything else is a `ValidationError::InvalidFormat` on `price`.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(ValidationError::required("price"));
        }

        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let (whole, fraction) = match digits.split_once(['.', ',']) {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty())
            || !all_digits(whole)
            || !all_digits(fraction)
        {
            return Err(ValidationError::invalid("price", format!("'{raw}' is not a number")));
        }
        if fraction.len() > 2 {
            return Err(ValidationError::invalid(
                "price",
                "at most two decimal places are allowed",
            ));
        }

        let overflow = || ValidationError::invalid("price", "amount is too large");
        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let minor: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| overflow())? * 10,
            _ => fraction.parse().map_err(|_| overflow())?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal with two places and no currency symbol ("1234.50").
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
