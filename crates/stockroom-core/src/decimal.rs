//! # Decimal Module
//!
//! Provides the `Decimal` type: an exact fixed-point number with two
//! fractional digits and at most ten digits in total.
//!
//! ## Why Integer Hundredths?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Prices, reorder levels and stock quantities are all NUMERIC(10, 2):   │
//! │    12.50 kg  →  1250 hundredths                                        │
//! │    99999999.99 is the largest value, -99999999.99 the smallest         │
//! │                                                                         │
//! │  Stored as INTEGER hundredths, so SQLite never rounds anything.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::decimal::Decimal;
//!
//! let qty: Decimal = "12.5".parse().unwrap();
//! assert_eq!(qty.hundredths(), 1250);
//! assert_eq!(qty.to_string(), "12.50");
//!
//! let total = qty + Decimal::from_whole(3);
//! assert_eq!(total.to_string(), "15.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Total number of significant digits a stored decimal may carry.
pub const MAX_DIGITS: u32 = 10;

/// Number of digits after the decimal point.
pub const DECIMAL_PLACES: u32 = 2;

/// Largest magnitude representable in hundredths (`99_999_999.99`).
pub const MAX_HUNDREDTHS: i64 = 9_999_999_999;

// =============================================================================
// Decimal Type
// =============================================================================

/// Fixed-point decimal stored as a count of hundredths.
///
/// ## Design Decisions
/// - **i64 (signed)**: stock adjustments may be negative
/// - **Single field tuple struct**: zero-cost over i64, stored as INTEGER
/// - **Range is not enforced on construction**: arithmetic may leave the
///   10-digit range; [`Decimal::check_precision`] and the column CHECK
///   constraint reject such values before they are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Decimal(i64);

impl Decimal {
    /// Creates a decimal from a count of hundredths.
    ///
    /// ```rust
    /// use stockroom_core::decimal::Decimal;
    ///
    /// assert_eq!(Decimal::from_hundredths(1099).to_string(), "10.99");
    /// ```
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Decimal(hundredths)
    }

    /// Creates a decimal with no fractional part.
    #[inline]
    pub const fn from_whole(whole: i64) -> Self {
        Decimal(whole * 100)
    }

    /// Returns the value in hundredths.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Returns the integer portion, truncated towards zero.
    #[inline]
    pub const fn whole_part(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the fractional digits (always 0-99).
    #[inline]
    pub const fn fraction_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Decimal(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Whether the value fits NUMERIC(10, 2).
    #[inline]
    pub const fn fits_precision(&self) -> bool {
        self.0 >= -MAX_HUNDREDTHS && self.0 <= MAX_HUNDREDTHS
    }

    /// Returns an error naming `field` when the value does not fit
    /// NUMERIC(10, 2).
    ///
    /// ```rust
    /// use stockroom_core::decimal::Decimal;
    ///
    /// assert!(Decimal::from_hundredths(9_999_999_999).check_precision("quantity").is_ok());
    /// assert!(Decimal::from_hundredths(10_000_000_000).check_precision("quantity").is_err());
    /// ```
    pub fn check_precision(&self, field: &str) -> Result<(), ValidationError> {
        if self.fits_precision() {
            Ok(())
        } else {
            Err(ValidationError::ExceedsPrecision {
                field: field.to_string(),
                digits: MAX_DIGITS,
                places: DECIMAL_PLACES,
            })
        }
    }

    /// Addition that returns `None` on i64 overflow.
    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Decimal(v)),
            None => None,
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses `"12"`, `"12.5"`, `"-0.25"`, `"+3.10"`.
///
/// More than two fractional digits or more than eight integer digits is an
/// error; values are never rounded.
impl FromStr for Decimal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "decimal".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
            None => return Err(invalid("empty string")),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected digits with an optional '.'"));
        }
        if frac.len() > DECIMAL_PLACES as usize {
            return Err(ValidationError::ExceedsPrecision {
                field: "decimal".to_string(),
                digits: MAX_DIGITS,
                places: DECIMAL_PLACES,
            });
        }

        let whole = whole.trim_start_matches('0');
        if whole.len() > (MAX_DIGITS - DECIMAL_PLACES) as usize {
            return Err(ValidationError::ExceedsPrecision {
                field: "decimal".to_string(),
                digits: MAX_DIGITS,
                places: DECIMAL_PLACES,
            });
        }

        // At most 8 + 2 digits here, so i64 cannot overflow.
        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("integer part"))?
        };
        let frac_value: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("fraction"))? * 10,
            _ => frac.parse().map_err(|_| invalid("fraction"))?,
        };

        let magnitude = whole_value * 100 + frac_value;
        Ok(Decimal(if negative { -magnitude } else { magnitude }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Always prints two fractional digits: `12.50`, `-0.25`, `0.00`.
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.whole_part().abs(),
            self.fraction_part()
        )
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::zero()
    }
}

impl Add for Decimal {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Decimal(self.0 + other.0)
    }
}

impl AddAssign for Decimal {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Decimal {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Decimal(self.0 - other.0)
    }
}

impl SubAssign for Decimal {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Decimal {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Decimal(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
