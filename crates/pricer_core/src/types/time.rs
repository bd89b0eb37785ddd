//! Calendar types for simulation grids.
//!
//! This module provides:
//! - `Date`: Type-safe date wrapper around chrono::NaiveDate
//! - `Tenor`: Calendar period such as `1W`, `3M` or `10Y`
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::time::{Date, Tenor};
//!
//! let today = Date::from_ymd(2024, 1, 31).unwrap();
//! let tenor: Tenor = "1M".parse().unwrap();
//!
//! // Month arithmetic clamps to the end of the target month
//! assert_eq!(today + tenor, Date::from_ymd(2024, 2, 29).unwrap());
//! ```

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use super::error::DateError;

/// Type-safe date wrapper around chrono::NaiveDate.
///
/// Ordered, hashable and `Copy`; displayed and parsed as ISO 8601.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::Date;
///
/// let date = Date::from_ymd(2024, 6, 15).unwrap();
/// let parsed: Date = "2024-06-15".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// let later = date.add_days(10);
/// assert_eq!(later - date, 10);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month, and day components.
    ///
    /// # Errors
    ///
    /// Returns `DateError::InvalidDate` if the components do not form a
    /// calendar date (e.g. February 30th).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses a date from ISO 8601 format (YYYY-MM-DD).
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError(e.to_string()))
    }

    /// Returns the underlying NaiveDate.
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Returns the year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the date `days` calendar days later.
    ///
    /// Saturates at chrono's maximum representable date.
    pub fn add_days(self, days: u64) -> Self {
        Date(self.0.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX))
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl Sub for Date {
    type Output = i64;

    /// Returns the number of days between two dates.
    fn sub(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl Add<Tenor> for Date {
    type Output = Date;

    fn add(self, tenor: Tenor) -> Date {
        tenor.advance(self)
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, DateError> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    /// Formats the date as ISO 8601 (YYYY-MM-DD).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Unit of a [`Tenor`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TenorUnit {
    /// Calendar days
    Days,
    /// Weeks of seven calendar days
    Weeks,
    /// Calendar months (end-of-month clamped)
    Months,
    /// Calendar years (twelve months)
    Years,
}

impl TenorUnit {
    /// Returns the single-letter code used in tenor strings.
    pub fn code(&self) -> char {
        match self {
            TenorUnit::Days => 'D',
            TenorUnit::Weeks => 'W',
            TenorUnit::Months => 'M',
            TenorUnit::Years => 'Y',
        }
    }
}

/// Calendar period used to place grid and close-out dates.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::{Tenor, TenorUnit};
///
/// let mpor = Tenor::parse("2W").unwrap();
/// assert_eq!(mpor, Tenor::new(2, TenorUnit::Weeks));
/// assert_eq!(mpor.to_string(), "2W");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tenor {
    length: u32,
    unit: TenorUnit,
}

impl Tenor {
    /// Creates a tenor of `length` units.
    pub fn new(length: u32, unit: TenorUnit) -> Self {
        Self { length, unit }
    }

    /// Tenor of `n` calendar days.
    pub fn days(n: u32) -> Self {
        Self::new(n, TenorUnit::Days)
    }

    /// Returns the number of units.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Returns the unit.
    pub fn unit(&self) -> TenorUnit {
        self.unit
    }

    /// Parses tenors of the form `<n><D|W|M|Y>` (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, DateError> {
        let trimmed = s.trim();
        let invalid = || DateError::InvalidTenor(s.to_string());

        let unit_char = trimmed.chars().last().ok_or_else(invalid)?;
        let unit = match unit_char.to_ascii_uppercase() {
            'D' => TenorUnit::Days,
            'W' => TenorUnit::Weeks,
            'M' => TenorUnit::Months,
            'Y' => TenorUnit::Years,
            _ => return Err(invalid()),
        };
        let length = trimmed[..trimmed.len() - unit_char.len_utf8()]
            .parse::<u32>()
            .map_err(|_| invalid())?;

        Ok(Self { length, unit })
    }

    /// Moves `date` forward by this tenor.
    pub fn advance(&self, date: Date) -> Date {
        let inner = date.into_inner();
        let advanced = match self.unit {
            TenorUnit::Days => inner.checked_add_days(Days::new(u64::from(self.length))),
            TenorUnit::Weeks => inner.checked_add_days(Days::new(7 * u64::from(self.length))),
            TenorUnit::Months => inner.checked_add_months(Months::new(self.length)),
            TenorUnit::Years => inner.checked_add_months(Months::new(12 * self.length)),
        };
        Date(advanced.unwrap_or(NaiveDate::MAX))
    }
}

impl FromStr for Tenor {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, DateError> {
        Tenor::parse(s)
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.length, self.unit.code())
    }
}
