//! Error types for calendar and grid construction.
//!
//! This module provides:
//! - `DateError`: Errors from date and tenor construction and parsing
//! - `DateGridError`: Errors from simulation grid construction

use thiserror::Error;

use super::time::Date;

/// Date-related errors.
///
/// # Examples
/// ```
/// use pricer_core::types::DateError;
///
/// let err = DateError::InvalidDate { year: 2024, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2024-2-30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Invalid date components (e.g., February 30th).
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Failed to parse date string.
    #[error("Date parse error: {0}")]
    ParseError(String),

    /// Tenor string not of the form `<n><D|W|M|Y>`.
    #[error("Invalid tenor: {0}")]
    InvalidTenor(String),
}

/// Simulation date grid errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateGridError {
    /// Dates are not strictly ascending.
    #[error("Date grid not strictly ascending at index {index}: {previous} followed by {date}")]
    NotAscending {
        /// Index of the offending date
        index: usize,
        /// Date preceding the offending date
        previous: Date,
        /// Offending date
        date: Date,
    },

    /// Flag vectors do not match the number of dates.
    #[error("Date grid flag count ({flags}) does not match date count ({dates})")]
    FlagLengthMismatch {
        /// Number of dates
        dates: usize,
        /// Number of flags
        flags: usize,
    },

    /// A date that is neither a valuation date nor a close-out date.
    #[error("Date {0} is neither a valuation date nor a close-out date")]
    UnflaggedDate(Date),

    /// Grid tenor could not be used.
    #[error(transparent)]
    Date(#[from] DateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_tenor() {
        let err = DateError::InvalidTenor("3X".to_string());
        assert_eq!(format!("{}", err), "Invalid tenor: 3X");
    }

    #[test]
    fn test_error_display_not_ascending() {
        let err = DateGridError::NotAscending {
            index: 1,
            previous: Date::from_ymd(2024, 2, 1).unwrap(),
            date: Date::from_ymd(2024, 1, 1).unwrap(),
        };
        assert_eq!(
            format!("{}", err),
            "Date grid not strictly ascending at index 1: 2024-02-01 followed by 2024-01-01"
        );
    }

    #[test]
    fn test_error_is_error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(DateGridError::FlagLengthMismatch {
            dates: 3,
            flags: 2,
        });
        assert!(err.to_string().contains("flag count"));
    }
}
