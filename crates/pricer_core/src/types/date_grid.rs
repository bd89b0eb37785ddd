//! Simulation date grid with valuation and close-out flags.
//!
//! A [`DateGrid`] is the ordered set of future dates a Monte Carlo
//! revaluation steps through. Each slot is a valuation date, a close-out
//! date (margin period of risk lookback), or both.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::{Date, DateGrid, Tenor};
//!
//! let today = Date::from_ymd(2024, 1, 1).unwrap();
//! let tenors: Vec<Tenor> = ["1M", "2M"].iter().map(|t| t.parse().unwrap()).collect();
//!
//! let mut grid = DateGrid::from_tenors(today, &tenors).unwrap();
//! grid.add_close_out_dates(Tenor::days(14));
//!
//! assert_eq!(grid.len(), 4);
//! assert_eq!(grid.valuation_dates().len(), 2);
//! assert_eq!(grid.close_out_dates().len(), 2);
//! ```

use super::error::DateGridError;
use super::time::{Date, Tenor};

/// Ordered simulation dates with per-slot valuation/close-out flags.
///
/// # Invariants
///
/// - Dates are strictly ascending.
/// - Every slot carries at least one flag.
/// - Flag vectors have the same length as the dates.
///
/// An empty grid is representable; consumers decide whether to accept it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DateGrid {
    dates: Vec<Date>,
    is_valuation_date: Vec<bool>,
    is_close_out_date: Vec<bool>,
}

impl DateGrid {
    /// Creates a grid where every date is a valuation date.
    ///
    /// # Errors
    ///
    /// Returns `DateGridError::NotAscending` if the dates are not strictly
    /// ascending.
    pub fn new(dates: Vec<Date>) -> Result<Self, DateGridError> {
        let n = dates.len();
        Self::with_flags(dates, vec![true; n], vec![false; n])
    }

    /// Creates a grid with explicit flags.
    pub fn with_flags(
        dates: Vec<Date>,
        is_valuation_date: Vec<bool>,
        is_close_out_date: Vec<bool>,
    ) -> Result<Self, DateGridError> {
        for flags in [is_valuation_date.len(), is_close_out_date.len()] {
            if flags != dates.len() {
                return Err(DateGridError::FlagLengthMismatch {
                    dates: dates.len(),
                    flags,
                });
            }
        }

        for (index, pair) in dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(DateGridError::NotAscending {
                    index: index + 1,
                    previous: pair[0],
                    date: pair[1],
                });
            }
        }

        for (i, date) in dates.iter().enumerate() {
            if !is_valuation_date[i] && !is_close_out_date[i] {
                return Err(DateGridError::UnflaggedDate(*date));
            }
        }

        Ok(Self {
            dates,
            is_valuation_date,
            is_close_out_date,
        })
    }

    /// Creates a valuation-only grid at `today + tenor` for each tenor.
    ///
    /// Tenors must produce strictly ascending dates.
    pub fn from_tenors(today: Date, tenors: &[Tenor]) -> Result<Self, DateGridError> {
        Self::new(tenors.iter().map(|tenor| today + *tenor).collect())
    }

    /// Flags `d + mpor` as a close-out date for every valuation date `d`.
    ///
    /// Close-out dates that coincide with an existing slot flag that slot;
    /// others are inserted in date order as close-out-only slots.
    pub fn add_close_out_dates(&mut self, mpor: Tenor) {
        let targets: Vec<Date> = self.valuation_dates().into_iter().map(|d| d + mpor).collect();

        for target in targets {
            match self.dates.binary_search(&target) {
                Ok(pos) => self.is_close_out_date[pos] = true,
                Err(pos) => {
                    self.dates.insert(pos, target);
                    self.is_valuation_date.insert(pos, false);
                    self.is_close_out_date.insert(pos, true);
                }
            }
        }
    }

    /// Returns all grid dates.
    #[inline]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Returns the valuation flag of every slot.
    #[inline]
    pub fn is_valuation_date(&self) -> &[bool] {
        &self.is_valuation_date
    }

    /// Returns the close-out flag of every slot.
    #[inline]
    pub fn is_close_out_date(&self) -> &[bool] {
        &self.is_close_out_date
    }

    /// Returns the dates flagged as valuation dates.
    pub fn valuation_dates(&self) -> Vec<Date> {
        self.flagged(&self.is_valuation_date)
    }

    /// Returns the dates flagged as close-out dates.
    pub fn close_out_dates(&self) -> Vec<Date> {
        self.flagged(&self.is_close_out_date)
    }

    /// Returns the number of grid slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if the grid has no dates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn flagged(&self, flags: &[bool]) -> Vec<Date> {
        self.dates
            .iter()
            .zip(flags)
            .filter(|(_, flag)| **flag)
            .map(|(date, _)| *date)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::time::TenorUnit;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_new_all_valuation_dates() {
        let grid = DateGrid::new(vec![d(2024, 2, 1), d(2024, 3, 1)]).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.is_valuation_date(), &[true, true]);
        assert_eq!(grid.is_close_out_date(), &[false, false]);
        assert!(grid.close_out_dates().is_empty());
    }

    #[test]
    fn test_new_rejects_unordered_dates() {
        let err = DateGrid::new(vec![d(2024, 3, 1), d(2024, 2, 1)]).unwrap_err();
        assert!(matches!(err, DateGridError::NotAscending { index: 1, .. }));
    }

    #[test]
    fn test_new_rejects_duplicate_dates() {
        let err = DateGrid::new(vec![d(2024, 3, 1), d(2024, 3, 1)]).unwrap_err();
        assert!(matches!(err, DateGridError::NotAscending { .. }));
    }

    #[test]
    fn test_with_flags_rejects_length_mismatch() {
        let err = DateGrid::with_flags(vec![d(2024, 3, 1)], vec![true, true], vec![false])
            .unwrap_err();
        assert_eq!(
            err,
            DateGridError::FlagLengthMismatch { dates: 1, flags: 2 }
        );
    }

    #[test]
    fn test_with_flags_rejects_unflagged_date() {
        let err =
            DateGrid::with_flags(vec![d(2024, 3, 1)], vec![false], vec![false]).unwrap_err();
        assert_eq!(err, DateGridError::UnflaggedDate(d(2024, 3, 1)));
    }

    #[test]
    fn test_default_is_empty() {
        let grid = DateGrid::default();
        assert!(grid.is_empty());
        assert_eq!(grid.len(), 0);
    }

    #[test]
    fn test_from_tenors() {
        let tenors = [Tenor::new(1, TenorUnit::Months), Tenor::new(1, TenorUnit::Years)];
        let grid = DateGrid::from_tenors(d(2024, 1, 15), &tenors).unwrap();
        assert_eq!(grid.dates(), &[d(2024, 2, 15), d(2025, 1, 15)]);
    }

    #[test]
    fn test_add_close_out_dates_inserts_between() {
        let mut grid = DateGrid::new(vec![d(2024, 2, 1), d(2024, 3, 1)]).unwrap();
        grid.add_close_out_dates(Tenor::days(14));

        assert_eq!(
            grid.dates(),
            &[d(2024, 2, 1), d(2024, 2, 15), d(2024, 3, 1), d(2024, 3, 15)]
        );
        assert_eq!(grid.is_valuation_date(), &[true, false, true, false]);
        assert_eq!(grid.is_close_out_date(), &[false, true, false, true]);
    }

    #[test]
    fn test_add_close_out_dates_flags_coincident_slot() {
        let mut grid = DateGrid::new(vec![d(2024, 2, 1), d(2024, 2, 15)]).unwrap();
        grid.add_close_out_dates(Tenor::days(14));

        assert_eq!(grid.dates(), &[d(2024, 2, 1), d(2024, 2, 15), d(2024, 2, 29)]);
        assert_eq!(grid.is_valuation_date(), &[true, true, false]);
        assert_eq!(grid.is_close_out_date(), &[false, true, true]);
        assert_eq!(grid.valuation_dates(), vec![d(2024, 2, 1), d(2024, 2, 15)]);
    }

    proptest! {
        #[test]
        fn test_close_out_grid_stays_ascending(
            offsets in proptest::collection::btree_set(1u64..2000, 1..20),
            mpor in 1u32..30,
        ) {
            let today = d(2024, 1, 1);
            let dates: Vec<Date> = offsets.iter().map(|o| today.add_days(*o)).collect();
            let n_valuation = dates.len();

            let mut grid = DateGrid::new(dates).unwrap();
            grid.add_close_out_dates(Tenor::days(mpor));

            prop_assert!(grid.dates().windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(grid.valuation_dates().len(), n_valuation);
            prop_assert_eq!(grid.close_out_dates().len(), n_valuation);
        }
    }
}
