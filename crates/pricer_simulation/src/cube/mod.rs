//! NPV cubes: the results containers of a scenario revaluation.
//!
//! A cube stores one value per (id, date, sample, depth) coordinate plus a
//! time-zero value per (id, depth). Ids are trades for the trade cube and
//! counterparties for the counterparty cube; depth holds calculator-specific
//! metrics (e.g. NPV at depth 0, close-out NPV at depth 1).
//!
//! # Layout
//!
//! ```text
//! t0[id][depth]
//! data[id][date][sample][depth]
//! ```
//!
//! Dimensions are fixed at construction; nothing in this crate reorders or
//! resizes a cube once built.

mod in_memory;

pub use in_memory::{DoublePrecisionCube, InMemoryCube, SinglePrecisionCube};

use pricer_core::types::Date;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by cube access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CubeError {
    /// Coordinate outside the cube's dimensions.
    #[error("Cube {dimension} index {index} out of range [0, {size})")]
    IndexOutOfRange {
        /// Dimension name ("id", "date", "sample" or "depth")
        dimension: &'static str,
        /// Requested index
        index: usize,
        /// Size of the dimension
        size: usize,
    },

    /// The same id was supplied twice at construction.
    #[error("Duplicate cube id: {0}")]
    DuplicateId(String),

    /// Cubes need at least one depth slot.
    #[error("Cube depth must be > 0")]
    ZeroDepth,
}

/// Full coordinate of a cube entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeIndex {
    /// Entity index
    pub id: usize,
    /// Date index
    pub date: usize,
    /// Sample index
    pub sample: usize,
    /// Depth index
    pub depth: usize,
}

/// Four-dimensional results container written by calculators.
///
/// Values cross this interface as `f64` regardless of the storage
/// precision of the implementation.
pub trait NpvCube {
    /// Valuation date of the run that fills this cube.
    fn asof(&self) -> Date;

    /// Number of ids (first dimension).
    fn num_ids(&self) -> usize;

    /// Number of dates (second dimension).
    fn num_dates(&self) -> usize;

    /// Number of samples (third dimension).
    fn samples(&self) -> usize;

    /// Number of depth slots (fourth dimension).
    fn depth(&self) -> usize;

    /// Dates of the second dimension.
    fn dates(&self) -> &[Date];

    /// Stable id name to index mapping, fixed at construction.
    fn ids_and_indexes(&self) -> &BTreeMap<String, usize>;

    /// Returns the time-zero value.
    fn get_t0(&self, id: usize, depth: usize) -> Result<f64, CubeError>;

    /// Sets the time-zero value.
    fn set_t0(&mut self, value: f64, id: usize, depth: usize) -> Result<(), CubeError>;

    /// Returns the value at a full coordinate.
    fn get(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<f64, CubeError>;

    /// Sets the value at a full coordinate.
    fn set(
        &mut self,
        value: f64,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<(), CubeError>;

    /// Zeroes every value stored for `id`: all dates, samples and depths,
    /// and its time-zero values. Storage is kept.
    fn remove(&mut self, id: usize) -> Result<(), CubeError> {
        check_index("id", id, self.num_ids())?;
        for depth in 0..self.depth() {
            self.set_t0(0.0, id, depth)?;
        }
        for date in 0..self.num_dates() {
            for sample in 0..self.samples() {
                for depth in 0..self.depth() {
                    self.set(0.0, id, date, sample, depth)?;
                }
            }
        }
        Ok(())
    }

    /// Sets every entry with sample index `>= first_sample` to its
    /// time-zero value plus `noise(index)`.
    fn fill_from_t0(
        &mut self,
        first_sample: usize,
        noise: &(dyn Fn(CubeIndex) -> f64 + Sync),
    ) -> Result<(), CubeError> {
        for id in 0..self.num_ids() {
            for date in 0..self.num_dates() {
                for sample in first_sample..self.samples() {
                    for depth in 0..self.depth() {
                        let t0 = self.get_t0(id, depth)?;
                        let index = CubeIndex {
                            id,
                            date,
                            sample,
                            depth,
                        };
                        self.set(t0 + noise(index), id, date, sample, depth)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Looks up the index of an id name.
    fn index_of(&self, id: &str) -> Option<usize> {
        self.ids_and_indexes().get(id).copied()
    }
}

#[inline]
pub(crate) fn check_index(
    dimension: &'static str,
    index: usize,
    size: usize,
) -> Result<(), CubeError> {
    if index < size {
        Ok(())
    } else {
        Err(CubeError::IndexOutOfRange {
            dimension,
            index,
            size,
        })
    }
}
