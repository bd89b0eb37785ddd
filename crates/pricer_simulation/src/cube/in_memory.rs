//! Dense in-memory cube with configurable storage precision.

use super::{check_index, CubeError, CubeIndex, NpvCube};
use num_traits::Float;
use pricer_core::types::Date;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Dense cube storing every coordinate in one contiguous buffer.
///
/// Each id owns a contiguous block of `dates * samples * depth` values, so
/// per-id operations (removal, bulk fills) touch disjoint memory.
///
/// # Examples
///
/// ```
/// use pricer_core::types::Date;
/// use pricer_simulation::cube::{DoublePrecisionCube, NpvCube};
///
/// let asof = Date::from_ymd(2024, 1, 1).unwrap();
/// let dates = vec![Date::from_ymd(2024, 2, 1).unwrap()];
/// let mut cube = DoublePrecisionCube::new(asof, ["T1", "T2"], dates, 100, 1).unwrap();
///
/// cube.set(42.0, 1, 0, 99, 0).unwrap();
/// assert_eq!(cube.get(1, 0, 99, 0).unwrap(), 42.0);
/// assert_eq!(cube.index_of("T2"), Some(1));
/// assert!(cube.get(2, 0, 0, 0).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryCube<T = f64> {
    asof: Date,
    ids: BTreeMap<String, usize>,
    dates: Vec<Date>,
    samples: usize,
    depth: usize,
    t0: Vec<T>,
    data: Vec<T>,
}

/// Cube storing `f64` values.
pub type DoublePrecisionCube = InMemoryCube<f64>;

/// Cube storing `f32` values, halving memory for large runs.
pub type SinglePrecisionCube = InMemoryCube<f32>;

impl<T: Float + Send + Sync> InMemoryCube<T> {
    /// Allocates a zero-filled cube.
    ///
    /// Ids are indexed in the order supplied.
    ///
    /// # Errors
    ///
    /// - `CubeError::DuplicateId` if an id appears twice
    /// - `CubeError::ZeroDepth` if `depth == 0`
    pub fn new<I, S>(
        asof: Date,
        ids: I,
        dates: Vec<Date>,
        samples: usize,
        depth: usize,
    ) -> Result<Self, CubeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if depth == 0 {
            return Err(CubeError::ZeroDepth);
        }

        let mut index = BTreeMap::new();
        for (i, id) in ids.into_iter().enumerate() {
            let id = id.into();
            if index.contains_key(&id) {
                return Err(CubeError::DuplicateId(id));
            }
            index.insert(id, i);
        }

        let n_ids = index.len();
        let block = dates.len() * samples * depth;

        Ok(Self {
            asof,
            ids: index,
            dates,
            samples,
            depth,
            t0: vec![T::zero(); n_ids * depth],
            data: vec![T::zero(); n_ids * block],
        })
    }

    /// Number of values owned by one id.
    #[inline]
    fn block_len(&self) -> usize {
        self.dates.len() * self.samples * self.depth
    }

    #[inline]
    fn t0_offset(&self, id: usize, depth: usize) -> Result<usize, CubeError> {
        check_index("id", id, self.ids.len())?;
        check_index("depth", depth, self.depth)?;
        Ok(id * self.depth + depth)
    }

    #[inline]
    fn offset(
        &self,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<usize, CubeError> {
        check_index("id", id, self.ids.len())?;
        check_index("date", date, self.dates.len())?;
        check_index("sample", sample, self.samples)?;
        check_index("depth", depth, self.depth)?;
        Ok(((id * self.dates.len() + date) * self.samples + sample) * self.depth + depth)
    }
}

#[inline]
fn to_storage<T: Float>(value: f64) -> T {
    num_traits::cast::<f64, T>(value).unwrap_or_else(T::nan)
}

#[inline]
fn from_storage<T: Float>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

impl<T: Float + Send + Sync> NpvCube for InMemoryCube<T> {
    fn asof(&self) -> Date {
        self.asof
    }

    fn num_ids(&self) -> usize {
        self.ids.len()
    }

    fn num_dates(&self) -> usize {
        self.dates.len()
    }

    fn samples(&self) -> usize {
        self.samples
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn dates(&self) -> &[Date] {
        &self.dates
    }

    fn ids_and_indexes(&self) -> &BTreeMap<String, usize> {
        &self.ids
    }

    fn get_t0(&self, id: usize, depth: usize) -> Result<f64, CubeError> {
        let offset = self.t0_offset(id, depth)?;
        Ok(from_storage(self.t0[offset]))
    }

    fn set_t0(&mut self, value: f64, id: usize, depth: usize) -> Result<(), CubeError> {
        let offset = self.t0_offset(id, depth)?;
        self.t0[offset] = to_storage(value);
        Ok(())
    }

    fn get(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<f64, CubeError> {
        let offset = self.offset(id, date, sample, depth)?;
        Ok(from_storage(self.data[offset]))
    }

    fn set(
        &mut self,
        value: f64,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<(), CubeError> {
        let offset = self.offset(id, date, sample, depth)?;
        self.data[offset] = to_storage(value);
        Ok(())
    }

    fn remove(&mut self, id: usize) -> Result<(), CubeError> {
        check_index("id", id, self.ids.len())?;
        let block = self.block_len();
        self.data[id * block..(id + 1) * block].fill(T::zero());
        self.t0[id * self.depth..(id + 1) * self.depth].fill(T::zero());
        Ok(())
    }

    fn fill_from_t0(
        &mut self,
        first_sample: usize,
        noise: &(dyn Fn(CubeIndex) -> f64 + Sync),
    ) -> Result<(), CubeError> {
        let block = self.block_len();
        if block == 0 || first_sample >= self.samples {
            return Ok(());
        }

        let n_dates = self.dates.len();
        let n_samples = self.samples;
        let n_depth = self.depth;
        let t0 = &self.t0;

        // one id per chunk, filled independently
        self.data
            .par_chunks_mut(block)
            .enumerate()
            .for_each(|(id, values)| {
                for date in 0..n_dates {
                    for sample in first_sample..n_samples {
                        for depth in 0..n_depth {
                            let base = from_storage(t0[id * n_depth + depth]);
                            let index = CubeIndex {
                                id,
                                date,
                                sample,
                                depth,
                            };
                            values[(date * n_samples + sample) * n_depth + depth] =
                                to_storage(base + noise(index));
                        }
                    }
                }
            });

        Ok(())
    }
}
