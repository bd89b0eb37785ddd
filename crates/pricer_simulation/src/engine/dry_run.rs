//! Deterministic fill for dry runs.
//!
//! A dry run values sample 0 for real and fills every later sample with
//! the time-zero value plus a positional offset. The result is a cube with
//! the right shape and distinguishable entries, not a meaningful
//! simulation.

use crate::cube::CubeIndex;

/// Samples below this index receive a non-zero offset.
pub const DRY_RUN_NOISE_SAMPLES: usize = 10;

/// Offset added to the time-zero value at `index` in a dry run.
///
/// Equals `date + id + depth + sample` for samples below
/// [`DRY_RUN_NOISE_SAMPLES`] and zero from there on.
///
/// # Examples
///
/// ```
/// use pricer_simulation::cube::CubeIndex;
/// use pricer_simulation::engine::dry_run_noise;
///
/// let at = |sample| CubeIndex { id: 1, date: 2, sample, depth: 0 };
/// assert_eq!(dry_run_noise(at(3)), 6.0);
/// assert_eq!(dry_run_noise(at(10)), 0.0);
/// ```
#[inline]
pub fn dry_run_noise(index: CubeIndex) -> f64 {
    if index.sample < DRY_RUN_NOISE_SAMPLES {
        (index.date + index.id + index.depth + index.sample) as f64
    } else {
        0.0
    }
}
