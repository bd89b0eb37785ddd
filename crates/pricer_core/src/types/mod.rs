//! Calendar and grid types.
//!
//! This module provides:
//! - `time`: `Date` and `Tenor` for calendar arithmetic
//! - `date_grid`: `DateGrid`, the simulation date grid with valuation and close-out flags
//! - `error`: Structured error types for date, tenor and grid construction
//!
//! # Re-exports
//!
//! For convenience, commonly used types are re-exported at this module level.

pub mod date_grid;
pub mod error;
pub mod time;

// Re-export commonly used types at module level
pub use date_grid::DateGrid;
pub use error::{DateError, DateGridError};
pub use time::{Date, Tenor, TenorUnit};
