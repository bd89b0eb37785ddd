//! # pricer_core: Calendar Foundation for Scenario Revaluation
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the workspace, providing:
//! - Date and tenor types (`types::time`)
//! - The simulation date grid with valuation/close-out flags (`types::date_grid`)
//! - Error types: `DateError`, `DateGridError` (`types::error`)
//!
//! ## Dependencies
//!
//! Layer 1 has no dependencies on other pricer_* crates:
//! - chrono: Date arithmetic
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::types::{Date, DateGrid, Tenor};
//!
//! let today = Date::from_ymd(2024, 1, 1).unwrap();
//! let grid = DateGrid::from_tenors(today, &[Tenor::days(7), Tenor::days(14)]).unwrap();
//!
//! assert_eq!(grid.valuation_dates().len(), 2);
//! assert!(grid.dates()[0] > today);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for `Date` and `DateGrid`

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod types;
