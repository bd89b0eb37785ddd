//! Error types for cube builds.
//!
//! Two tiers:
//! - [`CalculationError`]: a single trade failed to value. The engine
//!   records it, flags the trade and carries on with the others.
//! - [`ValuationError`]: a precondition or shared-state failure. The cube
//!   build stops and the error is returned to the caller.

use crate::cube::CubeError;
use crate::market::MarketError;
use crate::model::ModelError;
use pricer_core::types::Date;
use thiserror::Error;

/// Recoverable failure while valuing one trade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    /// Instrument pricing failed.
    #[error("Pricing failed: {0}")]
    Pricing(String),

    /// Market lookup failed for this trade.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// Result could not be stored.
    #[error(transparent)]
    Cube(#[from] CubeError),
}

/// Fatal failure aborting a cube build.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// The date grid has no dates.
    #[error("Date grid size must be > 0")]
    EmptyDateGrid,

    /// Today is later than the first simulation date.
    #[error("Today ({today}) must not be later than first date grid date {first}")]
    TodayAfterGridStart {
        /// Engine reference date
        today: Date,
        /// First grid date
        first: Date,
    },

    /// No scenario market was supplied.
    #[error("Scenario market not set")]
    MissingMarket,

    /// The portfolio has no trades.
    #[error("Portfolio is empty")]
    EmptyPortfolio,

    /// Trade cube id count differs from the portfolio size.
    #[error("Cube x dimension ({cube}) different from portfolio size ({portfolio})")]
    TradeCubeIdsMismatch {
        /// Ids in the cube
        cube: usize,
        /// Trades in the portfolio
        portfolio: usize,
    },

    /// Trade cube date count differs from the number of valuation dates.
    #[error("Cube y dimension ({cube}) different from number of valuation dates ({grid})")]
    TradeCubeDatesMismatch {
        /// Dates in the cube
        cube: usize,
        /// Valuation dates in the grid
        grid: usize,
    },

    /// A trade id is missing from the trade cube or held at another index
    /// than its position in the portfolio.
    #[error("Trade '{trade}' is at cube index {found:?}, expected {expected}")]
    TradeCubeIdOrder {
        /// Trade id
        trade: String,
        /// Position of the trade in the portfolio
        expected: usize,
        /// Index the cube holds for the trade id
        found: Option<usize>,
    },

    /// Counterparty cube id count differs from counterparties plus one.
    #[error(
        "Counterparty cube x dimension ({cube}) different from counterparty count plus one ({expected})"
    )]
    CounterpartyCubeIdsMismatch {
        /// Ids in the cube
        cube: usize,
        /// Counterparties in the portfolio plus one
        expected: usize,
    },

    /// A portfolio counterparty has no id in the counterparty cube.
    #[error("Counterparty '{0}' not found in counterparty cube")]
    MissingCounterpartyId(String),

    /// Counterparty cube date count differs from the grid size.
    #[error("Counterparty cube y dimension ({cube}) different from number of time steps ({grid})")]
    CounterpartyCubeDatesMismatch {
        /// Dates in the cube
        cube: usize,
        /// Dates in the grid
        grid: usize,
    },

    /// A trade has no NPV currency.
    #[error("NPV currency not set for trade {0}")]
    MissingNpvCurrency(String),

    /// A close-out date came before any valuation date.
    #[error("Close-out date {0} precedes the first valuation date; the date grid must start with a valuation date")]
    CloseOutBeforeValuationDate(Date),

    /// A model builder could not be recalibrated.
    #[error("Recalibration of model '{key}' failed: {source}")]
    Recalibration {
        /// Key the builder was registered under
        key: String,
        /// Underlying failure
        source: ModelError,
    },

    /// A counterparty calculator failed.
    #[error("Counterparty calculation failed for '{counterparty}': {source}")]
    CounterpartyCalculation {
        /// Counterparty name
        counterparty: String,
        /// Underlying failure
        source: CalculationError,
    },

    /// Shared scenario market update failed.
    #[error("Scenario market update failed: {0}")]
    Market(#[from] MarketError),

    /// The scenario market lock was poisoned by a panic elsewhere.
    #[error("Scenario market is unusable after a panic while it was checked out")]
    MarketPoisoned,

    /// Bulk cube operation failed.
    #[error(transparent)]
    Cube(#[from] CubeError),
}
