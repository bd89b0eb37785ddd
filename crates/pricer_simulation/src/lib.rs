//! # Pricer Simulation (L4: Application)
//!
//! Monte Carlo revaluation of a portfolio into NPV cubes.
//!
//! A [`ValuationEngine`] replays a portfolio across a grid of future dates
//! under every simulated scenario of a [`market::SimMarket`] and lets
//! pluggable calculators write the results into four-dimensional cubes
//! consumed later by exposure, margin and risk aggregation.
//!
//! This crate provides:
//! - In-memory NPV cubes in single and double precision
//! - Trade and counterparty calculator interfaces with NPV, composite and
//!   survival probability implementations
//! - Per-trade fault isolation with structured error reports
//! - Close-out (margin period of risk) processing with sticky dates
//! - Observation modes, model recalibration, progress reporting and
//!   TOML/environment configuration
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         pricer_simulation (L4)          │
//! ├─────────────────────────────────────────┤
//! │  engine/      - ValuationEngine         │
//! │  calculator/  - trade/cpty calculators  │
//! │  cube/        - NpvCube, InMemoryCube   │
//! │  market       - SimMarket protocol      │
//! │  portfolio/   - Trade, Portfolio        │
//! │  model        - recalibration set       │
//! │  observation  - ObservationMode         │
//! │  progress     - progress indicators     │
//! │  config       - ValuationConfig         │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │            pricer_core (L1)             │
//! │  Date, Tenor, DateGrid                  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The engine is single-threaded and owns the scenario market for the
//! duration of a build. Bulk cube fills run per-trade blocks in parallel
//! with Rayon.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod calculator;
pub mod config;
pub mod cube;
pub mod engine;
pub mod error;
pub mod market;
pub mod model;
pub mod observation;
pub mod portfolio;
pub mod progress;

// Re-export commonly used types
pub use calculator::{
    CompositeCalculator, CounterpartyCalculator, CounterpartyOutput, CubeOutputs, NpvCalculator,
    SurvivalProbabilityCalculator, ValuationCalculator, ValuationPoint,
};
pub use config::{ConfigError, ValuationConfig};
pub use cube::{
    CubeError, CubeIndex, DoublePrecisionCube, InMemoryCube, NpvCube, SinglePrecisionCube,
};
pub use engine::{
    BuildOptions, CubeBuildReport, PhaseTimings, StructuredTradeError, ValuationEngine,
    ValuationEngineBuilder,
};
pub use error::{CalculationError, ValuationError};
pub use market::{FixingManager, MarketError, SharedMarket, SimMarket};
pub use model::{ModelBuilder, ModelBuilderSet, ModelError};
pub use observation::ObservationMode;
pub use portfolio::{CounterpartyId, Exercisable, Portfolio, PortfolioError, Trade, TradeId};
pub use progress::{ProgressIndicator, ProgressLog, ProgressReporter};
