//! Pluggable calculators that populate NPV cubes.
//!
//! The engine decides *when* a calculator runs; the calculator decides
//! *what* it writes and at which depth. Two families exist:
//!
//! - [`ValuationCalculator`]: invoked per trade, with a time-zero phase
//! - [`CounterpartyCalculator`]: invoked per counterparty, no time-zero phase
//!
//! Both see the scenario market read-only. Failures of a trade calculator
//! are isolated to that trade by the engine.

mod composite;
mod npv;
mod survival;

pub use composite::CompositeCalculator;
pub use npv::NpvCalculator;
pub use survival::SurvivalProbabilityCalculator;

use crate::cube::NpvCube;
use crate::error::CalculationError;
use crate::market::SimMarket;
use crate::portfolio::{Portfolio, Trade};
use pricer_core::types::Date;

/// Where in the simulation a calculator is being invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValuationPoint {
    /// Simulation date of the grid slot.
    pub date: Date,
    /// Position of the slot in the full date grid.
    pub grid_index: usize,
    /// Trade cube date index. For close-out slots this is the index of the
    /// most recent valuation date.
    pub date_index: usize,
    /// Monte Carlo sample.
    pub sample: usize,
    /// Whether this is a close-out evaluation.
    pub is_close_out: bool,
}

/// Cubes a trade calculator may write to.
pub struct CubeOutputs<'a> {
    /// Trade cube, one id per trade and one date per valuation date.
    pub cube: &'a mut dyn NpvCube,
    /// Optional cube for close-out (netting set) results.
    pub close_out_cube: Option<&'a mut dyn NpvCube>,
}

impl<'a> CubeOutputs<'a> {
    /// Outputs with only a trade cube.
    pub fn new(cube: &'a mut dyn NpvCube) -> Self {
        Self {
            cube,
            close_out_cube: None,
        }
    }

    /// Adds a close-out cube.
    pub fn with_close_out_cube(mut self, cube: &'a mut dyn NpvCube) -> Self {
        self.close_out_cube = Some(cube);
        self
    }
}

/// Per-trade metric writer.
pub trait ValuationCalculator {
    /// Binds the calculator to a portfolio and market before a cube build.
    fn init(&mut self, _portfolio: &Portfolio, _market: &dyn SimMarket) {}

    /// Called before every per-date trade loop.
    fn init_scenario(&mut self) {}

    /// Writes time-zero values for one trade.
    fn calculate_t0(
        &mut self,
        trade: &dyn Trade,
        trade_index: usize,
        market: &dyn SimMarket,
        outputs: &mut CubeOutputs<'_>,
    ) -> Result<(), CalculationError>;

    /// Writes values for one trade at one grid slot and sample.
    fn calculate(
        &mut self,
        trade: &dyn Trade,
        trade_index: usize,
        market: &dyn SimMarket,
        outputs: &mut CubeOutputs<'_>,
        point: &ValuationPoint,
    ) -> Result<(), CalculationError>;
}

/// Per-counterparty metric writer.
///
/// Runs on every grid date. Close-out dates arrive with
/// `point.is_close_out` set, and `point.grid_index` addresses the date
/// axis of the counterparty cube.
pub trait CounterpartyCalculator {
    /// Writes values for one counterparty at one grid slot and sample.
    fn calculate(
        &mut self,
        counterparty: &str,
        index: usize,
        market: &dyn SimMarket,
        cube: &mut dyn NpvCube,
        point: &ValuationPoint,
    ) -> Result<(), CalculationError>;
}

/// Counterparty cube together with the calculators that fill it.
pub struct CounterpartyOutput<'a> {
    /// Cube with one id per counterparty plus a placeholder, and one date
    /// per grid date.
    pub cube: &'a mut dyn NpvCube,
    /// Calculators invoked for every counterparty on valuation dates.
    pub calculators: &'a mut [Box<dyn CounterpartyCalculator>],
}
