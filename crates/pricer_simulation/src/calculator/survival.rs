//! Counterparty survival probabilities.

use super::{CounterpartyCalculator, ValuationPoint};
use crate::cube::NpvCube;
use crate::error::CalculationError;
use crate::market::SimMarket;

/// Writes each counterparty's survival probability to the simulation date.
///
/// Values are stored under the grid index rather than the trade cube date
/// index, so every slot of the counterparty cube is written, close-out
/// dates included. On a slot that is both a close-out and a valuation date
/// the valuation pass runs last and its value stands. The placeholder
/// entry, if named, always survives.
#[derive(Clone, Debug)]
pub struct SurvivalProbabilityCalculator {
    index: usize,
    placeholder: Option<String>,
}

impl SurvivalProbabilityCalculator {
    /// Creates a calculator writing at depth `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            placeholder: None,
        }
    }

    /// Id of the placeholder entry, which gets probability one.
    pub fn with_placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholder = Some(name.into());
        self
    }
}

impl CounterpartyCalculator for SurvivalProbabilityCalculator {
    fn calculate(
        &mut self,
        counterparty: &str,
        index: usize,
        market: &dyn SimMarket,
        cube: &mut dyn NpvCube,
        point: &ValuationPoint,
    ) -> Result<(), CalculationError> {
        let probability = if self.placeholder.as_deref() == Some(counterparty) {
            1.0
        } else {
            market.survival_probability(counterparty)?
        };
        cube.set(probability, index, point.grid_index, point.sample, self.index)?;
        Ok(())
    }
}
