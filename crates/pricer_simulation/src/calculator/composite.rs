//! Calculator grouping.

use super::{CubeOutputs, ValuationCalculator, ValuationPoint};
use crate::error::CalculationError;
use crate::market::SimMarket;
use crate::portfolio::{Portfolio, Trade};

/// Runs child calculators in order, stopping at the first failure.
#[derive(Default)]
pub struct CompositeCalculator {
    children: Vec<Box<dyn ValuationCalculator>>,
}

impl CompositeCalculator {
    /// Creates an empty composite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a child.
    pub fn with(mut self, child: Box<dyn ValuationCalculator>) -> Self {
        self.children.push(child);
        self
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl ValuationCalculator for CompositeCalculator {
    fn init(&mut self, portfolio: &Portfolio, market: &dyn SimMarket) {
        for child in &mut self.children {
            child.init(portfolio, market);
        }
    }

    fn init_scenario(&mut self) {
        for child in &mut self.children {
            child.init_scenario();
        }
    }

    fn calculate_t0(
        &mut self,
        trade: &dyn Trade,
        trade_index: usize,
        market: &dyn SimMarket,
        outputs: &mut CubeOutputs<'_>,
    ) -> Result<(), CalculationError> {
        for child in &mut self.children {
            child.calculate_t0(trade, trade_index, market, outputs)?;
        }
        Ok(())
    }

    fn calculate(
        &mut self,
        trade: &dyn Trade,
        trade_index: usize,
        market: &dyn SimMarket,
        outputs: &mut CubeOutputs<'_>,
        point: &ValuationPoint,
    ) -> Result<(), CalculationError> {
        for child in &mut self.children {
            child.calculate(trade, trade_index, market, outputs, point)?;
        }
        Ok(())
    }
}
