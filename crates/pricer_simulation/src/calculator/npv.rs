//! Trade NPV in a base currency.

use super::{CubeOutputs, ValuationCalculator, ValuationPoint};
use crate::error::CalculationError;
use crate::market::SimMarket;
use crate::portfolio::Trade;

/// Writes trade NPVs converted into a base currency.
///
/// Valuation-date results go to `index`. With a close-out index set, the
/// close-out NPV of the margin period of risk is written at that depth of
/// the trade cube, under the date index of the preceding valuation date.
#[derive(Clone, Debug)]
pub struct NpvCalculator {
    base_currency: String,
    index: usize,
    close_out_index: Option<usize>,
}

impl NpvCalculator {
    /// Creates a calculator writing at depth `index`.
    pub fn new(base_currency: impl Into<String>, index: usize) -> Self {
        Self {
            base_currency: base_currency.into(),
            index,
            close_out_index: None,
        }
    }

    /// Also writes close-out NPVs at depth `close_out_index`.
    pub fn with_close_out_index(mut self, close_out_index: usize) -> Self {
        self.close_out_index = Some(close_out_index);
        self
    }

    /// Base currency of the written values.
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    fn npv(&self, trade: &dyn Trade, market: &dyn SimMarket) -> Result<f64, CalculationError> {
        let fx = market.fx_spot(trade.npv_currency(), &self.base_currency)?;
        Ok(trade.npv(market)? * fx)
    }
}

impl ValuationCalculator for NpvCalculator {
    fn calculate_t0(
        &mut self,
        trade: &dyn Trade,
        trade_index: usize,
        market: &dyn SimMarket,
        outputs: &mut CubeOutputs<'_>,
    ) -> Result<(), CalculationError> {
        let npv = self.npv(trade, market)?;
        outputs.cube.set_t0(npv, trade_index, self.index)?;
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
        let depth = if point.is_close_out {
            match self.close_out_index {
                Some(depth) => depth,
                None => return Ok(()),
            }
        } else {
            self.index
        };
        let npv = self.npv(trade, market)?;
        outputs
            .cube
            .set(npv, trade_index, point.date_index, point.sample, depth)?;
        Ok(())
    }
}
