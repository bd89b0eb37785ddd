//! Trade interface consumed by the valuation engine.

use super::CounterpartyId;
use crate::error::CalculationError;
use crate::market::SimMarket;
use pricer_core::types::Date;

/// Embedded optionality that can be switched off.
///
/// Implemented by trades carrying early exercise rights. Sticky close-out
/// valuation freezes optionality by disabling exercise around the close-out
/// calculation.
pub trait Exercisable {
    /// Re-enables exercise decisions.
    fn enable_exercise(&mut self);

    /// Suppresses exercise decisions until re-enabled.
    fn disable_exercise(&mut self);

    /// Whether exercise is currently enabled.
    fn is_exercise_enabled(&self) -> bool;
}

/// A priced position in a simulated portfolio.
///
/// Only [`Trade::npv`] and the identification methods are required; the
/// state hooks default to no-ops for trades without path dependence.
pub trait Trade {
    /// Trade type label used in error reports (e.g. "Swap").
    fn trade_type(&self) -> &str;

    /// Currency of [`Trade::npv`]. Must be non-empty.
    fn npv_currency(&self) -> &str;

    /// Counterparty the trade faces.
    fn counterparty(&self) -> &CounterpartyId;

    /// Present value in [`Trade::npv_currency`] under the market's current
    /// date and scenario.
    fn npv(&self, market: &dyn SimMarket) -> Result<f64, CalculationError>;

    /// Sets up path-dependent state for the simulation dates.
    fn initialise(&mut self, _dates: &[Date]) {}

    /// Returns the trade to a clean pricing state before a new sample.
    fn reset(&mut self) {}

    /// Refreshes quote-dependent internals when market observers are not
    /// relied upon.
    fn update_instruments(&mut self) -> Result<(), CalculationError> {
        Ok(())
    }

    /// Detaches floating-rate legs from live market observers.
    fn unregister_floating_legs(&mut self) {}

    /// Exercise capability, if the trade has embedded optionality.
    fn as_exercisable_mut(&mut self) -> Option<&mut dyn Exercisable> {
        None
    }
}
