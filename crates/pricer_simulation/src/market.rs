//! Scenario market interface consumed by the valuation engine.
//!
//! A [`SimMarket`] is today's market re-pointed to a simulation date and
//! scenario. The engine drives it through a fixed update protocol:
//!
//! ```text
//! pre_update -> update_date -> update_scenario -> post_update
//!            -> update_aggregation_scenario_data (valuation dates only)
//! ```
//!
//! and resets it when a cube build finishes. Calculators only read it.

use crate::portfolio::Portfolio;
use pricer_core::types::Date;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by scenario market updates and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// A required quote or curve is absent.
    #[error("Missing quote: {0}")]
    MissingQuote(String),

    /// The scenario could not be applied.
    #[error("Scenario update failed on {date}: {message}")]
    ScenarioUpdate {
        /// Simulation date
        date: Date,
        /// Failure description
        message: String,
    },

    /// Fixing history could not be prepared.
    #[error("Fixing update failed: {0}")]
    Fixings(String),
}

/// Manages index fixings for simulated future dates.
///
/// Initialised once per cube build when the grid contains future dates,
/// reset after every sample so the next path starts from the historical
/// fixings only.
pub trait FixingManager {
    /// Prepares fixing tracking for the trades in `portfolio`.
    fn initialise(&mut self, portfolio: &Portfolio, asof: Date) -> Result<(), MarketError>;

    /// Restores the historical fixings.
    fn reset(&mut self);
}

/// Stateful market re-pointed to future dates and scenarios.
pub trait SimMarket {
    /// Current reference date of the market.
    fn asof_date(&self) -> Date;

    /// Label of the current scenario, used in error reports.
    fn label(&self) -> &str;

    /// Prepares the market for an update.
    fn pre_update(&mut self);

    /// Moves the evaluation date.
    fn update_date(&mut self, date: Date) -> Result<(), MarketError>;

    /// Applies the scenario for `date` of the current sample.
    fn update_scenario(&mut self, date: Date) -> Result<(), MarketError>;

    /// Completes the update, optionally recording simulated fixings.
    fn post_update(&mut self, date: Date, with_fixings: bool) -> Result<(), MarketError>;

    /// Records scenario data needed for later aggregation.
    fn update_aggregation_scenario_data(&mut self, date: Date) -> Result<(), MarketError>;

    /// Returns the market to its pre-simulation state.
    fn reset(&mut self);

    /// Fixing manager owned by this market.
    fn fixing_manager_mut(&mut self) -> &mut dyn FixingManager;

    /// FX spot converting one unit of `ccy` into `base`.
    fn fx_spot(&self, ccy: &str, base: &str) -> Result<f64, MarketError> {
        if ccy == base {
            Ok(1.0)
        } else {
            Err(MarketError::MissingQuote(format!("FX spot {ccy}{base}")))
        }
    }

    /// Survival probability of `name` to the market's current date.
    fn survival_probability(&self, name: &str) -> Result<f64, MarketError> {
        Err(MarketError::MissingQuote(format!("default curve {name}")))
    }
}

/// Scenario market shared between the engine and its caller.
///
/// The engine locks it for the whole of a cube build.
pub type SharedMarket = Arc<Mutex<dyn SimMarket + Send>>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle;

    impl FixingManager for Idle {
        fn initialise(&mut self, _portfolio: &Portfolio, _asof: Date) -> Result<(), MarketError> {
            Ok(())
        }
        fn reset(&mut self) {}
    }

    struct FlatMarket {
        asof: Date,
        fixings: Idle,
    }

    impl SimMarket for FlatMarket {
        fn asof_date(&self) -> Date {
            self.asof
        }
        fn label(&self) -> &str {
            "flat"
        }
        fn pre_update(&mut self) {}
        fn update_date(&mut self, date: Date) -> Result<(), MarketError> {
            self.asof = date;
            Ok(())
        }
        fn update_scenario(&mut self, _date: Date) -> Result<(), MarketError> {
            Ok(())
        }
        fn post_update(&mut self, _date: Date, _with_fixings: bool) -> Result<(), MarketError> {
            Ok(())
        }
        fn update_aggregation_scenario_data(&mut self, _date: Date) -> Result<(), MarketError> {
            Ok(())
        }
        fn reset(&mut self) {}
        fn fixing_manager_mut(&mut self) -> &mut dyn FixingManager {
            &mut self.fixings
        }
    }

    fn market() -> FlatMarket {
        FlatMarket {
            asof: Date::from_ymd(2024, 1, 1).unwrap(),
            fixings: Idle,
        }
    }

    #[test]
    fn test_default_fx_spot() {
        let m = market();
        assert_eq!(m.fx_spot("EUR", "EUR").unwrap(), 1.0);
        assert_eq!(
            m.fx_spot("USD", "EUR").unwrap_err(),
            MarketError::MissingQuote("FX spot USDEUR".to_string())
        );
    }

    #[test]
    fn test_default_survival_probability_is_missing() {
        let m = market();
        assert!(matches!(
            m.survival_probability("CP1"),
            Err(MarketError::MissingQuote(_))
        ));
    }

    #[test]
    fn test_shared_market_coercion() {
        let shared: SharedMarket = Arc::new(Mutex::new(market()));
        let guard = shared.lock().unwrap();
        assert_eq!(guard.label(), "flat");
    }
}
