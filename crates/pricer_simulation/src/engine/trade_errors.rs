//! Structured trade errors and the per-trade error ledger.

use serde::Serialize;
use std::fmt;
use tracing::error;

/// Stage tag of errors raised while valuing trades under scenarios.
pub const SCENARIO_VALUATION_STAGE: &str = "ScenarioValuation";

/// A trade failure as reported to downstream consumers.
///
/// # Examples
///
/// ```
/// use pricer_simulation::engine::StructuredTradeError;
///
/// let err = StructuredTradeError::scenario_valuation("SWAP_1", "Swap", "T0 valuation error: no curve");
/// let json = err.to_json().unwrap();
/// assert!(json.contains("\"stage\":\"ScenarioValuation\""));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StructuredTradeError {
    /// Trade identifier
    pub trade_id: String,
    /// Trade type
    pub trade_type: String,
    /// Processing stage that failed
    pub stage: String,
    /// Failure description
    pub message: String,
}

impl StructuredTradeError {
    /// Creates an error for an arbitrary stage.
    pub fn new(
        trade_id: impl Into<String>,
        trade_type: impl Into<String>,
        stage: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            trade_id: trade_id.into(),
            trade_type: trade_type.into(),
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Creates an error tagged with [`SCENARIO_VALUATION_STAGE`].
    pub fn scenario_valuation(
        trade_id: impl Into<String>,
        trade_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(trade_id, trade_type, SCENARIO_VALUATION_STAGE, message)
    }

    /// JSON rendering for persistence.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Emits the error as a structured `error` event.
    pub fn log(&self) {
        error!(
            trade_id = %self.trade_id,
            trade_type = %self.trade_type,
            stage = %self.stage,
            "{}",
            self.message
        );
    }
}

impl fmt::Display for StructuredTradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} trade '{}' ({}): {}",
            self.stage, self.trade_id, self.trade_type, self.message
        )
    }
}

/// Per-trade error flags plus the errors in occurrence order.
///
/// A flag, once set, stays set for the rest of the build.
#[derive(Debug, Default)]
pub(crate) struct TradeErrors {
    flags: Vec<bool>,
    errors: Vec<StructuredTradeError>,
}

impl TradeErrors {
    pub(crate) fn new(trades: usize) -> Self {
        Self {
            flags: vec![false; trades],
            errors: Vec::new(),
        }
    }

    /// Logs `error` and flags trade `index`.
    pub(crate) fn record(&mut self, index: usize, error: StructuredTradeError) {
        error.log();
        if let Some(flag) = self.flags.get_mut(index) {
            *flag = true;
        }
        self.errors.push(error);
    }

    #[inline]
    pub(crate) fn has_error(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub(crate) fn errored_count(&self) -> usize {
        self.flags.iter().filter(|flag| **flag).count()
    }

    pub(crate) fn into_errors(self) -> Vec<StructuredTradeError> {
        self.errors
    }
}
