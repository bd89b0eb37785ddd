//! Model recalibration during simulation.
//!
//! Model builders own per-currency pricing models whose parameters depend on
//! the simulated market. Before every calculation pass the engine asks each
//! builder to recalibrate; under [`ObservationMode::Disabled`] it first
//! forces the builder to drop any "nothing changed" shortcut.

use crate::error::ValuationError;
use crate::observation::ObservationMode;
use thiserror::Error;
use tracing::trace;

/// Errors raised by model builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Calibration instruments are unavailable in the current market.
    #[error("Missing recalibration target: {0}")]
    MissingTarget(String),

    /// Calibration did not converge or produced invalid parameters.
    #[error("Calibration failed: {0}")]
    CalibrationFailed(String),
}

/// Builder of a model that tracks the simulated market.
pub trait ModelBuilder {
    /// Recalibrates if any input changed since the last call.
    fn recalibrate(&mut self) -> Result<(), ModelError>;

    /// Marks the model dirty so the next [`ModelBuilder::recalibrate`]
    /// call recalibrates unconditionally.
    fn force_recalculate(&mut self);
}

/// Model builders keyed by currency.
#[derive(Default)]
pub struct ModelBuilderSet {
    builders: Vec<(String, Box<dyn ModelBuilder>)>,
}

impl ModelBuilderSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a builder under `key` (typically a currency code).
    pub fn add(&mut self, key: impl Into<String>, builder: Box<dyn ModelBuilder>) {
        self.builders.push((key.into(), builder));
    }

    /// Builder-style [`ModelBuilderSet::add`].
    pub fn with(mut self, key: impl Into<String>, builder: Box<dyn ModelBuilder>) -> Self {
        self.add(key, builder);
        self
    }

    /// Number of registered builders.
    #[inline]
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Whether no builders are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.builders.iter().map(|(key, _)| key.as_str())
    }

    /// Recalibrates every builder, forcing it first if `mode` requires.
    ///
    /// # Errors
    ///
    /// Returns `ValuationError::Recalibration` for the first builder that
    /// fails; later builders are not touched.
    pub fn recalibrate(&mut self, mode: ObservationMode) -> Result<(), ValuationError> {
        for (key, builder) in &mut self.builders {
            trace!("Recalibrating model {}", key);
            if mode.forces_recalibration() {
                builder.force_recalculate();
            }
            builder
                .recalibrate()
                .map_err(|source| ValuationError::Recalibration {
                    key: key.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ModelBuilderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBuilderSet")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
