//! Market observation modes.
//!
//! Instruments and models normally learn about market changes through
//! observer notifications. The observation mode selects how the engine
//! compensates when notifications are disabled or trimmed. Every mode
//! yields the same cube values; they differ only in which refresh strategy
//! pays the cost.
//!
//! | Mode         | Force recalibration | Refresh instruments | Detach floating legs |
//! |--------------|---------------------|---------------------|----------------------|
//! | `Standard`   | no                  | no                  | no                   |
//! | `Disabled`   | yes                 | yes                 | no                   |
//! | `Defer`      | no                  | no                  | no                   |
//! | `Unregister` | no                  | yes                 | yes                  |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unknown observation mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid observation mode: {0}. Must be one of: none, disable, defer, unregister")]
pub struct ParseObservationModeError(pub String);

/// How market changes reach instruments and models during a simulation.
///
/// The mode is a value threaded into the engine; the engine reads it and
/// never changes it.
///
/// # Examples
///
/// ```
/// use pricer_simulation::ObservationMode;
///
/// let mode: ObservationMode = "Disable".parse().unwrap();
/// assert_eq!(mode, ObservationMode::Disabled);
/// assert!(mode.forces_recalibration());
/// assert!(!ObservationMode::default().forces_recalibration());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObservationMode {
    /// Observer notifications flow as usual.
    #[default]
    Standard,
    /// Notifications are switched off; everything is refreshed explicitly.
    Disabled,
    /// Notifications are batched until the market update completes.
    Defer,
    /// Simulated floating-rate legs stop observing their indices.
    Unregister,
}

impl ObservationMode {
    /// Returns the configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            ObservationMode::Standard => "none",
            ObservationMode::Disabled => "disable",
            ObservationMode::Defer => "defer",
            ObservationMode::Unregister => "unregister",
        }
    }

    /// Whether model builders must recalibrate even if nothing they
    /// observe reports a change.
    #[inline]
    pub fn forces_recalibration(&self) -> bool {
        matches!(self, ObservationMode::Disabled)
    }

    /// Whether trades must refresh quote-dependent internals before each
    /// calculation.
    #[inline]
    pub fn refreshes_instruments(&self) -> bool {
        matches!(self, ObservationMode::Disabled | ObservationMode::Unregister)
    }

    /// Whether trades detach floating-rate legs after time-zero valuation.
    #[inline]
    pub fn unregisters_floating_legs(&self) -> bool {
        matches!(self, ObservationMode::Unregister)
    }
}

impl FromStr for ObservationMode {
    type Err = ParseObservationModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "standard" => Ok(ObservationMode::Standard),
            "disable" | "disabled" => Ok(ObservationMode::Disabled),
            "defer" => Ok(ObservationMode::Defer),
            "unregister" => Ok(ObservationMode::Unregister),
            _ => Err(ParseObservationModeError(s.to_string())),
        }
    }
}

impl fmt::Display for ObservationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ObservationMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ObservationMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ObservationMode::from_str(&s).map_err(serde::de::Error::custom)
    }
}
