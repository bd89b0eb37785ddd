//! Identifier types for portfolio entities.
//!
//! Ordered newtypes so that portfolios iterate trades and counterparties in
//! a stable, name-sorted order.

use std::fmt;

/// Unique identifier for a trade.
///
/// # Examples
///
/// ```
/// use pricer_simulation::portfolio::TradeId;
///
/// let id = TradeId::new("SWAP_001");
/// assert_eq!(id.as_str(), "SWAP_001");
/// assert!(TradeId::new("A") < TradeId::new("B"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeId(String);

impl TradeId {
    /// Creates a new trade ID.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TradeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TradeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a counterparty.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CounterpartyId(String);

impl CounterpartyId {
    /// Creates a new counterparty ID.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CounterpartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CounterpartyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
