//! Portfolio error types.

use thiserror::Error;

/// Errors that can occur during portfolio construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortfolioError {
    /// Trade not found in portfolio.
    #[error("Trade not found: {0}")]
    TradeNotFound(String),

    /// Duplicate trade ID encountered.
    #[error("Duplicate trade ID: {0}")]
    DuplicateTrade(String),
}
