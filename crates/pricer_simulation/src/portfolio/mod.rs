//! Portfolio of trades valued by the engine.
//!
//! This module provides:
//! - [`Trade`]: the per-trade interface (pricing, state hooks, optional
//!   [`Exercisable`] capability)
//! - [`Portfolio`]: trades keyed by [`TradeId`] in stable name order
//!
//! # Examples
//!
//! ```
//! use pricer_simulation::error::CalculationError;
//! use pricer_simulation::market::SimMarket;
//! use pricer_simulation::portfolio::{CounterpartyId, Portfolio, Trade, TradeId};
//!
//! struct Deposit {
//!     cpty: CounterpartyId,
//!     amount: f64,
//! }
//!
//! impl Trade for Deposit {
//!     fn trade_type(&self) -> &str {
//!         "Deposit"
//!     }
//!     fn npv_currency(&self) -> &str {
//!         "EUR"
//!     }
//!     fn counterparty(&self) -> &CounterpartyId {
//!         &self.cpty
//!     }
//!     fn npv(&self, _market: &dyn SimMarket) -> Result<f64, CalculationError> {
//!         Ok(self.amount)
//!     }
//! }
//!
//! let mut portfolio = Portfolio::new();
//! for (id, cpty) in [("D2", "BANK_A"), ("D1", "BANK_B"), ("D3", "BANK_A")] {
//!     let trade = Deposit { cpty: CounterpartyId::new(cpty), amount: 1.0 };
//!     portfolio.add(TradeId::new(id), Box::new(trade)).unwrap();
//! }
//!
//! assert_eq!(portfolio.len(), 3);
//! assert_eq!(portfolio.counterparties().len(), 2);
//! let order: Vec<&str> = portfolio.ids().map(|id| id.as_str()).collect();
//! assert_eq!(order, vec!["D1", "D2", "D3"]);
//! ```

mod error;
mod ids;
mod trade;

pub use error::PortfolioError;
pub use ids::{CounterpartyId, TradeId};
pub use trade::{Exercisable, Trade};

use std::collections::{BTreeMap, BTreeSet};

/// Trades keyed by id, iterated in ascending id order.
///
/// The iteration position of a trade is its index in the trade cube.
#[derive(Default)]
pub struct Portfolio {
    trades: BTreeMap<TradeId, Box<dyn Trade>>,
}

impl Portfolio {
    /// Creates an empty portfolio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trade.
    ///
    /// # Errors
    ///
    /// Returns `PortfolioError::DuplicateTrade` if the id is already used.
    pub fn add(&mut self, id: TradeId, trade: Box<dyn Trade>) -> Result<(), PortfolioError> {
        if self.trades.contains_key(&id) {
            return Err(PortfolioError::DuplicateTrade(id.to_string()));
        }
        self.trades.insert(id, trade);
        Ok(())
    }

    /// Removes a trade and returns it.
    pub fn remove(&mut self, id: &TradeId) -> Result<Box<dyn Trade>, PortfolioError> {
        self.trades
            .remove(id)
            .ok_or_else(|| PortfolioError::TradeNotFound(id.to_string()))
    }

    /// Returns the trade with the given id.
    pub fn get(&self, id: &TradeId) -> Option<&dyn Trade> {
        self.trades.get(id).map(|t| t.as_ref())
    }

    /// Number of trades.
    #[inline]
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    /// Whether the portfolio has no trades.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Trade ids in cube index order.
    pub fn ids(&self) -> impl Iterator<Item = &TradeId> {
        self.trades.keys()
    }

    /// Trades in cube index order.
    pub fn trades(&self) -> impl Iterator<Item = (&TradeId, &dyn Trade)> {
        self.trades.iter().map(|(id, t)| (id, t.as_ref()))
    }

    /// Mutable trades in cube index order.
    pub fn trades_mut(&mut self) -> impl Iterator<Item = (&TradeId, &mut Box<dyn Trade>)> {
        self.trades.iter_mut()
    }

    /// Distinct counterparties of all trades, in name order.
    pub fn counterparties(&self) -> BTreeSet<CounterpartyId> {
        self.trades
            .values()
            .map(|t| t.counterparty().clone())
            .collect()
    }
}

impl std::fmt::Debug for Portfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portfolio")
            .field("trades", &self.trades.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalculationError;
    use crate::market::SimMarket;

    struct Fixed {
        cpty: CounterpartyId,
    }

    impl Trade for Fixed {
        fn trade_type(&self) -> &str {
            "Fixed"
        }
        fn npv_currency(&self) -> &str {
            "USD"
        }
        fn counterparty(&self) -> &CounterpartyId {
            &self.cpty
        }
        fn npv(&self, _market: &dyn SimMarket) -> Result<f64, CalculationError> {
            Ok(0.0)
        }
    }

    fn fixed(cpty: &str) -> Box<dyn Trade> {
        Box::new(Fixed {
            cpty: CounterpartyId::new(cpty),
        })
    }

    #[test]
    fn test_duplicate_trade_rejected() {
        let mut p = Portfolio::new();
        p.add(TradeId::new("T1"), fixed("CP1")).unwrap();
        let err = p.add(TradeId::new("T1"), fixed("CP2")).unwrap_err();
        assert_eq!(err, PortfolioError::DuplicateTrade("T1".to_string()));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_remove_and_get() {
        let mut p = Portfolio::new();
        p.add(TradeId::new("T1"), fixed("CP1")).unwrap();
        assert!(p.get(&TradeId::new("T1")).is_some());

        let removed = p.remove(&TradeId::new("T1")).unwrap();
        assert_eq!(removed.trade_type(), "Fixed");
        assert!(p.is_empty());
        assert!(matches!(
            p.remove(&TradeId::new("T1")),
            Err(PortfolioError::TradeNotFound(_))
        ));
    }

    #[test]
    fn test_default_capabilities() {
        let mut trade = fixed("CP1");
        assert!(trade.as_exercisable_mut().is_none());
        assert!(trade.update_instruments().is_ok());
    }

    #[test]
    fn test_counterparties_deduplicated() {
        let mut p = Portfolio::new();
        p.add(TradeId::new("T1"), fixed("CP2")).unwrap();
        p.add(TradeId::new("T2"), fixed("CP1")).unwrap();
        p.add(TradeId::new("T3"), fixed("CP2")).unwrap();

        let cptys: Vec<String> = p.counterparties().iter().map(|c| c.to_string()).collect();
        assert_eq!(cptys, vec!["CP1", "CP2"]);
    }
}
