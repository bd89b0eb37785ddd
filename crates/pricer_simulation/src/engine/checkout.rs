//! Exclusive use of the scenario market for one cube build.

use crate::error::ValuationError;
use crate::market::SimMarket;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Locked scenario market that resets itself when dropped.
///
/// Dropping the checkout, on success or on an early `?` return, leaves the
/// market idle for the next caller.
pub(crate) struct MarketCheckout<'a> {
    guard: MutexGuard<'a, dyn SimMarket + Send + 'static>,
}

impl<'a> MarketCheckout<'a> {
    /// Locks `market` for the lifetime of the checkout.
    pub(crate) fn acquire(
        market: &'a Mutex<dyn SimMarket + Send + 'static>,
    ) -> Result<Self, ValuationError> {
        let guard = market.lock().map_err(|_| ValuationError::MarketPoisoned)?;
        Ok(Self { guard })
    }
}

impl Deref for MarketCheckout<'_> {
    type Target = dyn SimMarket + Send + 'static;

    fn deref(&self) -> &Self::Target {
        &*self.guard
    }
}

impl DerefMut for MarketCheckout<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.guard
    }
}

impl Drop for MarketCheckout<'_> {
    fn drop(&mut self) {
        debug!("Resetting scenario market");
        self.guard.reset();
    }
}
