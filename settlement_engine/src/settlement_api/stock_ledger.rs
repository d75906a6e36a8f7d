//! Atomic, never-negative stock adjustments.
//!
//! Every change is a compare-and-set on the product's current stock level. When another writer gets in first, the
//! ledger re-reads the stock and tries again, up to a configurable number of attempts.
use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    helpers::{retry_on_conflict, CasAttempt, DEFAULT_CAS_ATTEMPTS},
    settlement_api::errors::StockError,
    traits::StockManagement,
};

/// A point-in-time answer to "can I take `requested` units of this product?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCheck {
    pub product_id: i64,
    pub requested: i64,
    pub current_stock: i64,
    pub available: bool,
    pub shortage: i64,
}

#[derive(Clone)]
pub struct StockLedger<B> {
    db: B,
    max_attempts: usize,
}

impl<B> Debug for StockLedger<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StockLedger (max_attempts: {})", self.max_attempts)
    }
}

impl<B> StockLedger<B> {
    pub fn new(db: B) -> Self {
        Self { db, max_attempts: DEFAULT_CAS_ATTEMPTS }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

impl<B> StockLedger<B>
where B: StockManagement
{
    /// Non-binding availability check. The answer can be stale by the time the caller acts on it.
    pub async fn check_available(&self, product_id: i64, quantity: i64) -> Result<StockCheck, StockError> {
        if quantity < 1 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        let current_stock = self.db.fetch_stock(product_id).await?.ok_or(StockError::ProductNotFound(product_id))?;
        let shortage = (quantity - current_stock).max(0);
        Ok(StockCheck { product_id, requested: quantity, current_stock, available: shortage == 0, shortage })
    }

    /// Removes `quantity` units from stock and returns the new stock level. Stock never goes below zero.
    pub async fn decrement(&self, product_id: i64, quantity: i64) -> Result<i64, StockError> {
        if quantity < 1 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        self.adjust(product_id, -quantity).await
    }

    /// Returns `quantity` units to stock and returns the new stock level.
    pub async fn increment(&self, product_id: i64, quantity: i64) -> Result<i64, StockError> {
        if quantity < 1 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        self.adjust(product_id, quantity).await
    }

    async fn adjust(&self, product_id: i64, delta: i64) -> Result<i64, StockError> {
        let db = &self.db;
        let result = retry_on_conflict::<_, StockError, _, _>(self.max_attempts, |attempt| async move {
            let current = db.fetch_stock(product_id).await?.ok_or(StockError::ProductNotFound(product_id))?;
            let new_stock = current + delta;
            if new_stock < 0 {
                return Err(StockError::InsufficientStock { product_id, requested: -delta, available: current });
            }
            if db.compare_and_set_stock(product_id, current, new_stock).await? {
                trace!("📦️ Stock for product {product_id}: {current} -> {new_stock} (attempt {attempt})");
                Ok(CasAttempt::Done(new_stock))
            } else {
                Ok(CasAttempt::Conflict)
            }
        })
        .await?;
        match result {
            Some(new_stock) => {
                debug!("📦️ Stock for product {product_id} adjusted by {delta}. New level: {new_stock}");
                Ok(new_stock)
            },
            None => {
                warn!("📦️ Stock for product {product_id} is under heavy contention. Adjustment of {delta} abandoned.");
                Err(StockError::ConcurrentModification(product_id))
            },
        }
    }
}
