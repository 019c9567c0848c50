//! In-memory collaborators for testing and development

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

fn poisoned() -> ReconError {
    ReconError::Fetch("in-memory store lock poisoned".to_string())
}

/// Purchases held in memory, filtered by creation date on fetch
#[derive(Debug, Clone, Default)]
pub struct MemoryPurchaseSource {
    purchases: Arc<RwLock<Vec<Purchase>>>,
    failure: Arc<RwLock<Option<String>>>,
}

impl MemoryPurchaseSource {
    /// Create a source holding the given purchases
    pub fn new(purchases: Vec<Purchase>) -> Self {
        Self {
            purchases: Arc::new(RwLock::new(purchases)),
            failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Make every subsequent fetch fail with this message
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = Some(message.into());
        }
    }
}

#[async_trait]
impl PurchaseSource for MemoryPurchaseSource {
    async fn fetch_purchases(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ReconResult<Vec<Purchase>> {
        if let Some(message) = self.failure.read().map_err(|_| poisoned())?.clone() {
            return Err(ReconError::Fetch(message));
        }

        let purchases = self.purchases.read().map_err(|_| poisoned())?;
        Ok(purchases
            .iter()
            .filter(|p| {
                let created = p.created_at.date();
                created >= start && created <= end
            })
            .cloned()
            .collect())
    }
}

/// Transactions held in memory, filtered by posting date on fetch
#[derive(Debug, Clone, Default)]
pub struct MemoryTransactionSource {
    transactions: Arc<RwLock<Vec<Transaction>>>,
    failure: Arc<RwLock<Option<String>>>,
}

impl MemoryTransactionSource {
    /// Create a source holding the given transactions
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: Arc::new(RwLock::new(transactions)),
            failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Make every subsequent fetch fail with this message
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = Some(message.into());
        }
    }
}

#[async_trait]
impl TransactionSource for MemoryTransactionSource {
    async fn fetch_transactions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ReconResult<Vec<Transaction>> {
        if let Some(message) = self.failure.read().map_err(|_| poisoned())?.clone() {
            return Err(ReconError::Fetch(message));
        }

        let transactions = self.transactions.read().map_err(|_| poisoned())?;
        Ok(transactions
            .iter()
            .filter(|t| t.date >= start && t.date <= end)
            .cloned()
            .collect())
    }
}

/// A match written back by [`MemoryMatchApplier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMatch {
    pub purchase_id: i64,
    pub transaction_id: i64,
    pub credit_card_id: i64,
}

/// Records applied matches; selected purchases can be made to fail or be refused
#[derive(Debug, Clone, Default)]
pub struct MemoryMatchApplier {
    applied: Arc<RwLock<Vec<AppliedMatch>>>,
    failing: Arc<RwLock<HashSet<i64>>>,
    refused: Arc<RwLock<HashSet<i64>>>,
}

impl MemoryMatchApplier {
    /// Create an applier that accepts every match
    pub fn new() -> Self {
        Self::default()
    }

    /// Return an error when applying a match for this purchase
    pub fn fail_for(&self, purchase_id: i64) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(purchase_id);
        }
    }

    /// Return `Ok(false)` when applying a match for this purchase
    pub fn refuse_for(&self, purchase_id: i64) {
        if let Ok(mut refused) = self.refused.write() {
            refused.insert(purchase_id);
        }
    }

    /// Matches applied so far, in call order
    pub fn applied(&self) -> Vec<AppliedMatch> {
        self.applied
            .read()
            .map(|applied| applied.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MatchApplier for MemoryMatchApplier {
    async fn apply_match(
        &self,
        purchase_id: i64,
        transaction_id: i64,
        card: &CardInfo,
    ) -> ReconResult<bool> {
        let apply_error = || ReconError::Apply("in-memory applier lock poisoned".to_string());

        if self.failing.read().map_err(|_| apply_error())?.contains(&purchase_id) {
            return Err(ReconError::Apply(format!(
                "ticketing system rejected purchase {purchase_id}"
            )));
        }
        if self.refused.read().map_err(|_| apply_error())?.contains(&purchase_id) {
            return Ok(false);
        }

        self.applied
            .write()
            .map_err(|_| apply_error())?
            .push(AppliedMatch {
                purchase_id,
                transaction_id,
                credit_card_id: card.credit_card_id,
            });
        Ok(true)
    }
}
