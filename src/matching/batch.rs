//! Matches every purchase of a run against the shared transaction pool

use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::config::MatchingConfig;
use crate::matching::{CandidateFilter, MatchSelector};
use crate::types::*;

/// Partition of the purchases of one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Accepted matches, in processing order
    pub matched: Vec<MatchCandidateResult>,
    /// Purchases without a confident match, in processing order
    pub unmatched: Vec<Purchase>,
}

impl BatchOutcome {
    /// Number of purchases processed
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }

    /// Ids of the unmatched purchases, in processing order
    pub fn unmatched_ids(&self) -> Vec<i64> {
        self.unmatched.iter().map(|p| p.id).collect()
    }

    /// Transactions selected by more than one purchase, with the purchase ids
    pub fn contested_transactions(&self) -> BTreeMap<i64, Vec<i64>> {
        let mut claims: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for m in &self.matched {
            claims.entry(m.transaction_id).or_default().push(m.purchase_id);
        }
        claims.retain(|_, purchases| purchases.len() > 1);
        claims
    }
}

/// Runs filter and selection for each purchase, oldest purchase first
pub struct BatchReconciler {
    filter: CandidateFilter,
    selector: MatchSelector,
    exclusive_claims: bool,
}

impl BatchReconciler {
    /// Create a reconciler with filter and selector built from `config`
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            filter: CandidateFilter::new(&config),
            exclusive_claims: config.exclusive_claims,
            selector: MatchSelector::new(config),
        }
    }

    /// Create a reconciler from already-built parts
    pub fn with_parts(
        filter: CandidateFilter,
        selector: MatchSelector,
        exclusive_claims: bool,
    ) -> Self {
        Self {
            filter,
            selector,
            exclusive_claims,
        }
    }

    /// Match every purchase against the pool.
    ///
    /// Transactions stay in the pool after being matched unless
    /// `exclusive_claims` is set, so two purchases can select the same one.
    pub fn run(&self, purchases: &[Purchase], transactions: &[Transaction]) -> BatchOutcome {
        let mut ordered: Vec<&Purchase> = purchases.iter().collect();
        ordered.sort_by_key(|p| p.created_at);

        let mut outcome = BatchOutcome::default();
        let mut claimed: HashSet<i64> = HashSet::new();

        for purchase in ordered {
            let mut candidates = self.filter.filter(purchase, transactions);
            if self.exclusive_claims {
                candidates.retain(|t| !claimed.contains(&t.id));
            }

            match self.selector.select(purchase, &candidates) {
                Some(result) => {
                    debug!(
                        purchase_id = purchase.id,
                        transaction_id = result.transaction_id,
                        confidence = result.confidence,
                        "purchase matched"
                    );
                    if self.exclusive_claims {
                        claimed.insert(result.transaction_id);
                    }
                    outcome.matched.push(result);
                }
                None => {
                    debug!(
                        purchase_id = purchase.id,
                        candidates = candidates.len(),
                        "no match for purchase"
                    );
                    outcome.unmatched.push(purchase.clone());
                }
            }
        }

        outcome
    }
}

impl Default for BatchReconciler {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}
