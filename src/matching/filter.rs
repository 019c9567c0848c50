//! Coarse pre-filter that bounds the scoring work per purchase

use bigdecimal::BigDecimal;

use crate::config::MatchingConfig;
use crate::matching::days_apart;
use crate::types::*;

/// Keeps transactions close enough in amount and date to be worth scoring.
///
/// The windows are wider than anything the scorer accepts: dropping a true
/// match here cannot be recovered later.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    amount_window: BigDecimal,
    date_window_days: i64,
}

impl CandidateFilter {
    /// Create a filter using the candidate windows of `config`
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            amount_window: config.tolerance.candidate_amount.clone(),
            date_window_days: config.tolerance.candidate_date_days,
        }
    }

    /// Whether a single transaction is a plausible candidate
    pub fn accepts(&self, purchase: &Purchase, transaction: &Transaction) -> bool {
        let amount_diff = (transaction.amount_major() - &purchase.total).abs();
        amount_diff < self.amount_window
            && days_apart(purchase, transaction) <= self.date_window_days
    }

    /// Candidates for one purchase, in input order
    pub fn filter<'t>(
        &self,
        purchase: &Purchase,
        transactions: &'t [Transaction],
    ) -> Vec<&'t Transaction> {
        transactions
            .iter()
            .filter(|txn| self.accepts(purchase, txn))
            .collect()
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}
