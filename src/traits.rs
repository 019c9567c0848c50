//! Traits for the external collaborators and the matching strategies

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::matching::PurchaseProfile;
use crate::types::*;

/// Source of unpaid purchases
///
/// Implemented by the ticketing back-office client. Pagination, retries and
/// rate limiting are the implementation's concern; the reconciler only sees
/// a complete list or an error.
#[async_trait]
pub trait PurchaseSource: Send + Sync {
    /// Fetch unpaid purchases created within the window (inclusive)
    async fn fetch_purchases(&self, start: NaiveDate, end: NaiveDate)
        -> ReconResult<Vec<Purchase>>;
}

/// Source of banking transactions not yet linked to a purchase
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch unmatched transactions posted within the window (inclusive)
    async fn fetch_transactions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ReconResult<Vec<Transaction>>;
}

/// Writes an accepted match back to both systems
#[async_trait]
pub trait MatchApplier: Send + Sync {
    /// Mark the purchase as paid with the given card and link the
    /// transaction to it. `Ok(false)` means one of the systems refused.
    async fn apply_match(
        &self,
        purchase_id: i64,
        transaction_id: i64,
        card: &CardInfo,
    ) -> ReconResult<bool>;
}

/// One step of the matching waterfall
pub trait MatchStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Score a single candidate, or `None` if this strategy does not apply
    fn try_match(
        &self,
        profile: &PurchaseProfile<'_>,
        transaction: &Transaction,
    ) -> Option<MatchCandidateResult>;
}
