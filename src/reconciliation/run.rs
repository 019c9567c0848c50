//! Main reconciliation orchestrator that coordinates sources, matching and updates

use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::MatchingConfig;
use crate::matching::BatchReconciler;
use crate::traits::*;
use crate::types::*;
use crate::utils::extraction::extract_last_four;

/// Inclusive date windows for the two fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    pub purchase_start: NaiveDate,
    pub purchase_end: NaiveDate,
    pub transaction_start: NaiveDate,
    pub transaction_end: NaiveDate,
}

impl RunWindow {
    /// Same window for purchases and transactions
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            purchase_start: start,
            purchase_end: end,
            transaction_start: start,
            transaction_end: end,
        }
    }

    /// Extend the transaction window past `end` by `lag_days`; transactions
    /// post a few days after the purchase is created
    pub fn with_posting_lag(start: NaiveDate, end: NaiveDate, lag_days: u64) -> Self {
        Self {
            transaction_end: end.checked_add_days(Days::new(lag_days)).unwrap_or(end),
            ..Self::new(start, end)
        }
    }
}

/// One configured reconciliation job over a purchase source, a transaction
/// source and an update collaborator
pub struct ReconciliationRun<P, T, A>
where
    P: PurchaseSource,
    T: TransactionSource,
    A: MatchApplier,
{
    purchases: P,
    transactions: T,
    applier: A,
    card_mapping: CardMapping,
    reconciler: BatchReconciler,
}

impl<P, T, A> ReconciliationRun<P, T, A>
where
    P: PurchaseSource,
    T: TransactionSource,
    A: MatchApplier,
{
    /// Create a run with the default matching configuration
    pub fn new(purchases: P, transactions: T, applier: A, card_mapping: CardMapping) -> Self {
        Self::with_config(
            purchases,
            transactions,
            applier,
            card_mapping,
            MatchingConfig::default(),
        )
    }

    /// Create a run with a custom matching configuration
    pub fn with_config(
        purchases: P,
        transactions: T,
        applier: A,
        card_mapping: CardMapping,
        config: MatchingConfig,
    ) -> Self {
        Self {
            purchases,
            transactions,
            applier,
            card_mapping,
            reconciler: BatchReconciler::new(config),
        }
    }

    /// Fetch, match and (unless `dry_run`) apply.
    ///
    /// Never fails: a fetch error yields a zero-count result carrying the
    /// error, and apply failures are recorded per match.
    pub async fn execute(&self, window: RunWindow, dry_run: bool) -> ReconciliationResult {
        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            mode = if dry_run { "dry_run" } else { "live" },
            purchase_start = %window.purchase_start,
            purchase_end = %window.purchase_end,
            "starting reconciliation run"
        );

        let purchases = match self
            .purchases
            .fetch_purchases(window.purchase_start, window.purchase_end)
            .await
        {
            Ok(purchases) => purchases,
            Err(e) => return Self::abort(run_id, dry_run, e),
        };
        info!(%run_id, count = purchases.len(), "fetched unpaid purchases");

        let transactions = match self
            .transactions
            .fetch_transactions(window.transaction_start, window.transaction_end)
            .await
        {
            Ok(transactions) => transactions,
            Err(e) => return Self::abort(run_id, dry_run, e),
        };
        info!(%run_id, count = transactions.len(), "fetched unmatched transactions");

        let outcome = self.reconciler.run(&purchases, &transactions);
        for (transaction_id, purchase_ids) in outcome.contested_transactions() {
            warn!(
                %run_id,
                transaction_id,
                ?purchase_ids,
                "transaction selected by more than one purchase"
            );
        }

        let mut errors = Vec::new();
        let matches_updated = if dry_run {
            info!(%run_id, "dry run, skipping system updates");
            0
        } else {
            self.apply_matches(&outcome.matched, &purchases, &transactions, &mut errors)
                .await
        };

        let total_purchases = purchases.len();
        let matches_found = outcome.matched.len();
        let success_rate = if total_purchases == 0 {
            0.0
        } else {
            matches_found as f64 / total_purchases as f64
        };

        info!(
            %run_id,
            matched = matches_found,
            total = total_purchases,
            updated = matches_updated,
            success_rate = %format!("{:.1}%", success_rate * 100.0),
            "reconciliation complete"
        );

        ReconciliationResult {
            run_id,
            timestamp: chrono::Utc::now().naive_utc(),
            dry_run,
            total_purchases,
            total_transactions: transactions.len(),
            matches_found,
            matches_updated,
            unmatched_purchases: outcome.unmatched.len(),
            unmatched_purchase_ids: outcome.unmatched_ids(),
            success_rate,
            matches: outcome.matched,
            errors,
        }
    }

    fn abort(run_id: Uuid, dry_run: bool, e: ReconError) -> ReconciliationResult {
        error!(%run_id, error = %e, "reconciliation run aborted");
        ReconciliationResult {
            run_id,
            ..ReconciliationResult::failed(dry_run, e.to_string())
        }
    }

    /// Card for a match: by portal account name, then by the card digits
    /// written in the purchase notes
    fn resolve_card(
        &self,
        transaction: &Transaction,
        purchase: Option<&Purchase>,
    ) -> Option<&CardInfo> {
        self.card_mapping
            .by_account_name(&transaction.account_identifier)
            .or_else(|| {
                let last_four = extract_last_four(&purchase?.notes)?;
                self.card_mapping.by_last_four(&last_four)
            })
    }

    /// Apply each match independently; returns how many were written back
    async fn apply_matches(
        &self,
        matches: &[MatchCandidateResult],
        purchases: &[Purchase],
        transactions: &[Transaction],
        errors: &mut Vec<String>,
    ) -> usize {
        let purchases_by_id: HashMap<i64, &Purchase> =
            purchases.iter().map(|p| (p.id, p)).collect();
        let transactions_by_id: HashMap<i64, &Transaction> =
            transactions.iter().map(|t| (t.id, t)).collect();

        let mut updated = 0;
        for m in matches {
            let Some(transaction) = transactions_by_id.get(&m.transaction_id) else {
                let message = format!("Could not find transaction {}", m.transaction_id);
                error!("{}", message);
                errors.push(message);
                continue;
            };

            let purchase = purchases_by_id.get(&m.purchase_id).copied();
            let Some(card) = self.resolve_card(transaction, purchase) else {
                let message = format!(
                    "No card mapping for account '{}' (purchase {})",
                    transaction.account_identifier, m.purchase_id
                );
                error!("{}", message);
                errors.push(message);
                continue;
            };

            match self
                .applier
                .apply_match(m.purchase_id, m.transaction_id, card)
                .await
            {
                Ok(true) => {
                    updated += 1;
                    info!(
                        purchase_id = m.purchase_id,
                        transaction_id = m.transaction_id,
                        "updated match"
                    );
                }
                Ok(false) => {
                    let message = format!(
                        "Update rejected for purchase {} / transaction {}",
                        m.purchase_id, m.transaction_id
                    );
                    error!("{}", message);
                    errors.push(message);
                }
                Err(e) => {
                    let message = format!("Failed to update match {}: {}", m.purchase_id, e);
                    error!("{}", message);
                    errors.push(message);
                }
            }
        }

        debug!(updated, attempted = matches.len(), "apply step finished");
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_posting_lag() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 27).unwrap();

        let window = RunWindow::with_posting_lag(start, end, 3);
        assert_eq!(window.purchase_end, end);
        assert_eq!(window.transaction_start, start);
        assert_eq!(
            window.transaction_end,
            NaiveDate::from_ymd_opt(2026, 1, 30).unwrap()
        );

        let same = RunWindow::new(start, end);
        assert_eq!(same.transaction_end, end);
    }
}
