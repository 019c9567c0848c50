//! Runs the strategy waterfall for one purchase/transaction pair

use tracing::trace;

use crate::config::MatchingConfig;
use crate::matching::{
    EmailMetadataStrategy, OrderNumberStrategy, PurchaseProfile, WeightedStrategy,
};
use crate::traits::MatchStrategy;
use crate::types::*;

/// Ordered list of strategies; the first one that produces a result wins
pub struct MatchScorer {
    config: MatchingConfig,
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl MatchScorer {
    /// Order number, then weighted signals, then email metadata
    pub fn new(config: MatchingConfig) -> Self {
        let strategies: Vec<Box<dyn MatchStrategy>> = vec![
            Box::new(OrderNumberStrategy::new(&config)),
            Box::new(WeightedStrategy::new(&config)),
            Box::new(EmailMetadataStrategy),
        ];
        Self { config, strategies }
    }

    /// Create a scorer with a custom waterfall
    pub fn with_strategies(
        config: MatchingConfig,
        strategies: Vec<Box<dyn MatchStrategy>>,
    ) -> Self {
        Self { config, strategies }
    }

    /// Configuration the strategies were built from
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Names of the strategies in evaluation order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract the per-purchase signals used by the strategies
    pub fn profile<'a>(&self, purchase: &'a Purchase) -> PurchaseProfile<'a> {
        PurchaseProfile::new(purchase, &self.config)
    }

    /// Score a single pair
    pub fn score(
        &self,
        purchase: &Purchase,
        transaction: &Transaction,
    ) -> Option<MatchCandidateResult> {
        self.score_profile(&self.profile(purchase), transaction)
    }

    /// Score a pair when the purchase profile is already built
    pub fn score_profile(
        &self,
        profile: &PurchaseProfile<'_>,
        transaction: &Transaction,
    ) -> Option<MatchCandidateResult> {
        self.strategies.iter().find_map(|strategy| {
            let result = strategy.try_match(profile, transaction);
            if let Some(ref r) = result {
                trace!(
                    purchase_id = profile.purchase.id,
                    transaction_id = transaction.id,
                    strategy = strategy.name(),
                    confidence = r.confidence,
                    "candidate scored"
                );
            }
            result
        })
    }
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}
