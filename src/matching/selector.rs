//! Picks the best-scoring candidate for a purchase

use tracing::debug;

use crate::config::MatchingConfig;
use crate::matching::MatchScorer;
use crate::types::*;

/// Scores every candidate and keeps the most confident one above the
/// acceptance threshold
pub struct MatchSelector {
    scorer: MatchScorer,
    acceptance_threshold: f64,
}

impl MatchSelector {
    /// Create a selector over the default waterfall for `config`
    pub fn new(config: MatchingConfig) -> Self {
        let acceptance_threshold = config.acceptance_threshold;
        Self {
            scorer: MatchScorer::new(config),
            acceptance_threshold,
        }
    }

    /// Use a custom scorer; the threshold comes from the scorer's config
    pub fn with_scorer(scorer: MatchScorer) -> Self {
        let acceptance_threshold = scorer.config().acceptance_threshold;
        Self {
            scorer,
            acceptance_threshold,
        }
    }

    /// Scorer used for every candidate
    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    /// Best match for the purchase among the candidates, if confident enough.
    /// On equal confidence the earlier candidate is kept.
    pub fn select(
        &self,
        purchase: &Purchase,
        candidates: &[&Transaction],
    ) -> Option<MatchCandidateResult> {
        let profile = self.scorer.profile(purchase);

        let mut best: Option<MatchCandidateResult> = None;
        for transaction in candidates {
            let Some(result) = self.scorer.score_profile(&profile, transaction) else {
                continue;
            };
            if best
                .as_ref()
                .is_none_or(|current| result.confidence > current.confidence)
            {
                best = Some(result);
            }
        }

        let best = best?;
        if best.confidence < self.acceptance_threshold {
            debug!(
                purchase_id = purchase.id,
                confidence = best.confidence,
                "best candidate below acceptance threshold"
            );
            return None;
        }
        Some(best)
    }
}

impl Default for MatchSelector {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}
