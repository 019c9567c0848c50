//! The matching waterfall, highest confidence first

use bigdecimal::BigDecimal;
use serde_json::json;
use std::collections::BTreeMap;

use crate::config::{MatchingConfig, ToleranceConfig, WeightConfig};
use crate::matching::{days_apart, PurchaseProfile};
use crate::traits::MatchStrategy;
use crate::types::*;

/// Scores are kept at two decimal places so that sums of weights compare
/// exactly against the acceptance threshold.
fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

fn amount_diff(profile: &PurchaseProfile<'_>, transaction: &Transaction) -> BigDecimal {
    (transaction.amount_major() - &profile.purchase.total).abs()
}

/// Order number from the purchase found in the transaction description,
/// with the amount agreeing to the cent.
///
/// Plain substring containment: a reference that also occurs in an
/// unrelated transaction is not disambiguated.
#[derive(Debug, Clone)]
pub struct OrderNumberStrategy {
    exact_amount: BigDecimal,
}

impl OrderNumberStrategy {
    /// Create the strategy with the exact-amount tolerance of `config`
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            exact_amount: config.tolerance.exact_amount.clone(),
        }
    }
}

impl MatchStrategy for OrderNumberStrategy {
    fn name(&self) -> &'static str {
        "order_number"
    }

    fn try_match(
        &self,
        profile: &PurchaseProfile<'_>,
        transaction: &Transaction,
    ) -> Option<MatchCandidateResult> {
        let order_number = profile.purchase.order_reference()?;
        if !transaction.mentions(order_number) {
            return None;
        }

        let diff = amount_diff(profile, transaction);
        if diff >= self.exact_amount {
            return None;
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("order_number".to_string(), json!(order_number));
        metadata.insert("amount_diff".to_string(), json!(diff.to_string()));

        Some(MatchCandidateResult {
            purchase_id: profile.purchase.id,
            transaction_id: transaction.id,
            confidence: 1.0,
            criteria: vec![MatchCriterion::OrderNumber, MatchCriterion::Amount],
            metadata,
        })
    }
}

/// Weighted sum of amount, date and card-suffix signals.
///
/// The amount signal is mandatory: anything further off than the close
/// tolerance is rejected before the other signals are looked at.
#[derive(Debug, Clone)]
pub struct WeightedStrategy {
    tolerance: ToleranceConfig,
    weights: WeightConfig,
    acceptance_threshold: f64,
}

impl WeightedStrategy {
    /// Create the strategy with the tolerances, weights and threshold of `config`
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            tolerance: config.tolerance.clone(),
            weights: config.weights.clone(),
            acceptance_threshold: config.acceptance_threshold,
        }
    }
}

impl MatchStrategy for WeightedStrategy {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn try_match(
        &self,
        profile: &PurchaseProfile<'_>,
        transaction: &Transaction,
    ) -> Option<MatchCandidateResult> {
        let mut criteria = Vec::new();
        let mut score = 0.0;

        let diff = amount_diff(profile, transaction);
        if diff < self.tolerance.exact_amount {
            criteria.push(MatchCriterion::AmountExact);
            score += self.weights.amount_exact;
        } else if diff < self.tolerance.close_amount {
            criteria.push(MatchCriterion::AmountClose);
            score += self.weights.amount_close;
        } else {
            return None;
        }

        let date_diff = days_apart(profile.purchase, transaction);
        if date_diff == 0 {
            criteria.push(MatchCriterion::DateSameDay);
            score += self.weights.date_same_day;
        } else if date_diff <= self.tolerance.near_date_days {
            criteria.push(MatchCriterion::DateWithin3Days);
            score += self.weights.date_near;
        }

        if let Some(last_four) = profile.last_four.as_deref() {
            if transaction.account_identifier.contains(last_four) {
                criteria.push(MatchCriterion::LastFour);
                score += self.weights.last_four;
            }
        }

        let score = round_score(score);
        if score < self.acceptance_threshold {
            return None;
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("amount_diff".to_string(), json!(diff.to_string()));
        metadata.insert("date_diff_days".to_string(), json!(date_diff));
        metadata.insert("is_automated".to_string(), json!(profile.is_automated));

        Some(MatchCandidateResult {
            purchase_id: profile.purchase.id,
            transaction_id: transaction.id,
            confidence: score,
            criteria,
            metadata,
        })
    }
}

/// Correlation through purchase confirmation emails.
///
/// No email data source is wired in yet, so this never matches.
#[derive(Debug, Clone, Default)]
pub struct EmailMetadataStrategy;

impl MatchStrategy for EmailMetadataStrategy {
    fn name(&self) -> &'static str {
        "email_metadata"
    }

    fn try_match(
        &self,
        _profile: &PurchaseProfile<'_>,
        _transaction: &Transaction,
    ) -> Option<MatchCandidateResult> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn purchase(total: &str, day: u32) -> Purchase {
        Purchase::new(
            1,
            BigDecimal::from_str(total).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, day)
                .unwrap()
                .and_hms_opt(16, 45, 0)
                .unwrap(),
        )
    }

    fn txn(amount: i64, day: u32) -> Transaction {
        Transaction::new(9, amount, NaiveDate::from_ymd_opt(2026, 2, day).unwrap())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_order_number_match() {
        let config = MatchingConfig::default();
        let p = purchase("150.00", 1).with_reference("ORD123");
        let profile = PurchaseProfile::new(&p, &config);
        let t = txn(-15000, 4).with_description("Payment ORD123 processed");

        let result = OrderNumberStrategy::new(&config)
            .try_match(&profile, &t)
            .unwrap();
        assert_eq!(result.confidence, 1.0);
        assert_eq!(
            result.criteria,
            vec![MatchCriterion::OrderNumber, MatchCriterion::Amount]
        );
        assert_eq!(result.metadata["order_number"], json!("ORD123"));
    }

    #[test]
    fn test_order_number_in_extended_description() {
        let config = MatchingConfig::default();
        let p = purchase("150.00", 1).with_reference("ORD123");
        let profile = PurchaseProfile::new(&p, &config);
        let t = txn(15000, 1)
            .with_description("CARD PURCHASE")
            .with_extended_description("merchant ref ORD123");

        assert!(OrderNumberStrategy::new(&config)
            .try_match(&profile, &t)
            .is_some());
    }

    #[test]
    fn test_order_number_requires_exact_amount() {
        let config = MatchingConfig::default();
        let p = purchase("150.00", 1).with_reference("ORD123");
        let profile = PurchaseProfile::new(&p, &config);
        let strategy = OrderNumberStrategy::new(&config);

        assert!(strategy
            .try_match(&profile, &txn(15001, 1).with_description("ORD123"))
            .is_none());
        assert!(strategy
            .try_match(&profile, &txn(15000, 1).with_description("ORD124"))
            .is_none());

        let no_ref = purchase("150.00", 1);
        let profile = PurchaseProfile::new(&no_ref, &config);
        assert!(strategy
            .try_match(&profile, &txn(15000, 1).with_description("ORD123"))
            .is_none());
    }

    #[test]
    fn test_weighted_below_floor() {
        let config = MatchingConfig::default();
        let p = purchase("75.00", 1);
        let profile = PurchaseProfile::new(&p, &config);

        // 0.40 exact amount + 0.30 same day = 0.70 < 0.75
        assert!(WeightedStrategy::new(&config)
            .try_match(&profile, &txn(7500, 1))
            .is_none());
    }

    #[test]
    fn test_weighted_with_last_four() {
        let config = MatchingConfig::default();
        let p = purchase("75.00", 1).with_notes("CC# 4242");
        let profile = PurchaseProfile::new(&p, &config);
        let t = txn(7500, 1).with_account("Venture X ...4242");

        let result = WeightedStrategy::new(&config)
            .try_match(&profile, &t)
            .unwrap();
        assert_close(result.confidence, 0.90);
        assert_eq!(
            result.criteria,
            vec![
                MatchCriterion::AmountExact,
                MatchCriterion::DateSameDay,
                MatchCriterion::LastFour
            ]
        );
        let diff = result.metadata["amount_diff"].as_str().unwrap();
        assert_eq!(BigDecimal::from_str(diff).unwrap(), BigDecimal::from(0));
        assert_eq!(result.metadata["date_diff_days"], json!(0));
        assert_eq!(result.metadata["is_automated"], json!(false));
    }

    #[test]
    fn test_weighted_close_amount_and_near_date() {
        let config = MatchingConfig::default();
        let p = purchase("75.00", 1).with_notes("#4242");
        let profile = PurchaseProfile::new(&p, &config);
        let strategy = WeightedStrategy::new(&config);

        // 0.40 + 0.20 + 0.20
        let t = txn(7500, 4).with_account("x4242");
        let result = strategy.try_match(&profile, &t).unwrap();
        assert_close(result.confidence, 0.80);
        assert!(result.has_criterion(MatchCriterion::DateWithin3Days));

        // 0.20 + 0.30 + 0.20 = 0.70
        let t = txn(7550, 1).with_account("x4242");
        assert!(strategy.try_match(&profile, &t).is_none());

        // date too far for any date signal: 0.40 + 0.20
        let t = txn(7500, 5).with_account("x4242");
        assert!(strategy.try_match(&profile, &t).is_none());
    }

    #[test]
    fn test_weighted_rejects_large_amount_gap() {
        let config = MatchingConfig::default();
        let p = purchase("75.00", 1).with_notes("CC 4242");
        let profile = PurchaseProfile::new(&p, &config);
        let t = txn(7600, 1).with_account("4242");

        assert!(WeightedStrategy::new(&config)
            .try_match(&profile, &t)
            .is_none());
    }

    #[test]
    fn test_weighted_is_monotonic() {
        let config = MatchingConfig::default();
        let strategy = WeightedStrategy::new(&MatchingConfig {
            acceptance_threshold: 0.0,
            ..config.clone()
        });
        let p = purchase("75.00", 1).with_notes("CC# 4242");
        let profile = PurchaseProfile::new(&p, &config);

        let amount_only = strategy.try_match(&profile, &txn(7500, 9)).unwrap();
        let with_date = strategy.try_match(&profile, &txn(7500, 1)).unwrap();
        let with_all = strategy
            .try_match(&profile, &txn(7500, 1).with_account("4242"))
            .unwrap();

        assert_close(amount_only.confidence, 0.40);
        assert!(with_date.confidence > amount_only.confidence);
        assert!(with_all.confidence > with_date.confidence);
        assert!(with_all.confidence < 1.0);
    }

    #[test]
    fn test_email_strategy_never_matches() {
        let config = MatchingConfig::default();
        let p = purchase("75.00", 1).with_notes("buyer@example.com");
        let profile = PurchaseProfile::new(&p, &config);

        assert!(EmailMetadataStrategy
            .try_match(&profile, &txn(7500, 1))
            .is_none());
    }
}
