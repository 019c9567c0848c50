//! Matching thresholds and weights
//!
//! Defaults reproduce the production tuning. A TOML document may override
//! any subset of fields; decimal tolerances are written as strings so they
//! keep their exact value:
//!
//! ```toml
//! acceptance_threshold = 0.8
//! exclusive_claims = true
//!
//! [tolerance]
//! close_amount = "0.50"
//! ```

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::validation::*;

fn cents(value: i64) -> BigDecimal {
    BigDecimal::new(value.into(), 2)
}

/// Full matching configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub tolerance: ToleranceConfig,
    pub weights: WeightConfig,
    /// Minimum confidence for a match to be accepted
    pub acceptance_threshold: f64,
    /// `created_by` values that mark a purchase as system-automated
    pub automated_creators: Vec<String>,
    /// Remove a transaction from later purchases' pools once claimed.
    /// Off by default: several purchases may select the same transaction.
    pub exclusive_claims: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tolerance: ToleranceConfig::default(),
            weights: WeightConfig::default(),
            acceptance_threshold: 0.75,
            automated_creators: vec![
                "SeatScouts".to_string(),
                "Lotus Tickets Sale Tracking".to_string(),
            ],
            exclusive_claims: false,
        }
    }
}

impl MatchingConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml_str: &str) -> ReconResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ReconError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and that the candidate filter never drops a match the
    /// scorer would accept
    pub fn validate(&self) -> ReconResult<()> {
        let t = &self.tolerance;
        validate_non_negative_amount("tolerance.exact_amount", &t.exact_amount)?;
        validate_non_negative_amount("tolerance.close_amount", &t.close_amount)?;
        validate_non_negative_amount("tolerance.candidate_amount", &t.candidate_amount)?;
        validate_day_window("tolerance.near_date_days", t.near_date_days)?;
        validate_day_window("tolerance.candidate_date_days", t.candidate_date_days)?;
        validate_window_covers(
            "tolerance.close_amount",
            &t.close_amount,
            "tolerance.exact_amount",
            &t.exact_amount,
        )?;
        validate_window_covers(
            "tolerance.candidate_amount",
            &t.candidate_amount,
            "tolerance.close_amount",
            &t.close_amount,
        )?;
        validate_window_covers(
            "tolerance.candidate_date_days",
            &t.candidate_date_days,
            "tolerance.near_date_days",
            &t.near_date_days,
        )?;

        let w = &self.weights;
        validate_unit_interval("weights.amount_exact", w.amount_exact)?;
        validate_unit_interval("weights.amount_close", w.amount_close)?;
        validate_unit_interval("weights.date_same_day", w.date_same_day)?;
        validate_unit_interval("weights.date_near", w.date_near)?;
        validate_unit_interval("weights.last_four", w.last_four)?;
        validate_unit_interval("acceptance_threshold", self.acceptance_threshold)?;

        if w.max_score() > 1.0 {
            return Err(ReconError::Validation(format!(
                "weighted score can reach {:.2}, above 1.0",
                w.max_score()
            )));
        }

        Ok(())
    }

    /// Whether a creator name marks the purchase as automated
    pub fn is_automated_creator(&self, created_by: &str) -> bool {
        self.automated_creators.iter().any(|c| c == created_by)
    }
}

/// Amount and date windows. Comparisons on amounts are strict (`<`),
/// comparisons on days are inclusive (`<=`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Amount difference treated as an exact match
    pub exact_amount: BigDecimal,
    /// Amount difference treated as a close match
    pub close_amount: BigDecimal,
    /// Coarse amount window used before scoring
    pub candidate_amount: BigDecimal,
    /// Days apart still counted as "near"
    pub near_date_days: i64,
    /// Coarse day window used before scoring
    pub candidate_date_days: i64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            exact_amount: cents(1),
            close_amount: cents(100),
            candidate_amount: cents(500),
            near_date_days: 3,
            candidate_date_days: 7,
        }
    }
}

/// Contribution of each signal to the weighted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub amount_exact: f64,
    pub amount_close: f64,
    pub date_same_day: f64,
    pub date_near: f64,
    pub last_four: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            amount_exact: 0.40,
            amount_close: 0.20,
            date_same_day: 0.30,
            date_near: 0.20,
            last_four: 0.20,
        }
    }
}

impl WeightConfig {
    /// Highest score the weighted strategy can produce
    pub fn max_score(&self) -> f64 {
        self.amount_exact.max(self.amount_close)
            + self.date_same_day.max(self.date_near)
            + self.last_four
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_are_valid() {
        let config = MatchingConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.max_score() - 0.90).abs() < 1e-9);
        assert!(config.is_automated_creator("SeatScouts"));
        assert!(!config.is_automated_creator("alice"));
        assert!(!config.exclusive_claims);
    }

    #[test]
    fn test_partial_toml_override() {
        let config = MatchingConfig::from_toml_str(
            r#"
            acceptance_threshold = 0.8
            exclusive_claims = true

            [tolerance]
            close_amount = "0.50"
            "#,
        )
        .unwrap();

        assert_eq!(config.acceptance_threshold, 0.8);
        assert!(config.exclusive_claims);
        assert_eq!(
            config.tolerance.close_amount,
            BigDecimal::from_str("0.50").unwrap()
        );
        assert_eq!(config.tolerance.candidate_date_days, 7);
        assert_eq!(config.weights, WeightConfig::default());
    }

    #[test]
    fn test_filter_must_cover_scorer() {
        let err = MatchingConfig::from_toml_str(
            r#"
            [tolerance]
            candidate_date_days = 2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::Validation(_)));

        let err = MatchingConfig::from_toml_str(
            r#"
            [tolerance]
            candidate_amount = "0.50"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::Validation(_)));
    }

    #[test]
    fn test_rejects_weights_above_one() {
        let err = MatchingConfig::from_toml_str(
            r#"
            [weights]
            last_four = 0.4
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("above 1.0"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = MatchingConfig::from_toml_str("acceptance_threshold = [").unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
    }
}
