//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::utils::extraction::{deserialize_date, deserialize_timestamp};

/// An unpaid purchase from the ticketing back-office
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique identifier assigned by the ticketing system
    pub id: i64,
    /// Amount owed in currency units
    pub total: BigDecimal,
    /// When the purchase was created (offset dropped, UTC wall-clock)
    #[serde(alias = "createdDate", deserialize_with = "deserialize_timestamp")]
    pub created_at: NaiveDateTime,
    /// Who created the purchase; some values mark automated purchases
    #[serde(default, alias = "createdBy")]
    pub created_by: String,
    /// Order number from the seller, if recorded
    #[serde(default, alias = "externalRef")]
    pub external_reference: Option<String>,
    /// Free-text notes, may embed an email address or card digits
    #[serde(default, alias = "internalNotes")]
    pub notes: String,
    #[serde(default, alias = "eventName")]
    pub event_name: String,
    /// Line items, only consulted by the description lane
    #[serde(default)]
    pub lines: Vec<PurchaseLine>,
}

impl Purchase {
    /// Create a purchase with the required fields; everything else is empty
    pub fn new(id: i64, total: BigDecimal, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            total,
            created_at,
            created_by: String::new(),
            external_reference: None,
            notes: String::new(),
            event_name: String::new(),
            lines: Vec::new(),
        }
    }

    /// Set the external order reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }

    /// Set the free-text notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Set the creator name
    pub fn with_creator(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Add a line item
    pub fn with_line(mut self, description: impl Into<String>) -> Self {
        self.lines.push(PurchaseLine {
            description: description.into(),
        });
        self
    }

    /// The external reference, ignoring blank values
    pub fn order_reference(&self) -> Option<&str> {
        self.external_reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// Single line item of a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLine {
    #[serde(default)]
    pub description: String,
}

/// A banking transaction from the payment portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier assigned by the portal
    pub id: i64,
    /// Amount in minor units; the sign carries no meaning for matching
    pub amount: i64,
    /// Posting date; portal values may carry a time of day, which is dropped
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extended_description: Option<String>,
    /// Portal account the transaction posted to, resolved to a card via [`CardMapping`]
    #[serde(default, alias = "account__name")]
    pub account_identifier: String,
    /// Sub-descriptions used by the exact description lane
    #[serde(default)]
    pub range_matches: Vec<RangeMatch>,
}

impl Transaction {
    /// Create a transaction with the required fields; everything else is empty
    pub fn new(id: i64, amount: i64, date: NaiveDate) -> Self {
        Self {
            id,
            amount,
            date,
            description: String::new(),
            extended_description: None,
            account_identifier: String::new(),
            range_matches: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the extended description
    pub fn with_extended_description(mut self, description: impl Into<String>) -> Self {
        self.extended_description = Some(description.into());
        self
    }

    /// Set the account identifier
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account_identifier = account.into();
        self
    }

    /// Add a range match sub-description
    pub fn with_range_match(mut self, description: impl Into<String>) -> Self {
        self.range_matches.push(RangeMatch {
            description: description.into(),
        });
        self
    }

    /// Absolute amount in currency units (minor units / 100)
    pub fn amount_major(&self) -> BigDecimal {
        BigDecimal::new(self.amount.unsigned_abs().into(), 2)
    }

    /// Whether the order number occurs in either description field
    pub fn mentions(&self, token: &str) -> bool {
        self.description.contains(token)
            || self
                .extended_description
                .as_deref()
                .is_some_and(|d| d.contains(token))
    }
}

/// Sub-description attached to a portal transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeMatch {
    #[serde(default)]
    pub description: String,
}

/// Signal that contributed to a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCriterion {
    /// Order number found in the transaction description
    OrderNumber,
    /// Amount agreed alongside an order number
    Amount,
    AmountExact,
    AmountClose,
    DateSameDay,
    #[serde(rename = "date_within_3_days")]
    DateWithin3Days,
    /// Card suffix from the purchase notes found on the transaction account
    LastFour,
}

impl MatchCriterion {
    /// Tag used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchCriterion::OrderNumber => "order_number",
            MatchCriterion::Amount => "amount",
            MatchCriterion::AmountExact => "amount_exact",
            MatchCriterion::AmountClose => "amount_close",
            MatchCriterion::DateSameDay => "date_same_day",
            MatchCriterion::DateWithin3Days => "date_within_3_days",
            MatchCriterion::LastFour => "last_four",
        }
    }
}

impl std::fmt::Display for MatchCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored pairing of one purchase with one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidateResult {
    pub purchase_id: i64,
    pub transaction_id: i64,
    /// Matching certainty in [0, 1]
    pub confidence: f64,
    /// Signals that fired, in evaluation order
    pub criteria: Vec<MatchCriterion>,
    /// Diagnostic values (amount delta, order number, ...)
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl MatchCandidateResult {
    /// Whether a given signal contributed to this match
    pub fn has_criterion(&self, criterion: MatchCriterion) -> bool {
        self.criteria.contains(&criterion)
    }
}

/// Card details the apply collaborator needs to mark a purchase as paid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    pub account_name: String,
    #[serde(default)]
    pub last_four: Option<String>,
    pub credit_card_group_id: i64,
    pub credit_card_id: i64,
}

/// Portal account name to card lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardMapping {
    cards: HashMap<String, CardInfo>,
}

impl CardMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON object layout `{ "<account name>": { ...card... } }`
    pub fn from_json_str(json: &str) -> ReconResult<Self> {
        serde_json::from_str(json).map_err(|e| ReconError::CardMapping(e.to_string()))
    }

    /// Register a card under its account name
    pub fn insert(&mut self, card: CardInfo) {
        self.cards.insert(card.account_name.clone(), card);
    }

    /// Look up a card by portal account name
    pub fn by_account_name(&self, account_name: &str) -> Option<&CardInfo> {
        self.cards.get(account_name)
    }

    /// Look up a card by its last four digits
    pub fn by_last_four(&self, last_four: &str) -> Option<&CardInfo> {
        self.cards
            .values()
            .find(|card| card.last_four.as_deref() == Some(last_four))
    }

    /// Number of mapped accounts
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether no account is mapped
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl FromIterator<CardInfo> for CardMapping {
    fn from_iter<I: IntoIterator<Item = CardInfo>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for card in iter {
            mapping.insert(card);
        }
        mapping
    }
}

/// Aggregate outcome of one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Unique identifier for the run
    pub run_id: Uuid,
    /// When the result was produced
    pub timestamp: NaiveDateTime,
    /// Whether updates were skipped
    pub dry_run: bool,
    pub total_purchases: usize,
    pub total_transactions: usize,
    pub matches_found: usize,
    /// Matches successfully written back (always 0 in a dry run)
    pub matches_updated: usize,
    pub unmatched_purchases: usize,
    /// Ids of purchases with no confident match, oldest first
    pub unmatched_purchase_ids: Vec<i64>,
    /// `matches_found / total_purchases`, 0.0 when there were no purchases
    pub success_rate: f64,
    pub matches: Vec<MatchCandidateResult>,
    pub errors: Vec<String>,
}

impl ReconciliationResult {
    /// Result for a run that failed before any matching took place
    pub fn failed(dry_run: bool, error: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            timestamp: chrono::Utc::now().naive_utc(),
            dry_run,
            total_purchases: 0,
            total_transactions: 0,
            matches_found: 0,
            matches_updated: 0,
            unmatched_purchases: 0,
            unmatched_purchase_ids: Vec::new(),
            success_rate: 0.0,
            matches: Vec::new(),
            errors: vec![error],
        }
    }

    /// Whether the run finished without recording any error
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable report of the run
    pub fn summary(&self) -> String {
        const LISTED_MATCHES: usize = 10;

        let mut summary = format!(
            "TRANSACTION RECONCILIATION REPORT\n\n\
             Run: {}\n\
             Timestamp: {}\n\
             Mode: {}\n\n\
             SUMMARY\n\
             -------\n\
             Total Purchases:        {}\n\
             Total Transactions:     {}\n\
             Matches Found:          {}\n\
             Successfully Updated:   {}\n\
             Unmatched Purchases:    {}\n\n\
             Success Rate:           {:.1}%\n\n\
             MATCHED TRANSACTIONS\n\
             --------------------\n",
            self.run_id,
            self.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            if self.dry_run { "DRY RUN" } else { "LIVE" },
            self.total_purchases,
            self.total_transactions,
            self.matches_found,
            self.matches_updated,
            self.unmatched_purchases,
            self.success_rate * 100.0,
        );

        for m in self.matches.iter().take(LISTED_MATCHES) {
            let criteria: Vec<&str> = m.criteria.iter().map(MatchCriterion::as_str).collect();
            summary.push_str(&format!(
                "\n- Purchase {} <-> Transaction {}\n  Confidence: {:.1}%\n  Criteria: {}\n",
                m.purchase_id,
                m.transaction_id,
                m.confidence * 100.0,
                criteria.join(", ")
            ));
        }

        if self.matches.len() > LISTED_MATCHES {
            summary.push_str(&format!(
                "\n... and {} more matches\n",
                self.matches.len() - LISTED_MATCHES
            ));
        }

        if !self.errors.is_empty() {
            summary.push_str("\nERRORS\n------\n");
            for error in &self.errors {
                summary.push_str(&format!("- {error}\n"));
            }
        }

        summary
    }
}

/// Errors that can occur during reconciliation
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Fetch error: {0}")]
    Fetch(String),
    #[error("Apply error: {0}")]
    Apply(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Card mapping error: {0}")]
    CardMapping(String),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_amount_major_ignores_sign() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let debit = Transaction::new(1, -15000, date);
        let credit = Transaction::new(2, 15000, date);

        assert_eq!(debit.amount_major(), BigDecimal::from_str("150.00").unwrap());
        assert_eq!(debit.amount_major(), credit.amount_major());
        assert_eq!(
            Transaction::new(3, 7, date).amount_major(),
            BigDecimal::from_str("0.07").unwrap()
        );
    }

    #[test]
    fn test_mentions_checks_both_descriptions() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let txn = Transaction::new(1, 100, date)
            .with_description("CARD PAYMENT")
            .with_extended_description("Ref ORD-77");

        assert!(txn.mentions("ORD-77"));
        assert!(txn.mentions("CARD"));
        assert!(!txn.mentions("ORD-78"));
    }

    #[test]
    fn test_blank_reference_is_ignored() {
        let created = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let purchase = Purchase::new(1, BigDecimal::from(10), created).with_reference("  ");
        assert_eq!(purchase.order_reference(), None);

        let purchase = purchase.with_reference("ORD1");
        assert_eq!(purchase.order_reference(), Some("ORD1"));
    }

    #[test]
    fn test_purchase_deserializes_back_office_payload() {
        let json = r#"{
            "id": 42,
            "total": "150.00",
            "createdDate": "2026-02-01T18:30:00Z",
            "createdBy": "SeatScouts",
            "externalRef": "ORD123",
            "internalNotes": "buyer@example.com CC# 4242",
            "eventName": "Lakers vs Celtics"
        }"#;

        let purchase: Purchase = serde_json::from_str(json).unwrap();
        assert_eq!(purchase.id, 42);
        assert_eq!(purchase.total, BigDecimal::from(150));
        assert_eq!(
            purchase.created_at,
            NaiveDate::from_ymd_opt(2026, 2, 1)
                .unwrap()
                .and_hms_opt(18, 30, 0)
                .unwrap()
        );
        assert_eq!(purchase.order_reference(), Some("ORD123"));
        assert!(purchase.lines.is_empty());
    }

    #[test]
    fn test_transaction_date_accepts_time_of_day() {
        let json = r#"{
            "id": 7,
            "amount": -4250,
            "date": "2026-02-01T00:00:00",
            "description": "STUBHUB",
            "account__name": "Venture X 3969"
        }"#;

        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(txn.account_identifier, "Venture X 3969");

        let plain: Transaction =
            serde_json::from_str(r#"{"id": 8, "amount": 100, "date": "2026-02-03"}"#).unwrap();
        assert_eq!(plain.date, NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());

        let bad = serde_json::from_str::<Transaction>(r#"{"id": 9, "amount": 1, "date": "soon"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_criteria_serialize_as_tags() {
        let json = serde_json::to_string(&vec![
            MatchCriterion::OrderNumber,
            MatchCriterion::DateWithin3Days,
        ])
        .unwrap();
        assert_eq!(json, r#"["order_number","date_within_3_days"]"#);
    }

    #[test]
    fn test_card_mapping_lookup() {
        let mapping = CardMapping::from_json_str(
            r#"{
                "Venture X": {
                    "account_name": "Venture X",
                    "last_four": "3969",
                    "credit_card_group_id": 123,
                    "credit_card_id": 456
                }
            }"#,
        )
        .unwrap();

        assert_eq!(mapping.len(), 1);
        assert!(!mapping.is_empty());
        assert!(CardMapping::new().is_empty());
        assert_eq!(
            mapping.by_account_name("Venture X").map(|c| c.credit_card_id),
            Some(456)
        );
        assert_eq!(
            mapping.by_last_four("3969").map(|c| c.credit_card_group_id),
            Some(123)
        );
        assert!(mapping.by_last_four("0000").is_none());
        assert!(CardMapping::from_json_str("not json").is_err());
    }

    #[test]
    fn test_summary_lists_errors() {
        let result = ReconciliationResult::failed(true, "portal unavailable".to_string());
        let summary = result.summary();

        assert!(summary.contains("Mode: DRY RUN"));
        assert!(summary.contains("Success Rate:           0.0%"));
        assert!(summary.contains("- portal unavailable"));
        assert!(!result.is_clean());
    }
}
