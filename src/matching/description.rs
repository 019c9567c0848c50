//! Exact description lane
//!
//! Some portal transactions carry `range_matches` sub-descriptions copied
//! from the purchase line items. When a line description equals one of them
//! the pairing is certain without any scoring. This lane runs beside the
//! scored waterfall and is not consulted by [`crate::matching::BatchReconciler`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::*;

/// A purchase line whose description equals a transaction sub-description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionMatch {
    pub purchase_id: i64,
    pub transaction_id: i64,
    /// The shared description, trimmed
    pub line_description: String,
}

/// One record per (line, sub-description) pair with equal trimmed,
/// non-empty text; a transaction repeating the description yields repeats
pub fn match_by_description(
    purchases: &[Purchase],
    transactions: &[Transaction],
) -> Vec<DescriptionMatch> {
    let mut matches = Vec::new();

    for purchase in purchases {
        for line in &purchase.lines {
            let line_description = line.description.trim();
            if line_description.is_empty() {
                continue;
            }

            for transaction in transactions {
                let hits = transaction
                    .range_matches
                    .iter()
                    .map(|rm| rm.description.trim())
                    .filter(|d| !d.is_empty() && *d == line_description);

                for _ in hits {
                    matches.push(DescriptionMatch {
                        purchase_id: purchase.id,
                        transaction_id: transaction.id,
                        line_description: line_description.to_string(),
                    });
                }
            }
        }
    }

    matches
}

/// Sorted, de-duplicated purchase ids found by the description lane
pub fn matched_purchase_ids(matches: &[DescriptionMatch]) -> Vec<i64> {
    let mut ids: Vec<i64> = matches.iter().map(|m| m.purchase_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Ids of the purchases the description lane found nothing for, in input order
pub fn unmatched_purchase_ids(purchases: &[Purchase], matches: &[DescriptionMatch]) -> Vec<i64> {
    let matched: HashSet<i64> = matches.iter().map(|m| m.purchase_id).collect();
    purchases
        .iter()
        .map(|p| p.id)
        .filter(|id| !matched.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn purchase(id: i64) -> Purchase {
        Purchase::new(
            id,
            BigDecimal::from(100),
            NaiveDate::from_ymd_opt(2026, 1, 27)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    fn txn(id: i64) -> Transaction {
        Transaction::new(id, 10000, NaiveDate::from_ymd_opt(2026, 1, 28).unwrap())
    }

    #[test]
    fn test_trimmed_exact_match() {
        let purchases = vec![
            purchase(1).with_line("  Sec 101 Row 5 Seats 1-2 "),
            purchase(2).with_line("Sec 101 Row 5"),
        ];
        let transactions = vec![
            txn(10).with_range_match("Sec 101 Row 5 Seats 1-2"),
            txn(11).with_range_match("sec 101 row 5 seats 1-2"),
        ];

        let matches = match_by_description(&purchases, &transactions);
        assert_eq!(
            matches,
            vec![DescriptionMatch {
                purchase_id: 1,
                transaction_id: 10,
                line_description: "Sec 101 Row 5 Seats 1-2".to_string(),
            }]
        );
    }

    #[test]
    fn test_blank_descriptions_never_match() {
        let purchases = vec![purchase(1).with_line("   ")];
        let transactions = vec![txn(10).with_range_match("   "), txn(11)];

        assert!(match_by_description(&purchases, &transactions).is_empty());
    }

    #[test]
    fn test_matched_ids_are_unique_and_sorted() {
        let purchases = vec![
            purchase(3).with_line("A").with_line("B"),
            purchase(1).with_line("C"),
        ];
        let transactions = vec![
            txn(10).with_range_match("A").with_range_match("C"),
            txn(11).with_range_match("B"),
        ];

        let matches = match_by_description(&purchases, &transactions);
        assert_eq!(matches.len(), 3);
        assert_eq!(matched_purchase_ids(&matches), vec![1, 3]);
    }

    #[test]
    fn test_repeated_sub_description_yields_one_record_each() {
        let purchases = vec![purchase(1).with_line("GA Floor")];
        let transactions = vec![txn(10)
            .with_range_match("GA Floor")
            .with_range_match(" GA Floor ")
            .with_range_match("Balcony")];

        let matches = match_by_description(&purchases, &transactions);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.transaction_id == 10));
        assert_eq!(matched_purchase_ids(&matches), vec![1]);
    }

    #[test]
    fn test_unmatched_ids_complement_matched() {
        let purchases = vec![
            purchase(5).with_line("A"),
            purchase(2).with_line("Z"),
            purchase(9),
        ];
        let transactions = vec![txn(10).with_range_match("A")];

        let matches = match_by_description(&purchases, &transactions);
        assert_eq!(matched_purchase_ids(&matches), vec![5]);
        assert_eq!(unmatched_purchase_ids(&purchases, &matches), vec![2, 9]);
        assert_eq!(unmatched_purchase_ids(&purchases, &[]), vec![5, 2, 9]);
    }
}
