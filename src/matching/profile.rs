//! Per-purchase signals extracted once before scoring

use crate::config::MatchingConfig;
use crate::types::Purchase;
use crate::utils::extraction::{event_keywords, extract_email, extract_last_four};

/// A purchase together with the signals parsed out of its free-text fields
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseProfile<'a> {
    pub purchase: &'a Purchase,
    /// Buyer email found in the notes
    pub email: Option<String>,
    /// Card suffix found in the notes
    pub last_four: Option<String>,
    /// Distinctive words of the event name
    pub event_keywords: Vec<String>,
    /// Created by one of the configured automation accounts
    pub is_automated: bool,
}

impl<'a> PurchaseProfile<'a> {
    /// Extract all signals of `purchase`
    pub fn new(purchase: &'a Purchase, config: &MatchingConfig) -> Self {
        Self {
            purchase,
            email: extract_email(&purchase.notes),
            last_four: extract_last_four(&purchase.notes),
            event_keywords: event_keywords(&purchase.event_name),
            is_automated: config.is_automated_creator(&purchase.created_by),
        }
    }
}
