//! Matching engine: candidate filtering, scoring and per-purchase selection

pub mod batch;
pub mod description;
pub mod filter;
pub mod profile;
pub mod scorer;
pub mod selector;
pub mod strategies;

pub use batch::*;
pub use description::*;
pub use filter::*;
pub use profile::*;
pub use scorer::*;
pub use selector::*;
pub use strategies::*;

use crate::types::{Purchase, Transaction};

/// Whole calendar days between the purchase creation and the posting date
pub(crate) fn days_apart(purchase: &Purchase, transaction: &Transaction) -> i64 {
    (transaction.date - purchase.created_at.date())
        .num_days()
        .abs()
}
