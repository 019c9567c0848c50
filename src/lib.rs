//! # Reconciliation Core
//!
//! Matches unpaid ticketing purchases to credit-card transactions and
//! writes the resulting payment links back to the ticketing system.
//!
//! ## Features
//!
//! - **Candidate filtering**: Amount and date windows narrow the transactions per purchase
//! - **Strategy waterfall**: Order-number, weighted multi-factor and email strategies
//! - **Selection**: Best candidate above the acceptance threshold wins
//! - **Batch reconciliation**: Every purchase ends up matched or unmatched, never both
//! - **Runs**: Fetch, match, optionally apply, and summarize with per-match error capture
//! - **Source abstraction**: Purchase, transaction and update collaborators are traits
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{MatchSelector, MatchingConfig, Purchase, Transaction};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let created = NaiveDate::from_ymd_opt(2026, 1, 27)
//!     .unwrap()
//!     .and_hms_opt(11, 0, 0)
//!     .unwrap();
//! let purchase = Purchase::new(1, "150.00".parse::<BigDecimal>().unwrap(), created)
//!     .with_reference("ORD123");
//! let transaction = Transaction::new(101, 15000, NaiveDate::from_ymd_opt(2026, 1, 28).unwrap())
//!     .with_description("Ticket purchase ORD123");
//!
//! let selector = MatchSelector::new(MatchingConfig::default());
//! let best = selector.select(&purchase, &[&transaction]).unwrap();
//! assert_eq!(best.confidence, 1.0);
//! ```

pub mod config;
pub mod matching;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use matching::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
