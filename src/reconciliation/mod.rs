//! Reconciliation runs: fetch, match, apply and summarize

pub mod run;

pub use run::*;
