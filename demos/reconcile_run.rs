//! Reconciliation run example over in-memory sources

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reconciliation_core::utils::{
    MemoryMatchApplier, MemoryPurchaseSource, MemoryTransactionSource,
};
use reconciliation_core::{
    match_by_description, CardMapping, MatchingConfig, Purchase, ReconciliationRun, RunWindow,
    Transaction,
};
use std::str::FromStr;

const CARD_MAPPING: &str = r#"{
    "Venture X 3969": {
        "account_name": "Venture X 3969",
        "last_four": "3969",
        "credit_card_group_id": 123,
        "credit_card_id": 456
    },
    "Amex Gold": {
        "account_name": "Amex Gold",
        "last_four": "1002",
        "credit_card_group_id": 123,
        "credit_card_id": 789
    }
}"#;

const CONFIG: &str = r#"
acceptance_threshold = 0.75
exclusive_claims = true
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reconciliation_core=info".parse()?),
        )
        .init();

    let day = |d: u32| NaiveDate::from_ymd_opt(2026, 1, d).ok_or("invalid date");
    let created = |d: u32, h: u32| -> Result<_, Box<dyn std::error::Error>> {
        Ok(day(d)?.and_hms_opt(h, 0, 0).ok_or("invalid time")?)
    };

    let purchases = vec![
        Purchase::new(1, BigDecimal::from_str("150.00")?, created(27, 10)?)
            .with_reference("ORD123")
            .with_line("Sec 112 Row 4 Seats 7-8"),
        Purchase::new(2, BigDecimal::from_str("75.00")?, created(27, 14)?)
            .with_notes("Paid CC: 1002, receipt to buyer@example.com"),
        Purchase::new(3, BigDecimal::from_str("42.50")?, created(27, 16)?)
            .with_creator("SeatScouts"),
    ];

    let transactions = vec![
        Transaction::new(101, -15000, day(28)?)
            .with_description("TICKET PURCHASE ORD123")
            .with_account("Venture X 3969")
            .with_range_match("Sec 112 Row 4 Seats 7-8"),
        Transaction::new(102, -7500, day(27)?)
            .with_description("VIVID SEATS")
            .with_account("Amex Gold 1002"),
        Transaction::new(103, -4300, day(30)?)
            .with_description("STUBHUB")
            .with_account("Venture X 3969"),
    ];

    println!("Exact description matches:");
    for m in match_by_description(&purchases, &transactions) {
        println!(
            "  purchase {} <-> transaction {} ({})",
            m.purchase_id, m.transaction_id, m.line_description
        );
    }
    println!();

    let config = MatchingConfig::from_toml_str(CONFIG)?;
    let card_mapping = CardMapping::from_json_str(CARD_MAPPING)?;
    let applier = MemoryMatchApplier::new();

    let run = ReconciliationRun::with_config(
        MemoryPurchaseSource::new(purchases),
        MemoryTransactionSource::new(transactions),
        applier.clone(),
        card_mapping,
        config,
    );
    let window = RunWindow::with_posting_lag(day(27)?, day(27)?, 3);

    let preview = run.execute(window, true).await;
    println!("{}", preview.summary());

    let live = run.execute(window, false).await;
    println!("{}", live.summary());

    for applied in applier.applied() {
        println!(
            "Applied: purchase {} -> transaction {} on card {}",
            applied.purchase_id, applied.transaction_id, applied.credit_card_id
        );
    }

    Ok(())
}
