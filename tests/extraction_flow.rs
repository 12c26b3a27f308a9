//! End-to-end extraction pipeline tests over in-memory pattern data:
//! candidate resolution, normalization with defaults, category inference,
//! and bulk aggregation invariants.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use smsledger::models::bank::Bank;
use smsledger::models::extraction::SmsItem;
use smsledger::models::pattern::{
    MessageSubtype, MessageType, Pattern, PatternStatus, TransactionType,
};
use smsledger::services::batch::extract_batch_with;
use smsledger::services::extraction::resolve;

const BUDGET: Duration = Duration::from_millis(250);

fn bank(name: &str) -> Bank {
    Bank {
        id: Uuid::new_v4(),
        name: name.to_string(),
        created_at: Utc::now(),
    }
}

fn pattern(bank_id: Uuid, expression: &str) -> Pattern {
    Pattern {
        id: Uuid::new_v4(),
        bank_id: Some(bank_id),
        expression: expression.to_string(),
        sample_text: None,
        sender_title: None,
        bank_name: None,
        merchant_name: None,
        tx_type: None,
        msg_type: None,
        msg_subtype: None,
        status: PatternStatus::Approved,
        owner_id: None,
        reviewer_id: None,
        supersedes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn full_extraction_with_defaults_and_typed_fields() {
    let hdfc = bank("HDFCBK");
    let mut p = pattern(
        hdfc.id,
        r"Rs\.(?<amount>[\d,]+(\.\d{2})?) (?<msgType>debited|credited) from A/c (?<accountNumber>\w+) on (?<date>[\d-]+\w*-\d+) to (?<merchantName>\w+) ref (?<referenceNumber>\d+)",
    );
    p.bank_name = Some("HDFC".to_string());
    p.tx_type = Some(TransactionType::Upi);

    let sms = "Rs.1,499.00 debited from A/c XX1234 on 10-Jan-26 to ZOMATO ref 987654";
    let resolution = resolve(&[hdfc], &[p], &[], "AD-HDFCBK-S", sms, BUDGET).await;
    let r = resolution.result;

    assert!(r.matched);
    assert_eq!(r.amount, Some(Decimal::new(149900, 2)));
    assert_eq!(r.account_number.as_deref(), Some("XX1234"));
    assert_eq!(r.date.as_deref(), Some("10-Jan-26"));
    assert_eq!(r.reference_no.as_deref(), Some("987654"));
    assert_eq!(r.msg_type, Some(MessageType::Debited));
    assert!(r.parsed_msg_type);
    // Defaults, with provenance false.
    assert_eq!(r.bank_name.as_deref(), Some("HDFC"));
    assert!(!r.parsed_bank_name);
    assert_eq!(r.tx_type, Some(TransactionType::Upi));
    assert!(!r.parsed_tx_type);
    // Category inferred from the captured merchant.
    assert_eq!(r.merchant_name.as_deref(), Some("ZOMATO"));
    assert_eq!(r.msg_subtype, Some(MessageSubtype::Food));
    assert!(r.parsed_msg_subtype);
}

#[tokio::test]
async fn first_candidate_in_order_wins_deterministically() {
    let sbi = bank("SBIBNK");
    let mut newer = pattern(sbi.id, r"(?<amount>\d+)");
    newer.merchant_name = Some("FIRST".to_string());
    let mut older = pattern(sbi.id, r"(?<amount>\d+)");
    older.merchant_name = Some("SECOND".to_string());

    // Both match; the one listed first (most recently updated, as the store
    // orders them) must win, every time.
    for _ in 0..3 {
        let resolution = resolve(
            &[sbi.clone()],
            &[newer.clone(), older.clone()],
            &[],
            "SBIBNK",
            "500 debited",
            BUDGET,
        )
        .await;
        assert_eq!(resolution.result.pattern_id, Some(newer.id));
        assert_eq!(resolution.result.merchant_name.as_deref(), Some("FIRST"));
    }
}

#[tokio::test]
async fn miss_reports_resolution_stage() {
    let sbi = bank("SBIBNK");
    let p = pattern(sbi.id, r"impossible (?<amount>\d+) never");

    let no_bank = resolve(&[sbi.clone()], &[p.clone()], &[], "VM-PAYTM", "x", BUDGET).await;
    assert!(no_bank.result.message.contains("No bank found"));
    assert!(no_bank.bank_id.is_none());

    let no_match = resolve(&[sbi.clone()], &[p], &[], "SBIBNK", "Rs.10 debited", BUDGET).await;
    assert_eq!(
        no_match.result.message,
        "no matching pattern found for this SMS"
    );
    assert_eq!(no_match.bank_id, Some(sbi.id));
}

#[tokio::test]
async fn bulk_report_holds_invariants_across_mixed_items() {
    let hdfc = bank("HDFCBK");
    let sbi = bank("SBIBNK");
    let patterns = vec![
        pattern(hdfc.id, r"Rs\.(?<amount>[\d.]+) debited"),
        pattern(sbi.id, r"INR (?<amount>[\d.]+) credited"),
    ];

    let items = vec![
        SmsItem {
            sms_title: "AD-HDFCBK".into(),
            sms: "Rs.500.00 debited".into(),
        },
        SmsItem {
            sms_title: "??".into(),
            sms: String::new(), // missing sms
        },
        SmsItem {
            sms_title: "AD-SBIBNK".into(),
            sms: "INR 250.00 credited".into(),
        },
        SmsItem {
            sms_title: "VM-OTHERS".into(),
            sms: "unknown sender".into(),
        },
    ];

    let report = extract_batch_with(
        items,
        Arc::new(vec![hdfc, sbi]),
        Arc::new(patterns),
        Arc::new(Vec::new()),
        4,
        BUDGET,
    )
    .await;

    assert_eq!(report.total_count, 4);
    assert_eq!(report.success_count + report.failed_count, 4);
    assert_eq!(report.success_count, 2);

    let indices: Vec<usize> = report.results.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    assert!(report.results[0].outcome.matched);
    assert_eq!(report.results[1].outcome.message, "sms is required");
    assert!(report.results[2].outcome.matched);
    assert!(!report.results[3].outcome.matched);

    // Input echo is preserved for traceability.
    assert_eq!(report.results[3].sms_title, "VM-OTHERS");
    assert_eq!(report.results[3].sms, "unknown sender");
}

#[tokio::test]
async fn bulk_isolates_a_poison_pattern() {
    let icici = bank("ICICIB");
    let broken = pattern(icici.id, r"(?<amount>\d+"); // unbalanced paren
    let good = pattern(icici.id, r"(?<amount>\d+) debited");

    let items: Vec<SmsItem> = (0..8)
        .map(|i| SmsItem {
            sms_title: "ICICIB".into(),
            sms: format!("{i}00 debited"),
        })
        .collect();

    let report = extract_batch_with(
        items,
        Arc::new(vec![icici]),
        Arc::new(vec![broken, good]),
        Arc::new(Vec::new()),
        3,
        BUDGET,
    )
    .await;

    // The broken pattern is skipped per item; the good one still extracts.
    assert_eq!(report.total_count, 8);
    assert_eq!(report.success_count, 8);
    assert_eq!(report.failed_count, 0);
}
