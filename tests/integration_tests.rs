//! Integration tests for reconciliation-core

use std::collections::HashSet;
use std::io::Write;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reconciliation_core::{
    ask, ingest, load_batch, normalize_reference, utils::ScriptedAnsweringService, Anchor,
    Attachment, AttachmentData, ClaimRegistry, MatchBasis, ReconConfig, ReconError,
    ReconciliationEngine, ReconciliationReport, RecordId, RecordKind, Transaction,
};
use serde_json::json;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn attachment(id: &str, data: AttachmentData) -> Attachment {
    Attachment::new(id, Some("invoice".to_string())).with_data(data)
}

/// Every pair is justified, no id is paired twice, and each side is partitioned
fn assert_report_invariants(
    engine: &ReconciliationEngine,
    report: &ReconciliationReport,
    transactions: &[Transaction],
    attachments: &[Attachment],
) {
    let min_score = engine.matcher().min_score();
    for pair in &report.matched {
        let tx_ref = normalize_reference(pair.transaction.reference.as_deref());
        let att_ref = normalize_reference(pair.attachment.data.reference.as_deref());
        let score = engine.matcher().scorer().score(&pair.transaction, &pair.attachment);
        assert!(
            (tx_ref.is_some() && tx_ref == att_ref) || score >= min_score,
            "pair {} <-> {} is neither reference-equal nor confident ({score})",
            pair.transaction.id,
            pair.attachment.id
        );
    }

    let matched_tx: Vec<_> = report.matched.iter().map(|p| &p.transaction.id).collect();
    let matched_att: Vec<_> = report.matched.iter().map(|p| &p.attachment.id).collect();
    assert_eq!(matched_tx.iter().collect::<HashSet<_>>().len(), matched_tx.len());
    assert_eq!(matched_att.iter().collect::<HashSet<_>>().len(), matched_att.len());

    let mut tx_ids: Vec<_> = matched_tx
        .into_iter()
        .chain(report.unmatched_transactions.iter().map(|t| &t.id))
        .collect();
    tx_ids.sort();
    let mut expected_tx: Vec<_> = transactions.iter().map(|t| &t.id).collect();
    expected_tx.sort();
    assert_eq!(tx_ids, expected_tx);

    let mut att_ids: Vec<_> = matched_att
        .into_iter()
        .chain(report.unmatched_attachments.iter().map(|a| &a.id))
        .collect();
    att_ids.sort();
    let mut expected_att: Vec<_> = attachments.iter().map(|a| &a.id).collect();
    expected_att.sort();
    assert_eq!(att_ids, expected_att);
}

#[test]
fn test_exact_reference_beats_amount_mismatch() {
    let transactions = vec![Transaction::new(1, BigDecimal::from(100))
        .with_reference("RF000123")
        .with_contact("Acme")];
    let attachments = vec![attachment(
        "a1",
        AttachmentData {
            reference: Some("0123".to_string()),
            total_amount: Some(BigDecimal::from(999)),
            ..Default::default()
        },
    )];

    let engine = ReconciliationEngine::default();
    let report = engine.reconcile(&transactions, &attachments);

    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].basis, MatchBasis::Reference);
    assert!(report.is_complete());
    assert_report_invariants(&engine, &report, &transactions, &attachments);
}

#[test]
fn test_heuristic_match_scores_all_signals() {
    let transactions = vec![Transaction::new(2, BigDecimal::from(250))
        .with_contact("John Smith")
        .with_date(date(2024, 3, 1))];
    let attachments = vec![attachment(
        "a2",
        AttachmentData {
            total_amount: Some(BigDecimal::from(250)),
            issuer: Some("John Smith Co".to_string()),
            due_date: Some(date(2024, 3, 5)),
            ..Default::default()
        },
    )];

    let engine = ReconciliationEngine::default();
    let report = engine.reconcile(&transactions, &attachments);

    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].basis, MatchBasis::Score(6));
}

#[test]
fn test_unrelated_records_stay_unmatched() {
    let transactions = vec![Transaction::new(3, BigDecimal::from(75)).with_contact("Zed")];
    let attachments = vec![attachment(
        "a3",
        AttachmentData {
            total_amount: Some(BigDecimal::from(500)),
            issuer: Some("Unrelated Co".to_string()),
            ..Default::default()
        },
    )];

    let engine = ReconciliationEngine::default();
    assert_eq!(engine.matcher().scorer().score(&transactions[0], &attachments[0]), 0);

    let report = engine.reconcile(&transactions, &attachments);
    assert!(report.matched.is_empty());
    assert_eq!(report.unmatched_transactions, transactions);
    assert_eq!(report.unmatched_attachments, attachments);
    assert!(!report.is_complete());
}

#[test]
fn test_earlier_transaction_takes_contested_attachment() {
    let transactions = vec![
        Transaction::new("t1", BigDecimal::from(-100))
            .with_contact("Acme")
            .with_date(date(2024, 6, 1)),
        Transaction::new("t2", BigDecimal::from(-100))
            .with_contact("Acme")
            .with_date(date(2024, 3, 4)),
    ];
    let attachments = vec![attachment(
        "a",
        AttachmentData {
            total_amount: Some(BigDecimal::from(100)),
            issuer: Some("ACME Oy".to_string()),
            due_date: Some(date(2024, 3, 5)),
            ..Default::default()
        },
    )];

    let engine = ReconciliationEngine::default();
    let scorer = engine.matcher().scorer();
    assert_eq!(scorer.score(&transactions[0], &attachments[0]), 5);
    assert_eq!(scorer.score(&transactions[1], &attachments[0]), 6);

    let report = engine.reconcile(&transactions, &attachments);
    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].transaction.id, RecordId::from("t1"));
    assert_eq!(report.matched[0].basis, MatchBasis::Score(5));
    assert_eq!(report.unmatched_transactions[0].id, RecordId::from("t2"));
    assert_report_invariants(&engine, &report, &transactions, &attachments);
}

#[test]
fn test_attachment_anchor_mirrors_batch() {
    let transactions = vec![
        Transaction::new(1, BigDecimal::from(-40)).with_contact("Corner Cafe"),
        Transaction::new(2, BigDecimal::from(-40)).with_contact("Corner Cafe"),
    ];
    let attachments = vec![Attachment::new("r1", Some("receipt".to_string())).with_data(
        AttachmentData {
            total_amount: Some(BigDecimal::from(40)),
            supplier: Some("corner cafe".to_string()),
            ..Default::default()
        },
    )];

    let config = ReconConfig::from_toml_str("[matching]\nanchor = \"attachments\"\n").unwrap();
    assert_eq!(config.matching.anchor, Anchor::Attachments);

    let engine = ReconciliationEngine::new(&config.matching);
    let report = engine.reconcile(&transactions, &attachments);

    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].transaction.id, RecordId::from(1));
    assert_eq!(report.unmatched_transactions.len(), 1);
    assert!(report.unmatched_attachments.is_empty());
    assert_report_invariants(&engine, &report, &transactions, &attachments);
}

#[test]
fn test_registry_reused_across_runs() {
    let transactions = vec![Transaction::new(1, BigDecimal::from(10)).with_reference("55")];
    let attachments = vec![attachment(
        "a1",
        AttachmentData {
            reference: Some("RF55".to_string()),
            ..Default::default()
        },
    )];

    let engine = ReconciliationEngine::default();
    let mut registry = ClaimRegistry::new();

    let first = engine.run(&transactions, &attachments, &mut registry);
    assert!(registry.is_claimed(RecordKind::Attachment, &RecordId::from("a1")));

    let second = engine.run(&transactions, &attachments, &mut registry);
    assert_eq!(first.matched.len(), 1);
    assert_eq!(second.matched.len(), 1);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn test_ingestion_isolates_bad_records() {
    let raw_transactions: Vec<serde_json::Value> = serde_json::from_value(json!([
        {"id": 1, "amount": -100.0, "reference": "RF000123"},
        {"id": 2, "amount": -50, "date": "01.03.2024"},
        {"amount": -10}
    ]))
    .unwrap();
    let raw_attachments: Vec<serde_json::Value> = serde_json::from_value(json!([
        {"id": "a1", "type": "invoice", "data": {"reference": "123"}},
        {"id": "a1", "type": "invoice", "data": {"reference": "999"}}
    ]))
    .unwrap();

    let ingested = ingest(raw_transactions, raw_attachments);
    assert_eq!(ingested.transactions.len(), 1);
    assert_eq!(ingested.attachments.len(), 1);
    assert_eq!(ingested.rejected.len(), 3);
    assert!(matches!(
        ingested.rejected[2].error,
        ReconError::DuplicateId { kind: RecordKind::Attachment, .. }
    ));

    let engine = ReconciliationEngine::default();
    let report = engine.reconcile(&ingested.transactions, &ingested.attachments);
    assert_eq!(report.matched.len(), 1);

    let err = ingested.into_strict().unwrap_err();
    assert!(matches!(
        err,
        ReconError::InvalidDateFormat { kind: RecordKind::Transaction, ref value, .. } if value == "01.03.2024"
    ));
}

#[test]
fn test_load_batch_and_config_from_files() {
    let mut transactions = NamedTempFile::new().unwrap();
    write!(
        transactions,
        "{}",
        json!([
            {"id": 7, "amount": "-1200.50", "date": "2024-03-15", "contact": "Globex"}
        ])
    )
    .unwrap();
    let mut attachments = NamedTempFile::new().unwrap();
    write!(
        attachments,
        "{}",
        json!([
            {"id": "inv-7", "type": "invoice", "data": {
                "total_amount": 1200.5, "recipient": "Globex Ltd", "invoicing_date": "2024-03-01"
            }}
        ])
    )
    .unwrap();
    let mut config_file = NamedTempFile::new().unwrap();
    write!(config_file, "[matching]\nmin_score = 6\ndate_window_days = 14\n").unwrap();

    let config = ReconConfig::from_file(config_file.path()).unwrap();
    let (transactions, attachments) = load_batch(transactions.path(), attachments.path())
        .unwrap()
        .into_strict()
        .unwrap();
    assert_eq!(
        transactions[0].amount,
        BigDecimal::from_str("-1200.50").unwrap()
    );

    let report = ReconciliationEngine::new(&config.matching).reconcile(&transactions, &attachments);
    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].basis, MatchBasis::Score(6));

    let strict_default = ReconciliationEngine::default().reconcile(&transactions, &attachments);
    assert_eq!(strict_default.matched[0].basis, MatchBasis::Score(5));
}

#[tokio::test]
async fn test_ask_sends_allow_listed_bundle() {
    let transactions = vec![
        Transaction::new(1, BigDecimal::from(-100))
            .with_reference("RF12")
            .with_contact("Acme")
            .with_date(date(2024, 3, 1)),
        Transaction::new(2, BigDecimal::from(-5)).with_contact("Kiosk"),
    ];
    let attachments = vec![
        attachment(
            "a1",
            AttachmentData {
                reference: Some("12".to_string()),
                ..Default::default()
            },
        ),
        attachment(
            "a2",
            AttachmentData {
                total_amount: Some(BigDecimal::from(300)),
                recipient: Some("Initech".to_string()),
                due_date: Some(date(2024, 4, 1)),
                ..Default::default()
            },
        ),
    ];

    let report = ReconciliationEngine::default().reconcile(&transactions, &attachments);
    let service = ScriptedAnsweringService::new("Transaction 2 is unmatched.");

    let answer = ask(&service, &report, "What is unmatched?").await.unwrap();
    assert_eq!(answer, "Transaction 2 is unmatched.");

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let sent = serde_json::to_value(&requests[0]).unwrap();
    assert_eq!(
        sent,
        json!({
            "matched": [
                {"transaction_id": 1, "attachment_id": "a1", "amount": -100, "contact": "Acme"}
            ],
            "unmatched_transactions": [
                {"id": 2, "amount": -5, "contact": "Kiosk"}
            ],
            "unmatched_attachments": [
                {"id": "a2", "type": "invoice", "amount": 300, "reference": null, "counterparty": "Initech"}
            ],
            "question": "What is unmatched?"
        })
    );
}

#[tokio::test]
async fn test_ask_propagates_service_failure() {
    let report = ReconciliationEngine::default().reconcile(&[], &[]);
    let service = ScriptedAnsweringService::failing("connection refused");

    let err = ask(&service, &report, "Anything?").await.unwrap_err();
    assert!(matches!(err, ReconError::Answering(msg) if msg == "connection refused"));
}
