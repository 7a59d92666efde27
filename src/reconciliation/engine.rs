//! Batch orchestration of a matching run

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::{Anchor, MatchingConfig};
use crate::reconciliation::matcher::GreedyMatcher;
use crate::reconciliation::registry::ClaimRegistry;
use crate::types::*;

/// Outcome of one matching run.
///
/// Every input record lands in exactly one of the three lists, each kept
/// in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub run_id: Uuid,
    pub matched: Vec<MatchedPair>,
    pub unmatched_transactions: Vec<Transaction>,
    pub unmatched_attachments: Vec<Attachment>,
}

impl ReconciliationReport {
    /// True when nothing was left unmatched on either side
    pub fn is_complete(&self) -> bool {
        self.unmatched_transactions.is_empty() && self.unmatched_attachments.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Run {}: {} matched ({} by reference), {} unmatched transactions, {} unmatched attachments",
            self.run_id,
            self.matched.len(),
            self.matched
                .iter()
                .filter(|p| p.basis == MatchBasis::Reference)
                .count(),
            self.unmatched_transactions.len(),
            self.unmatched_attachments.len()
        )
    }
}

/// Pairs transactions with attachments, one anchor at a time.
///
/// Assignment is greedy: anchors are visited in input order and each one
/// takes its best counterpart from whatever is still unpaired. An earlier
/// anchor can therefore take a counterpart that a later anchor would have
/// scored higher against; the result depends on input order and is not a
/// globally optimal assignment.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    matcher: GreedyMatcher,
    anchor: Anchor,
}

impl ReconciliationEngine {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            matcher: GreedyMatcher::new(config),
            anchor: config.anchor,
        }
    }

    pub fn matcher(&self) -> &GreedyMatcher {
        &self.matcher
    }

    /// Run with a registry private to this call
    pub fn reconcile(
        &self,
        transactions: &[Transaction],
        attachments: &[Attachment],
    ) -> ReconciliationReport {
        let mut registry = ClaimRegistry::new();
        self.run(transactions, attachments, &mut registry)
    }

    /// Run against a caller-owned registry.
    ///
    /// The registry is reset before scanning, so claims from an earlier run
    /// never suppress matches in this one. It holds this run's claims when
    /// the call returns.
    pub fn run(
        &self,
        transactions: &[Transaction],
        attachments: &[Attachment],
        registry: &mut ClaimRegistry,
    ) -> ReconciliationReport {
        registry.reset();
        let run_id = Uuid::new_v4();

        let report = match self.anchor {
            Anchor::Transactions => {
                self.anchor_on_transactions(run_id, transactions, attachments, registry)
            }
            Anchor::Attachments => {
                self.anchor_on_attachments(run_id, transactions, attachments, registry)
            }
        };

        info!(
            run_id = %run_id,
            anchor = ?self.anchor,
            transactions = transactions.len(),
            attachments = attachments.len(),
            matched = report.matched.len(),
            unmatched_transactions = report.unmatched_transactions.len(),
            unmatched_attachments = report.unmatched_attachments.len(),
            "reconciliation run finished"
        );
        report
    }

    fn anchor_on_transactions(
        &self,
        run_id: Uuid,
        transactions: &[Transaction],
        attachments: &[Attachment],
        registry: &mut ClaimRegistry,
    ) -> ReconciliationReport {
        let mut pool: Vec<&Attachment> = attachments.iter().collect();
        let mut matched = Vec::new();
        let mut unmatched_transactions = Vec::new();

        for transaction in transactions {
            if registry.is_claimed(RecordKind::Transaction, &transaction.id) {
                unmatched_transactions.push(transaction.clone());
                continue;
            }
            match self
                .matcher
                .find_attachment(transaction, pool.iter().copied(), registry)
            {
                Some(found) => {
                    registry.claim(RecordKind::Transaction, &transaction.id);
                    pool.retain(|a| !std::ptr::eq(*a, found.candidate));
                    matched.push(MatchedPair {
                        transaction: transaction.clone(),
                        attachment: found.candidate.clone(),
                        basis: found.basis,
                    });
                }
                None => unmatched_transactions.push(transaction.clone()),
            }
        }

        ReconciliationReport {
            run_id,
            matched,
            unmatched_transactions,
            unmatched_attachments: pool.into_iter().cloned().collect(),
        }
    }

    fn anchor_on_attachments(
        &self,
        run_id: Uuid,
        transactions: &[Transaction],
        attachments: &[Attachment],
        registry: &mut ClaimRegistry,
    ) -> ReconciliationReport {
        let mut pool: Vec<&Transaction> = transactions.iter().collect();
        let mut matched = Vec::new();
        let mut unmatched_attachments = Vec::new();

        for attachment in attachments {
            if registry.is_claimed(RecordKind::Attachment, &attachment.id) {
                unmatched_attachments.push(attachment.clone());
                continue;
            }
            match self
                .matcher
                .find_transaction(attachment, pool.iter().copied(), registry)
            {
                Some(found) => {
                    registry.claim(RecordKind::Attachment, &attachment.id);
                    pool.retain(|t| !std::ptr::eq(*t, found.candidate));
                    matched.push(MatchedPair {
                        transaction: found.candidate.clone(),
                        attachment: attachment.clone(),
                        basis: found.basis,
                    });
                }
                None => unmatched_attachments.push(attachment.clone()),
            }
        }

        ReconciliationReport {
            run_id,
            matched,
            unmatched_transactions: pool.into_iter().cloned().collect(),
            unmatched_attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn priced(id: &str, total: &str, issuer: &str) -> Attachment {
        Attachment::new(id, Some("invoice".to_string())).with_data(AttachmentData {
            total_amount: Some(dec(total)),
            issuer: Some(issuer.to_string()),
            ..Default::default()
        })
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> &RecordId) -> Vec<String> {
        items.iter().map(|i| id(i).to_string()).collect()
    }

    #[test]
    fn test_partition_keeps_input_order() {
        let transactions = vec![
            Transaction::new(1, dec("10")).with_contact("Nobody"),
            Transaction::new(2, dec("-20")).with_contact("Beta"),
            Transaction::new(3, dec("30")).with_contact("Nobody"),
            Transaction::new(4, dec("40")).with_contact("Alpha"),
        ];
        let attachments = vec![
            priced("a", "40", "Alpha"),
            priced("x", "99", "Unrelated"),
            priced("b", "20", "Beta"),
            priced("y", "98", "Unrelated"),
        ];

        let report = ReconciliationEngine::default().reconcile(&transactions, &attachments);

        let pairs: Vec<(String, String)> = report
            .matched
            .iter()
            .map(|p| (p.transaction.id.to_string(), p.attachment.id.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("2".to_string(), "b".to_string()),
                ("4".to_string(), "a".to_string())
            ]
        );
        assert_eq!(ids(&report.unmatched_transactions, |t| &t.id), vec!["1", "3"]);
        assert_eq!(ids(&report.unmatched_attachments, |a| &a.id), vec!["x", "y"]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_run_resets_stale_claims() {
        let transactions = vec![Transaction::new(1, dec("10")).with_contact("Alpha")];
        let attachments = vec![priced("a", "10", "Alpha")];

        let mut registry = ClaimRegistry::new();
        registry.claim(RecordKind::Attachment, &RecordId::from("a"));

        let report = ReconciliationEngine::default().run(&transactions, &attachments, &mut registry);
        assert_eq!(report.matched.len(), 1);
        assert!(report.is_complete());
        assert!(registry.is_claimed(RecordKind::Attachment, &RecordId::from("a")));
        assert!(registry.is_claimed(RecordKind::Transaction, &RecordId::from(1)));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let transactions = vec![
            Transaction::new(1, dec("10")).with_contact("Alpha"),
            Transaction::new(2, dec("10")).with_contact("Alpha"),
        ];
        let attachments = vec![priced("a", "10", "Alpha")];

        let engine = ReconciliationEngine::default();
        let mut registry = ClaimRegistry::new();
        let first = engine.run(&transactions, &attachments, &mut registry);
        let second = engine.run(&transactions, &attachments, &mut registry);
        assert_eq!(first.matched, second.matched);
        assert_eq!(first.unmatched_transactions, second.unmatched_transactions);
        assert_ne!(first.run_id, second.run_id);
    }

    #[test]
    fn test_anchor_on_attachments() {
        let transactions = vec![
            Transaction::new(1, dec("10")).with_contact("Alpha"),
            Transaction::new(2, dec("10")).with_contact("Alpha"),
        ];
        let attachments = vec![
            priced("weak", "10", "Nobody"),
            priced("strong", "10", "Alpha"),
        ];
        let config = MatchingConfig {
            anchor: Anchor::Attachments,
            ..Default::default()
        };

        let report = ReconciliationEngine::new(&config).reconcile(&transactions, &attachments);
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.matched[0].attachment.id, RecordId::from("strong"));
        assert_eq!(report.matched[0].transaction.id, RecordId::from(1));
        assert_eq!(ids(&report.unmatched_attachments, |a| &a.id), vec!["weak"]);
        assert_eq!(ids(&report.unmatched_transactions, |t| &t.id), vec!["2"]);
    }

    #[test]
    fn test_empty_inputs() {
        let report = ReconciliationEngine::default().reconcile(&[], &[]);
        assert!(report.matched.is_empty());
        assert!(report.is_complete());
    }

    #[test]
    fn test_summary_counts() {
        let transactions = vec![Transaction::new(1, dec("10")).with_reference("RF7")];
        let attachments = vec![Attachment::new("a", None).with_data(AttachmentData {
            reference: Some("007".to_string()),
            ..Default::default()
        })];
        let report = ReconciliationEngine::default().reconcile(&transactions, &attachments);
        assert!(report
            .summary()
            .ends_with("1 matched (1 by reference), 0 unmatched transactions, 0 unmatched attachments"));
    }
}
