//! Allow-listed projection of a run for the answering service

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize, Serializer};

use crate::reconciliation::ReconciliationReport;
use crate::types::*;

/// A matched pair as seen by the answering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEntry {
    pub transaction_id: RecordId,
    pub attachment_id: RecordId,
    /// Transaction amount
    #[serde(serialize_with = "amount_as_number")]
    pub amount: BigDecimal,
    /// Transaction contact
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedTransactionEntry {
    pub id: RecordId,
    #[serde(serialize_with = "amount_as_number")]
    pub amount: BigDecimal,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedAttachmentEntry {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Document total
    #[serde(serialize_with = "optional_amount_as_number")]
    pub amount: Option<BigDecimal>,
    pub reference: Option<String>,
    /// Resolved issuer/recipient/supplier
    pub counterparty: Option<String>,
}

/// Amounts go out as JSON numbers: whole values as integers, others as floats
fn amount_as_number<S: Serializer>(amount: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.is_integer() {
        if let Some(whole) = amount.with_scale(0).to_i64() {
            return serializer.serialize_i64(whole);
        }
    }
    match amount.to_f64() {
        Some(value) if value.is_finite() => serializer.serialize_f64(value),
        _ => serializer.collect_str(amount),
    }
}

fn optional_amount_as_number<S: Serializer>(
    amount: &Option<BigDecimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match amount {
        Some(amount) => amount_as_number(amount, serializer),
        None => serializer.serialize_none(),
    }
}

/// Everything the answering service is allowed to see about a run.
///
/// Only the fields listed on the entry types are carried over; the service
/// cannot refer to anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaContext {
    pub matched: Vec<MatchedEntry>,
    pub unmatched_transactions: Vec<UnmatchedTransactionEntry>,
    pub unmatched_attachments: Vec<UnmatchedAttachmentEntry>,
}

impl QaContext {
    pub fn build(
        matched: &[MatchedPair],
        unmatched_transactions: &[Transaction],
        unmatched_attachments: &[Attachment],
    ) -> Self {
        Self {
            matched: matched
                .iter()
                .map(|pair| MatchedEntry {
                    transaction_id: pair.transaction.id.clone(),
                    attachment_id: pair.attachment.id.clone(),
                    amount: pair.transaction.amount.clone(),
                    contact: pair.transaction.contact.clone(),
                })
                .collect(),
            unmatched_transactions: unmatched_transactions
                .iter()
                .map(|tx| UnmatchedTransactionEntry {
                    id: tx.id.clone(),
                    amount: tx.amount.clone(),
                    contact: tx.contact.clone(),
                })
                .collect(),
            unmatched_attachments: unmatched_attachments
                .iter()
                .map(|att| UnmatchedAttachmentEntry {
                    id: att.id.clone(),
                    kind: att.kind.clone(),
                    amount: att.data.total_amount.clone(),
                    reference: att.data.reference.clone(),
                    counterparty: att.counterparty().map(str::to_string),
                })
                .collect(),
        }
    }

    pub fn from_report(report: &ReconciliationReport) -> Self {
        Self::build(
            &report.matched,
            &report.unmatched_transactions,
            &report.unmatched_attachments,
        )
    }

    /// Attach the caller's question
    pub fn with_question(self, question: impl Into<String>) -> QaRequest {
        QaRequest {
            context: self,
            question: question.into(),
        }
    }
}

/// The bundle handed to an [`crate::AnsweringService`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRequest {
    #[serde(flatten)]
    pub context: QaContext,
    pub question: String,
}
