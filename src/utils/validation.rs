//! Ingestion boundary: raw JSON-shaped records to validated records

use std::collections::HashSet;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::reconciliation::normalize::parse_date;
use crate::reconciliation::scoring::MAX_AMOUNT_SCALE;
use crate::types::*;

/// An amount as it appears in the input: a JSON number or a decimal string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl RawAmount {
    fn as_text(&self) -> String {
        match self {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s.trim().to_string(),
        }
    }
}

/// A transaction exactly as supplied; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub id: Option<RecordId>,
    pub amount: Option<RawAmount>,
    pub date: Option<String>,
    pub reference: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAttachmentData {
    pub total_amount: Option<RawAmount>,
    pub due_date: Option<String>,
    pub invoicing_date: Option<String>,
    pub reference: Option<String>,
    pub issuer: Option<String>,
    pub recipient: Option<String>,
    pub supplier: Option<String>,
}

/// An attachment exactly as supplied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAttachment {
    pub id: Option<RecordId>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: RawAttachmentData,
}

/// A record that failed validation, with where it came from
#[derive(Debug)]
pub struct RejectedRecord {
    pub kind: RecordKind,
    /// Position in the input collection
    pub index: usize,
    pub id: Option<RecordId>,
    pub error: ReconError,
}

/// Result of validating both input collections
#[derive(Debug, Default)]
pub struct IngestReport {
    pub transactions: Vec<Transaction>,
    pub attachments: Vec<Attachment>,
    /// Transactions first, then attachments, each in input order
    pub rejected: Vec<RejectedRecord>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// All-or-nothing view: the first rejected record fails the whole batch
    pub fn into_strict(self) -> ReconResult<(Vec<Transaction>, Vec<Attachment>)> {
        match self.rejected.into_iter().next() {
            Some(rejected) => Err(rejected.error),
            None => Ok((self.transactions, self.attachments)),
        }
    }
}

/// Validate both collections, isolating failures per record.
///
/// Each element is decoded on its own, so a record with a field of the
/// wrong JSON type is rejected without affecting its neighbours. Valid
/// records keep their relative input order. A record whose identifier was
/// already accepted earlier in the same collection is rejected.
pub fn ingest(raw_transactions: Vec<Value>, raw_attachments: Vec<Value>) -> IngestReport {
    let mut report = IngestReport::default();

    let kind = RecordKind::Transaction;
    let mut seen = HashSet::new();
    for (index, value) in raw_transactions.into_iter().enumerate() {
        let id = peek_id(&value);
        let validated = decode::<RawTransaction>(kind, index, value)
            .and_then(|raw| validate_transaction(index, raw))
            .and_then(|tx| unique(&mut seen, tx));
        match validated {
            Ok(tx) => report.transactions.push(tx),
            Err(error) => reject(&mut report, kind, index, id, error),
        }
    }

    let kind = RecordKind::Attachment;
    let mut seen = HashSet::new();
    for (index, value) in raw_attachments.into_iter().enumerate() {
        let id = peek_id(&value);
        let validated = decode::<RawAttachment>(kind, index, value)
            .and_then(|raw| validate_attachment(index, raw))
            .and_then(|att| unique(&mut seen, att));
        match validated {
            Ok(att) => report.attachments.push(att),
            Err(error) => reject(&mut report, kind, index, id, error),
        }
    }

    report
}

fn decode<T: DeserializeOwned>(kind: RecordKind, index: usize, value: Value) -> ReconResult<T> {
    serde_json::from_value(value).map_err(|e| ReconError::MalformedRecord {
        kind,
        index,
        message: e.to_string(),
    })
}

/// Identifier of a record that may not decode as a whole
fn peek_id(value: &Value) -> Option<RecordId> {
    value.get("id").and_then(|id| RecordId::deserialize(id).ok())
}

/// Validate one transaction; `index` is its input position
pub fn validate_transaction(index: usize, raw: RawTransaction) -> ReconResult<Transaction> {
    let kind = RecordKind::Transaction;
    let id = required_id(kind, index, raw.id)?;
    let amount = raw.amount.ok_or(ReconError::MissingRequiredField {
        kind,
        index,
        field: "amount",
    })?;

    Ok(Transaction {
        amount: parse_amount(kind, &id, "amount", &amount)?,
        date: date_field(kind, &id, "date", raw.date.as_deref())?,
        reference: raw.reference,
        contact: raw.contact,
        id,
    })
}

/// Validate one attachment; `index` is its input position
pub fn validate_attachment(index: usize, raw: RawAttachment) -> ReconResult<Attachment> {
    let kind = RecordKind::Attachment;
    let id = required_id(kind, index, raw.id)?;
    let data = raw.data;

    let total_amount = match &data.total_amount {
        Some(amount) => Some(parse_amount(kind, &id, "total_amount", amount)?),
        None => None,
    };

    Ok(Attachment {
        kind: raw.kind,
        data: AttachmentData {
            total_amount,
            due_date: date_field(kind, &id, "due_date", data.due_date.as_deref())?,
            invoicing_date: date_field(kind, &id, "invoicing_date", data.invoicing_date.as_deref())?,
            reference: data.reference,
            issuer: data.issuer,
            recipient: data.recipient,
            supplier: data.supplier,
        },
        id,
    })
}

fn required_id(kind: RecordKind, index: usize, id: Option<RecordId>) -> ReconResult<RecordId> {
    match id {
        Some(RecordId::Text(text)) if text.trim().is_empty() => {
            Err(ReconError::MissingRequiredField { kind, index, field: "id" })
        }
        Some(id) => Ok(id),
        None => Err(ReconError::MissingRequiredField { kind, index, field: "id" }),
    }
}

fn parse_amount(
    kind: RecordKind,
    id: &RecordId,
    field: &'static str,
    amount: &RawAmount,
) -> ReconResult<BigDecimal> {
    let text = amount.as_text();
    match BigDecimal::from_str(&text) {
        Ok(value) if value.as_bigint_and_exponent().1.abs() <= MAX_AMOUNT_SCALE => Ok(value),
        _ => Err(ReconError::InvalidAmount {
            kind,
            record: id.to_string(),
            field,
            value: text,
        }),
    }
}

fn date_field(
    kind: RecordKind,
    id: &RecordId,
    field: &'static str,
    value: Option<&str>,
) -> ReconResult<Option<chrono::NaiveDate>> {
    parse_date(value).map_err(|invalid| ReconError::InvalidDateFormat {
        kind,
        record: id.to_string(),
        field,
        value: invalid.0,
    })
}

fn unique<T: crate::traits::MatchCandidate>(
    seen: &mut HashSet<RecordId>,
    record: T,
) -> ReconResult<T> {
    if seen.insert(record.record_id().clone()) {
        Ok(record)
    } else {
        Err(ReconError::DuplicateId {
            kind: T::KIND,
            record: record.record_id().to_string(),
        })
    }
}

fn reject(
    report: &mut IngestReport,
    kind: RecordKind,
    index: usize,
    id: Option<RecordId>,
    error: ReconError,
) {
    warn!(%kind, index, error = %error, "Rejected input record");
    report.rejected.push(RejectedRecord {
        kind,
        index,
        id,
        error,
    });
}
