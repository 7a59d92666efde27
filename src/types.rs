//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a transaction or attachment.
///
/// Source systems hand out either numeric or textual identifiers, so both
/// are accepted as-is. Identifiers of different shapes never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric identifier (e.g. bank transaction ids)
    Number(i64),
    /// Textual identifier (e.g. document ids)
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        RecordId::Number(i64::from(value))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

/// The two kinds of records taking part in a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A bank transaction
    Transaction,
    /// A supporting document (invoice, receipt, ...)
    Attachment,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Transaction => write!(f, "transaction"),
            RecordKind::Attachment => write!(f, "attachment"),
        }
    }
}

/// A validated bank transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier of the transaction
    pub id: RecordId,
    /// Signed amount; outgoing payments are negative
    pub amount: BigDecimal,
    /// Booking date
    pub date: Option<NaiveDate>,
    /// Free-form payment reference
    pub reference: Option<String>,
    /// Name of the other party as shown on the statement
    pub contact: Option<String>,
}

impl Transaction {
    /// Create a transaction with only the required fields set
    pub fn new(id: impl Into<RecordId>, amount: BigDecimal) -> Self {
        Self {
            id: id.into(),
            amount,
            date: None,
            reference: None,
            contact: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Contact name, if present and non-empty
    pub fn contact_name(&self) -> Option<&str> {
        non_empty(self.contact.as_deref())
    }
}

/// Document payload of an attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentData {
    /// Total amount to be paid (invoice) or already paid (receipt)
    pub total_amount: Option<BigDecimal>,
    pub due_date: Option<NaiveDate>,
    pub invoicing_date: Option<NaiveDate>,
    /// Payment reference printed on the document
    pub reference: Option<String>,
    pub issuer: Option<String>,
    pub recipient: Option<String>,
    pub supplier: Option<String>,
}

/// A validated supporting document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier of the attachment
    pub id: RecordId,
    /// Document type tag (invoice, receipt, ...); informational only
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Extracted document fields
    pub data: AttachmentData,
}

impl Attachment {
    /// Create an attachment with an empty payload
    pub fn new(id: impl Into<RecordId>, kind: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            data: AttachmentData::default(),
        }
    }

    pub fn with_data(mut self, data: AttachmentData) -> Self {
        self.data = data;
        self
    }

    /// Name of the other party on the document.
    ///
    /// Resolved from issuer, then recipient, then supplier; the first
    /// non-empty value wins.
    pub fn counterparty(&self) -> Option<&str> {
        non_empty(self.data.issuer.as_deref())
            .or_else(|| non_empty(self.data.recipient.as_deref()))
            .or_else(|| non_empty(self.data.supplier.as_deref()))
    }

    /// Dates the transaction date is compared against
    pub fn reference_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.data.due_date.into_iter().chain(self.data.invoicing_date)
    }
}

/// How a pair was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBasis {
    /// Normalized references were equal
    Reference,
    /// Heuristic score reached the confidence threshold
    Score(u8),
}

impl fmt::Display for MatchBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchBasis::Reference => write!(f, "reference"),
            MatchBasis::Score(score) => write!(f, "score {score}"),
        }
    }
}

/// A transaction paired with the attachment that documents it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub transaction: Transaction,
    pub attachment: Attachment,
    pub basis: MatchBasis,
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Errors that can occur while reconciling
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("{kind} #{index}: missing required field '{field}'")]
    MissingRequiredField {
        kind: RecordKind,
        index: usize,
        field: &'static str,
    },
    #[error("{kind} {record}: invalid date '{value}' in field '{field}' (expected YYYY-MM-DD)")]
    InvalidDateFormat {
        kind: RecordKind,
        record: String,
        field: &'static str,
        value: String,
    },
    #[error("{kind} {record}: invalid amount '{value}' in field '{field}'")]
    InvalidAmount {
        kind: RecordKind,
        record: String,
        field: &'static str,
        value: String,
    },
    #[error("{kind} #{index}: malformed record: {message}")]
    MalformedRecord {
        kind: RecordKind,
        index: usize,
        message: String,
    },
    #[error("{kind} {record}: identifier appears more than once")]
    DuplicateId { kind: RecordKind, record: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Answering service error: {0}")]
    Answering(String),
}

impl From<std::io::Error> for ReconError {
    fn from(err: std::io::Error) -> Self {
        ReconError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(err: serde_json::Error) -> Self {
        ReconError::Json(err.to_string())
    }
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
