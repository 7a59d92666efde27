//! Traits for the matching seams and the external answering collaborator

use async_trait::async_trait;

use crate::qa::QaRequest;
use crate::reconciliation::normalize::normalize_reference;
use crate::types::*;

/// A record the two-phase search can anchor on or pick from.
///
/// Implemented by both [`Transaction`] and [`Attachment`] so one search
/// routine serves both matching directions.
pub trait MatchCandidate {
    /// Which registry set this record is claimed in
    const KIND: RecordKind;

    /// Identifier used for exclusivity bookkeeping
    fn record_id(&self) -> &RecordId;

    /// Raw, un-normalized reference
    fn raw_reference(&self) -> Option<&str>;

    /// Reference in canonical form, if any remains after normalization
    fn normalized_reference(&self) -> Option<String> {
        normalize_reference(self.raw_reference())
    }
}

impl MatchCandidate for Transaction {
    const KIND: RecordKind = RecordKind::Transaction;

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn raw_reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl MatchCandidate for Attachment {
    const KIND: RecordKind = RecordKind::Attachment;

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn raw_reference(&self) -> Option<&str> {
        self.data.reference.as_deref()
    }
}

/// Free-text question answering over a reconciliation result.
///
/// Implementations receive only the allow-listed bundle built by
/// [`crate::qa::QaContext`] and return the answer verbatim. They
/// are expected to answer from the given data alone and to say so when
/// the data is insufficient. Retries and timeouts are the implementation's
/// concern; callers invoke this once per question.
#[async_trait]
pub trait AnsweringService: Send + Sync {
    /// Answer the question carried in `request`
    async fn answer(&self, request: &QaRequest) -> ReconResult<String>;
}
