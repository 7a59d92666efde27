//! Per-run bookkeeping of claimed transactions and attachments

use std::collections::HashSet;

use crate::types::{RecordId, RecordKind};

/// Identifiers already paired during one matching run.
///
/// Each run owns its own registry; nothing is shared between runs. A
/// registry is either empty (fresh or after [`ClaimRegistry::reset`]) or
/// populated (after any claim).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimRegistry {
    transactions: HashSet<RecordId>,
    attachments: HashSet<RecordId>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as paired. Claiming twice is a no-op.
    pub fn claim(&mut self, kind: RecordKind, id: &RecordId) {
        if !self.is_claimed(kind, id) {
            self.set_mut(kind).insert(id.clone());
        }
    }

    pub fn is_claimed(&self, kind: RecordKind, id: &RecordId) -> bool {
        self.set(kind).contains(id)
    }

    /// Forget every claim
    pub fn reset(&mut self) {
        self.transactions.clear();
        self.attachments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.attachments.is_empty()
    }

    /// Number of claimed identifiers of `kind`
    pub fn claimed_count(&self, kind: RecordKind) -> usize {
        self.set(kind).len()
    }

    fn set(&self, kind: RecordKind) -> &HashSet<RecordId> {
        match kind {
            RecordKind::Transaction => &self.transactions,
            RecordKind::Attachment => &self.attachments,
        }
    }

    fn set_mut(&mut self, kind: RecordKind) -> &mut HashSet<RecordId> {
        match kind {
            RecordKind::Transaction => &mut self.transactions,
            RecordKind::Attachment => &mut self.attachments,
        }
    }
}
