//! Two-phase greedy search: exact reference first, best heuristic score second

use tracing::debug;

use crate::config::MatchingConfig;
use crate::reconciliation::registry::ClaimRegistry;
use crate::reconciliation::scoring::MatchScorer;
use crate::traits::MatchCandidate;
use crate::types::*;

/// A candidate picked (and claimed) by the matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMatch<'a, C> {
    pub candidate: &'a C,
    pub basis: MatchBasis,
}

/// Finds the best counterpart for one record among a candidate pool.
///
/// Both entry points follow the same policy:
///
/// 1. If the anchor has a normalized reference, the first unclaimed
///    candidate with the same normalized reference wins outright.
/// 2. Otherwise every unclaimed candidate is scored and the highest score
///    wins, earlier candidates winning ties. The winner is accepted only
///    if its score reaches `min_score`.
///
/// The winner is claimed in the registry before it is returned.
#[derive(Debug, Clone)]
pub struct GreedyMatcher {
    scorer: MatchScorer,
    min_score: u8,
}

impl Default for GreedyMatcher {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl GreedyMatcher {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            scorer: MatchScorer::new(config),
            min_score: config.min_score,
        }
    }

    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    /// Best attachment for `transaction`
    pub fn find_attachment<'a, I>(
        &self,
        transaction: &Transaction,
        candidates: I,
        registry: &mut ClaimRegistry,
    ) -> Option<CandidateMatch<'a, Attachment>>
    where
        I: IntoIterator<Item = &'a Attachment>,
        I::IntoIter: Clone,
    {
        self.search(transaction, candidates, registry, |attachment| {
            self.scorer.score(transaction, attachment)
        })
    }

    /// Best transaction for `attachment`
    pub fn find_transaction<'a, I>(
        &self,
        attachment: &Attachment,
        candidates: I,
        registry: &mut ClaimRegistry,
    ) -> Option<CandidateMatch<'a, Transaction>>
    where
        I: IntoIterator<Item = &'a Transaction>,
        I::IntoIter: Clone,
    {
        self.search(attachment, candidates, registry, |transaction| {
            self.scorer.score(transaction, attachment)
        })
    }

    fn search<'a, A, C, I, F>(
        &self,
        anchor: &A,
        candidates: I,
        registry: &mut ClaimRegistry,
        score: F,
    ) -> Option<CandidateMatch<'a, C>>
    where
        A: MatchCandidate,
        C: MatchCandidate + 'a,
        I: IntoIterator<Item = &'a C>,
        I::IntoIter: Clone,
        F: Fn(&C) -> u8,
    {
        let candidates = candidates.into_iter();

        let found = match anchor.normalized_reference() {
            Some(reference) => Self::reference_match(&reference, candidates.clone(), registry),
            None => None,
        }
        .or_else(|| self.best_scoring(candidates, registry, score))?;

        registry.claim(C::KIND, found.candidate.record_id());
        debug!(
            anchor_kind = %A::KIND,
            anchor = %anchor.record_id(),
            candidate = %found.candidate.record_id(),
            basis = %found.basis,
            "claimed candidate"
        );
        Some(found)
    }

    fn reference_match<'a, C, I>(
        reference: &str,
        candidates: I,
        registry: &ClaimRegistry,
    ) -> Option<CandidateMatch<'a, C>>
    where
        C: MatchCandidate + 'a,
        I: Iterator<Item = &'a C>,
    {
        candidates
            .filter(|c| !registry.is_claimed(C::KIND, c.record_id()))
            .find(|c| c.normalized_reference().as_deref() == Some(reference))
            .map(|candidate| CandidateMatch {
                candidate,
                basis: MatchBasis::Reference,
            })
    }

    fn best_scoring<'a, C, I, F>(
        &self,
        candidates: I,
        registry: &ClaimRegistry,
        score: F,
    ) -> Option<CandidateMatch<'a, C>>
    where
        C: MatchCandidate + 'a,
        I: Iterator<Item = &'a C>,
        F: Fn(&C) -> u8,
    {
        let mut best: Option<(&'a C, u8)> = None;
        for candidate in candidates {
            if registry.is_claimed(C::KIND, candidate.record_id()) {
                continue;
            }
            let candidate_score = score(candidate);
            // Strictly greater: the earliest candidate keeps a tie.
            if candidate_score > best.map_or(0, |(_, s)| s) {
                best = Some((candidate, candidate_score));
            }
        }

        best.filter(|(_, s)| *s >= self.min_score)
            .map(|(candidate, s)| CandidateMatch {
                candidate,
                basis: MatchBasis::Score(s),
            })
    }
}
