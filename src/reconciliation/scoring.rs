//! Heuristic confidence score between a transaction and an attachment

use bigdecimal::BigDecimal;

use crate::config::MatchingConfig;
use crate::types::*;

/// Points for an amount match
pub const AMOUNT_POINTS: u8 = 3;
/// Points for a counterparty name match
pub const COUNTERPARTY_POINTS: u8 = 2;
/// Points for a date within the proximity window
pub const DATE_POINTS: u8 = 1;
/// Highest reachable score
pub const MAX_SCORE: u8 = AMOUNT_POINTS + COUNTERPARTY_POINTS + DATE_POINTS;

/// Largest decimal exponent, either sign, accepted for amounts and the epsilon.
///
/// Amount comparison aligns scales, so its cost grows with the exponent gap.
pub const MAX_AMOUNT_SCALE: i64 = 18;

/// Which signals contributed to a score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub amount: bool,
    pub counterparty: bool,
    pub date: bool,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        let mut score = 0;
        if self.amount {
            score += AMOUNT_POINTS;
        }
        if self.counterparty {
            score += COUNTERPARTY_POINTS;
        }
        if self.date {
            score += DATE_POINTS;
        }
        score
    }
}

/// Additive scorer over amount, counterparty and date signals.
///
/// Missing fields withhold their points; scoring never fails.
#[derive(Debug, Clone)]
pub struct MatchScorer {
    amount_epsilon: BigDecimal,
    date_window_days: i64,
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl MatchScorer {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            amount_epsilon: config.amount_epsilon.clone(),
            date_window_days: config.date_window_days,
        }
    }

    /// Score in `0..=MAX_SCORE`
    pub fn score(&self, transaction: &Transaction, attachment: &Attachment) -> u8 {
        self.breakdown(transaction, attachment).total()
    }

    pub fn breakdown(&self, transaction: &Transaction, attachment: &Attachment) -> ScoreBreakdown {
        ScoreBreakdown {
            amount: self.amount_matches(transaction, attachment),
            counterparty: names_overlap(transaction.contact_name(), attachment.counterparty()),
            date: self.dates_close(transaction, attachment),
        }
    }

    /// The transaction's absolute amount equals the document total
    fn amount_matches(&self, transaction: &Transaction, attachment: &Attachment) -> bool {
        match &attachment.data.total_amount {
            Some(total) => (transaction.amount.abs() - total).abs() < self.amount_epsilon,
            None => false,
        }
    }

    /// The transaction date lies within the window of the nearest document date
    fn dates_close(&self, transaction: &Transaction, attachment: &Attachment) -> bool {
        let Some(booked) = transaction.date else {
            return false;
        };
        attachment
            .reference_dates()
            .map(|d| (booked - d).num_days().abs())
            .min()
            .is_some_and(|closest| closest <= self.date_window_days)
    }
}

/// Case-insensitive containment in either direction
fn names_overlap(contact: Option<&str>, counterparty: Option<&str>) -> bool {
    let (Some(contact), Some(counterparty)) = (contact, counterparty) else {
        return false;
    };
    let contact = contact.to_lowercase();
    let counterparty = counterparty.to_lowercase();
    contact.contains(&counterparty) || counterparty.contains(&contact)
}
