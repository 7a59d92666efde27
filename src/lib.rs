//! # Reconciliation Core
//!
//! Pairs bank transactions with the invoices and receipts that document
//! them, and answers questions about the outcome.
//!
//! ## Features
//!
//! - **Reference matching**: payment references are normalized (spaces, `RF`
//!   markers and leading zeros removed) and compared exactly
//! - **Heuristic scoring**: amount, counterparty name and date proximity
//!   combine into a 0-6 confidence score
//! - **One-to-one pairing**: a per-run claim registry keeps every record in
//!   at most one pair
//! - **Typed ingestion**: JSON-shaped input is validated once, with
//!   failures isolated per record
//! - **Question answering**: an allow-listed view of a run can be handed to
//!   any [`AnsweringService`], including OpenAI-compatible chat endpoints
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{Attachment, AttachmentData, MatchBasis, ReconciliationEngine, Transaction};
//! use bigdecimal::BigDecimal;
//!
//! let transactions = vec![Transaction::new(1, BigDecimal::from(-100)).with_reference("RF000123")];
//! let attachments = vec![Attachment::new("a1", Some("invoice".to_string())).with_data(
//!     AttachmentData {
//!         reference: Some("0123".to_string()),
//!         ..Default::default()
//!     },
//! )];
//!
//! let report = ReconciliationEngine::default().reconcile(&transactions, &attachments);
//! assert_eq!(report.matched.len(), 1);
//! assert_eq!(report.matched[0].basis, MatchBasis::Reference);
//! ```

pub mod config;
pub mod qa;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use qa::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;

// Ingestion entry points
pub use utils::loader::load_batch;
pub use utils::validation::{ingest, IngestReport, RawAttachment, RawTransaction, RejectedRecord};
