//! Question answering over reconciliation results
//!
//! The engine never talks to a model directly: [`QaContext`] narrows a run
//! down to an allow-listed bundle and an [`AnsweringService`] turns that
//! bundle plus a question into an answer.

#[cfg(feature = "llm")]
pub mod client;
pub mod context;

#[cfg(feature = "llm")]
pub use client::*;
pub use context::*;

use crate::reconciliation::ReconciliationReport;
use crate::traits::AnsweringService;
use crate::types::ReconResult;

/// Ask `service` a question about `report`.
///
/// The answer is returned exactly as the service produced it. A failing
/// service is reported once; retries are left to the caller.
pub async fn ask(
    service: &dyn AnsweringService,
    report: &ReconciliationReport,
    question: &str,
) -> ReconResult<String> {
    let request = QaContext::from_report(report).with_question(question);
    service.answer(&request).await
}
