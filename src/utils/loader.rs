//! Reading input collections from JSON files

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::types::*;
use crate::utils::validation::{ingest, IngestReport};

/// Read a JSON array of records from `path`
pub fn load_json_array<T: DeserializeOwned>(path: impl AsRef<Path>) -> ReconResult<Vec<T>> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ReconError::Json(format!("{}: {e}", path.display())))
}

/// Load and validate both collections.
///
/// A file that cannot be read or is not a JSON array fails the whole
/// batch. Elements are decoded one by one, so individual bad records,
/// including ones with fields of the wrong JSON type, end up in
/// [`IngestReport::rejected`].
pub fn load_batch(
    transactions_path: impl AsRef<Path>,
    attachments_path: impl AsRef<Path>,
) -> ReconResult<IngestReport> {
    let raw_transactions: Vec<Value> = load_json_array(transactions_path)?;
    let raw_attachments: Vec<Value> = load_json_array(attachments_path)?;

    let report = ingest(raw_transactions, raw_attachments);
    info!(
        transactions = report.transactions.len(),
        attachments = report.attachments.len(),
        rejected = report.rejected.len(),
        "Loaded input records"
    );
    Ok(report)
}
