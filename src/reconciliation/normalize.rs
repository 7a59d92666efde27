//! Reference normalization and date parsing

use chrono::NaiveDate;

/// Layout accepted for every date field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonicalize a free-form reference for equality comparison.
///
/// Spaces are removed, then every `RF` (anywhere, not only as a prefix),
/// then leading zeros. Removing `RF` is repeated until none is left so the
/// result is a fixed point. An empty input or an empty result yields
/// `None`.
pub fn normalize_reference(reference: Option<&str>) -> Option<String> {
    let reference = reference.filter(|r| !r.is_empty())?;

    let mut compact: String = reference.chars().filter(|c| *c != ' ').collect();
    while compact.contains("RF") {
        compact = compact.replace("RF", "");
    }

    let normalized = compact.trim_start_matches('0');
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// A date string that does not follow [`DATE_FORMAT`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date '{0}' (expected YYYY-MM-DD)")]
pub struct InvalidDate(pub String);

/// Parse a `YYYY-MM-DD` date.
///
/// Missing or empty input yields `Ok(None)`. A present value in any other
/// layout is an error; callers attach the record context.
pub fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, InvalidDate> {
    match value.filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, DATE_FORMAT)
            .map(Some)
            .map_err(|_| InvalidDate(v.to_string())),
    }
}
