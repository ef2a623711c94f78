//! CSV parser for the regional age-demographics feed.

use anyhow::{Context, Result};
use tracing::debug;

use crate::records::CaseRecord;

/// Decodes the fetched CSV body into typed [`CaseRecord`]s.
///
/// # Errors
///
/// Returns an error on the first row with a missing or malformed
/// `date`, `age`, `areaName` or `cases` value.
pub fn parse_cases(bytes: &[u8]) -> Result<Vec<CaseRecord>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut records = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record: CaseRecord =
            result.with_context(|| format!("malformed feed row at line {}", index + 2))?;
        records.push(record);
    }

    debug!(rows = records.len(), "Feed parsed");
    Ok(records)
}
