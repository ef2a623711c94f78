//! Persistence of raw and staged data outside the staging database.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::records::GrowthRow;

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        debug!(dir = %parent.display(), "Ensuring output directory");
        std::fs::create_dir_all(parent)?;
    }
    File::create(path).with_context(|| format!("failed to create '{}'", path.display()))
}

/// Writes growth rows to a CSV file with the staging table's column names.
///
/// Overwrites any existing file. Undefined growth rates become empty fields.
pub fn write_rows(path: impl AsRef<Path>, rows: &[GrowthRow]) -> Result<()> {
    let path = path.as_ref();
    let file = create_file(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "CSV export written");
    Ok(())
}

/// Saves a fetched feed body as-is.
pub fn write_raw(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut file = create_file(path)?;
    file.write_all(bytes)?;

    info!(path = %path.display(), bytes = bytes.len(), "Raw feed saved");
    Ok(())
}
