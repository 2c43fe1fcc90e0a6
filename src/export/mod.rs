//! Append-only CSV output for the list workflow.
//!
//! One file, one header, records grouped by chemical. A blank line goes in
//! front of each batch appended to an already-existing file; it is a
//! readability convention, not structure, so it is written straight to the
//! file handle rather than as a CSV record (a record with one empty field
//! would come out quoted).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::core::types::SupplierRecord;

const HEADER: [&str; 4] = ["chemical", "supplier_name", "company_type", "country"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv write failed: {0}")]
    Write(#[from] csv::Error),

    #[error("file write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Append one chemical's batch of records to `path`.
///
/// An empty batch is a no-op (logged, nothing written, the file is not even
/// created). The header row is written only when the file does not yet
/// exist; an existing file gets exactly one blank line before the new batch.
/// Returns the number of data rows written.
pub fn append_records(path: &Path, records: &[SupplierRecord]) -> Result<usize, ExportError> {
    if records.is_empty() {
        info!("no matching suppliers for this chemical; nothing to append");
        return Ok(0);
    }

    let existed = path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ExportError::Open {
            path: path.display().to_string(),
            source,
        })?;

    if existed {
        // Blank line between chemical groups.
        writeln!(file)?;
    }

    let mut writer = csv::Writer::from_writer(file);

    if !existed {
        writer.write_record(HEADER)?;
    }

    for record in records {
        writer.write_record([
            record.chemical.as_str(),
            record.supplier_name.as_str(),
            record.company_type.as_str(),
            record.country.as_str(),
        ])?;
    }

    writer.flush()?;
    info!("appended {} rows to {}", records.len(), path.display());
    Ok(records.len())
}
