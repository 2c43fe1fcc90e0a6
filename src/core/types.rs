use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Zero-based column indices for a supplier table, inferred once per table
/// instance. All three indices must resolve (by header match or positional
/// fallback) or the mapping is invalid and the table is skipped entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub name_idx: usize,
    pub country_idx: usize,
    pub type_idx: usize,
}

impl ColumnMapping {
    /// Highest index the mapping touches; rows with fewer cells are skipped.
    pub fn max_index(&self) -> usize {
        self.name_idx.max(self.country_idx).max(self.type_idx)
    }
}

/// Cells lifted out of one table row, before business filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSupplierRow {
    pub supplier_name: String,
    pub country: String,
    pub company_type: String,
}

/// A supplier row that survived filtering. Immutable unit of CSV output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierRecord {
    pub chemical: String,
    pub supplier_name: String,
    pub company_type: String,
    pub country: String,
}

/// Result of a successful download acquisition. The saved path is the
/// terminal state; nothing mutates the artifact afterwards.
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    /// Selector that triggered the download, or the reconstructed URL when
    /// the fallback path was taken.
    pub source: String,
    pub suggested_filename: String,
    pub saved_path: PathBuf,
}
