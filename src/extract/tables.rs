//! Supplier-table schema inference and record extraction.
//!
//! Works on a captured HTML snapshot (`scraper::Html`) rather than the live
//! DOM, so the whole layer is pure and testable without a browser. The
//! portal's tables are unlabeled or semi-labeled; column semantics are
//! inferred from header text, with a positional fallback that only fires
//! when a data row proves the table actually has at least three columns.
//!
//! The positional fallback (columns 0/1/2 = name/country/type) is
//! best-effort: nothing validates the semantics beyond the cell count, and
//! it can mis-map tables with unexpected layouts.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::debug;

use crate::core::types::{ColumnMapping, RawSupplierRow, SupplierRecord};

/// Marker phrases that identify a supplier table among all tables on the
/// page, matched case-insensitively against the flattened text.
const TABLE_MARKERS: &[&str] = &["company details", "type of company", "country"];

const NAME_KEYWORDS: &[&str] = &["company", "supplier", "name"];
const COUNTRY_KEYWORDS: &[&str] = &["country"];
const TYPE_KEYWORDS: &[&str] = &["type"];

static TABLE: OnceLock<Selector> = OnceLock::new();
static THEAD_TR: OnceLock<Selector> = OnceLock::new();
static TH: OnceLock<Selector> = OnceLock::new();
static TH_TD: OnceLock<Selector> = OnceLock::new();
static TR: OnceLock<Selector> = OnceLock::new();
static TBODY_TR: OnceLock<Selector> = OnceLock::new();
static TD: OnceLock<Selector> = OnceLock::new();

fn selector(cache: &'static OnceLock<Selector>, css: &'static str) -> &'static Selector {
    cache.get_or_init(|| Selector::parse(css).expect("valid selector"))
}

fn cell_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// First table on the page whose text mentions any supplier-table marker.
pub fn locate_candidate_table(document: &Html) -> Option<ElementRef<'_>> {
    for table in document.select(selector(&TABLE, "table")) {
        let text = table.text().collect::<String>().to_lowercase();
        if TABLE_MARKERS.iter().any(|marker| text.contains(marker)) {
            return Some(table);
        }
    }
    None
}

/// Infer the {name, country, type} column indices for `table`.
///
/// Header cells come from the `thead` row when present, else the table's
/// first row is treated as a header. Each header is matched
/// case-insensitively against the keyword sets. Unresolved indices fall back
/// to positions 0/1/2 only when a data row with at least 3 cells exists;
/// otherwise inference fails closed and the table is skipped.
/// Deterministic: the same header row always yields the same mapping.
pub fn infer_columns(table: &ElementRef) -> Option<ColumnMapping> {
    let headers = header_cells(table);

    let mut name_idx = match_index(&headers, NAME_KEYWORDS);
    let mut country_idx = match_index(&headers, COUNTRY_KEYWORDS);
    let mut type_idx = match_index(&headers, TYPE_KEYWORDS);

    if (name_idx.is_none() || country_idx.is_none() || type_idx.is_none())
        && first_data_row_width(table) >= 3
    {
        name_idx = name_idx.or(Some(0));
        country_idx = country_idx.or(Some(1));
        type_idx = type_idx.or(Some(2));
    }

    Some(ColumnMapping {
        name_idx: name_idx?,
        country_idx: country_idx?,
        type_idx: type_idx?,
    })
}

fn header_cells(table: &ElementRef) -> Vec<String> {
    if let Some(row) = table.select(selector(&THEAD_TR, "thead tr")).next() {
        let cells: Vec<String> = row
            .select(selector(&TH, "th"))
            .map(|c| cell_text(&c))
            .collect();
        if !cells.is_empty() {
            return cells;
        }
    }

    if let Some(row) = table.select(selector(&TR, "tr")).next() {
        return row
            .select(selector(&TH_TD, "th,td"))
            .map(|c| cell_text(&c))
            .collect();
    }

    Vec::new()
}

fn match_index(headers: &[String], keywords: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.to_lowercase();
        keywords.iter().any(|k| h.contains(k))
    })
}

/// Cell count of the first plausible data row. The HTML5 parser wraps stray
/// `<tr>`s in an implicit tbody, so the `tbody tr` probe covers most markup;
/// the second-row probe remains for fragments that dodge that rewrite.
fn first_data_row_width(table: &ElementRef) -> usize {
    let td = selector(&TD, "td");
    if let Some(row) = table.select(selector(&TBODY_TR, "tbody tr")).next() {
        return row.select(td).count();
    }
    table
        .select(selector(&TR, "tr"))
        .nth(1)
        .map(|row| row.select(td).count())
        .unwrap_or(0)
}

/// Extract raw supplier rows using the inferred mapping.
///
/// Body rows prefer a tbody-scoped set, else all rows minus the first
/// (treated as the header). Rows with fewer cells than the mapping requires
/// are logged and skipped; one malformed row never aborts the table.
pub fn extract_suppliers(table: &ElementRef, mapping: &ColumnMapping) -> Vec<RawSupplierRow> {
    let body_rows: Vec<ElementRef> = {
        let tbody_rows: Vec<ElementRef> =
            table.select(selector(&TBODY_TR, "tbody tr")).collect();
        if !tbody_rows.is_empty() {
            tbody_rows
        } else {
            table.select(selector(&TR, "tr")).skip(1).collect()
        }
    };

    let td = selector(&TD, "td");
    let mut out = Vec::new();
    for row in body_rows {
        let cells: Vec<ElementRef> = row.select(td).collect();
        if cells.len() <= mapping.max_index() {
            debug!(
                "skipping row with {} cells (mapping needs index {})",
                cells.len(),
                mapping.max_index()
            );
            continue;
        }
        out.push(RawSupplierRow {
            supplier_name: cell_text(&cells[mapping.name_idx]),
            country: cell_text(&cells[mapping.country_idx]),
            company_type: cell_text(&cells[mapping.type_idx]),
        });
    }
    out
}

static TOKEN_SPLIT: OnceLock<Regex> = OnceLock::new();

/// Whole-token classification test: tokenize on runs of non-alphanumerics,
/// uppercase, and look for the literal tokens "M" or "CM". "M/CM" matches;
/// "Manufacturer" does not.
pub fn has_m_or_cm(type_str: &str) -> bool {
    let trimmed = type_str.trim();
    if trimmed.is_empty() {
        return false;
    }
    let split =
        TOKEN_SPLIT.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid token pattern"));
    split
        .split(&trimmed.to_uppercase())
        .any(|token| token == "M" || token == "CM")
}

/// Business filter: country is India (case-insensitive) and the company type
/// carries an M or CM classification token.
pub fn filter_indian_manufacturers(
    chemical: &str,
    rows: Vec<RawSupplierRow>,
) -> Vec<SupplierRecord> {
    rows.into_iter()
        .filter(|row| row.country.eq_ignore_ascii_case("india") && has_m_or_cm(&row.company_type))
        .map(|row| SupplierRecord {
            chemical: chemical.to_string(),
            supplier_name: row.supplier_name,
            company_type: row.company_type,
            country: row.country,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::has_m_or_cm;

    #[test]
    fn m_and_cm_are_whole_tokens_only() {
        assert!(has_m_or_cm("M"));
        assert!(has_m_or_cm("CM"));
        assert!(has_m_or_cm("M/CM"));
        assert!(has_m_or_cm("cm"));
        assert!(has_m_or_cm("Trader, M"));
        assert!(!has_m_or_cm("Manufacturer"));
        assert!(!has_m_or_cm("CMO"));
        assert!(!has_m_or_cm("Trader"));
    }

    #[test]
    fn blank_type_never_matches() {
        assert!(!has_m_or_cm(""));
        assert!(!has_m_or_cm("   "));
        assert!(!has_m_or_cm("//"));
    }
}
