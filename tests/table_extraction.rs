//! Table location, column inference, extraction and filtering against
//! captured-HTML fixtures.

use chemscout::core::types::ColumnMapping;
use chemscout::extract::tables;
use scraper::Html;

/// A detail page with a navigation table first and the supplier table after
/// it, the shape the portal actually renders.
const SUPPLIERS_PAGE: &str = r#"
<html><body>
  <table>
    <tr><td>Overview</td><td>Applications</td><td>Suppliers</td></tr>
  </table>
  <table>
    <thead>
      <tr><th>Company Details</th><th>Country</th><th>Type of Company</th></tr>
    </thead>
    <tbody>
      <tr><td>Acme Labs</td><td>India</td><td>M</td></tr>
      <tr><td>Beta Corp</td><td>USA</td><td>M</td></tr>
      <tr><td>Gamma Ltd</td><td>India</td><td>Trader</td></tr>
    </tbody>
  </table>
</body></html>
"#;

#[test]
fn locates_the_marker_table_not_the_navigation_table() {
    let document = Html::parse_document(SUPPLIERS_PAGE);
    let table = tables::locate_candidate_table(&document).expect("supplier table present");
    let text = table.text().collect::<String>();
    assert!(text.contains("Acme Labs"));
    assert!(!text.contains("Overview"));
}

#[test]
fn no_marker_table_means_none() {
    let document = Html::parse_document(
        "<html><body><table><tr><td>a</td><td>b</td></tr></table></body></html>",
    );
    assert!(tables::locate_candidate_table(&document).is_none());
}

#[test]
fn header_keywords_drive_column_inference() {
    let document = Html::parse_document(SUPPLIERS_PAGE);
    let table = tables::locate_candidate_table(&document).unwrap();
    let mapping = tables::infer_columns(&table).expect("mapping resolves");
    assert_eq!(
        mapping,
        ColumnMapping {
            name_idx: 0,
            country_idx: 1,
            type_idx: 2
        }
    );
}

#[test]
fn shuffled_columns_are_mapped_by_header_text() {
    let html = r#"
      <table>
        <thead><tr><th>Type</th><th>Supplier Name</th><th>Country</th></tr></thead>
        <tbody><tr><td>M</td><td>Acme Labs</td><td>India</td></tr></tbody>
      </table>
    "#;
    let document = Html::parse_document(html);
    let table = tables::locate_candidate_table(&document).unwrap();
    let mapping = tables::infer_columns(&table).expect("mapping resolves");
    // "Supplier Name" also contains "name"; position wins within one header.
    assert_eq!(
        mapping,
        ColumnMapping {
            name_idx: 1,
            country_idx: 2,
            type_idx: 0
        }
    );

    let rows = tables::extract_suppliers(&table, &mapping);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].supplier_name, "Acme Labs");
    assert_eq!(rows[0].country, "India");
    assert_eq!(rows[0].company_type, "M");
}

#[test]
fn inference_is_deterministic() {
    let document = Html::parse_document(SUPPLIERS_PAGE);
    let table = tables::locate_candidate_table(&document).unwrap();
    let first = tables::infer_columns(&table);
    let second = tables::infer_columns(&table);
    assert_eq!(first, second);
}

#[test]
fn positional_fallback_needs_a_three_cell_data_row() {
    // Headers carry no recognizable keywords except "country" (which makes
    // the table a location candidate), and every row has three td cells, so
    // the unresolved indices fall back positionally.
    let html = r#"
      <table>
        <tr><td>Country Overview</td><td>B</td><td>C</td></tr>
        <tr><td>Acme Labs</td><td>India</td><td>M</td></tr>
      </table>
    "#;
    let document = Html::parse_document(html);
    let table = tables::locate_candidate_table(&document).unwrap();
    let mapping = tables::infer_columns(&table).expect("fallback fires");
    // "Country Overview" resolves country by keyword; name and type fall
    // back to positions 0 and 2.
    assert_eq!(mapping.country_idx, 0);
    assert_eq!(mapping.name_idx, 0);
    assert_eq!(mapping.type_idx, 2);
}

#[test]
fn inference_fails_closed_on_narrow_tables() {
    // Marker text makes it a candidate, but headers resolve nothing beyond
    // "country" and no data row has three cells: no guessing, no mapping.
    let html = r#"
      <table>
        <tr><td>Country</td><td>Contact</td></tr>
        <tr><td>India</td><td>someone@example.com</td></tr>
      </table>
    "#;
    let document = Html::parse_document(html);
    let table = tables::locate_candidate_table(&document).unwrap();
    assert!(tables::infer_columns(&table).is_none());
}

#[test]
fn malformed_rows_are_skipped_not_fatal() {
    let html = r#"
      <table>
        <thead><tr><th>Company</th><th>Country</th><th>Type</th></tr></thead>
        <tbody>
          <tr><td>Acme Labs</td><td>India</td><td>M</td></tr>
          <tr><td>only one cell</td></tr>
          <tr></tr>
          <tr><td>Beta Corp</td><td>USA</td><td>CM</td></tr>
        </tbody>
      </table>
    "#;
    let document = Html::parse_document(html);
    let table = tables::locate_candidate_table(&document).unwrap();
    let mapping = tables::infer_columns(&table).unwrap();
    let rows = tables::extract_suppliers(&table, &mapping);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].supplier_name, "Acme Labs");
    assert_eq!(rows[1].supplier_name, "Beta Corp");
}

#[test]
fn trazodone_scenario_yields_exactly_one_record() {
    let document = Html::parse_document(SUPPLIERS_PAGE);
    let table = tables::locate_candidate_table(&document).unwrap();
    let mapping = tables::infer_columns(&table).unwrap();
    let rows = tables::extract_suppliers(&table, &mapping);
    assert_eq!(rows.len(), 3);

    let records = tables::filter_indian_manufacturers("Trazodone hydrochloride", rows);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.chemical, "Trazodone hydrochloride");
    assert_eq!(record.supplier_name, "Acme Labs");
    assert_eq!(record.company_type, "M");
    assert_eq!(record.country, "India");
}
