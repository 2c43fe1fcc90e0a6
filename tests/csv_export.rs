//! CSV append semantics: header once, blank separator between batches.

use chemscout::core::types::SupplierRecord;
use chemscout::export;

fn record(chemical: &str, supplier: &str, company_type: &str, country: &str) -> SupplierRecord {
    SupplierRecord {
        chemical: chemical.to_string(),
        supplier_name: supplier.to_string(),
        company_type: company_type.to_string(),
        country: country.to_string(),
    }
}

#[test]
fn fresh_file_gets_exactly_one_header_then_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let written = export::append_records(
        &path,
        &[record("Trazodone hydrochloride", "Acme Labs", "M", "India")],
    )
    .unwrap();
    assert_eq!(written, 1);

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "chemical,supplier_name,company_type,country",
            "Trazodone hydrochloride,Acme Labs,M,India",
        ]
    );
}

#[test]
fn second_batch_gets_one_blank_separator_and_no_duplicate_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    export::append_records(&path, &[record("Chem A", "Acme Labs", "M", "India")]).unwrap();
    export::append_records(
        &path,
        &[
            record("Chem B", "Delta Pharma", "CM", "India"),
            record("Chem B", "Epsilon Chem", "M/CM", "India"),
        ],
    )
    .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "chemical,supplier_name,company_type,country",
            "Chem A,Acme Labs,M,India",
            "",
            "Chem B,Delta Pharma,CM,India",
            "Chem B,Epsilon Chem,M/CM,India",
        ]
    );

    let headers = lines
        .iter()
        .filter(|l| l.starts_with("chemical,"))
        .count();
    assert_eq!(headers, 1);

    // The separator must be a truly empty line, not a quoted empty field.
    assert!(
        !contents.contains("\"\""),
        "separator leaked into the file as a quoted empty field"
    );
}

#[test]
fn empty_batch_writes_nothing_and_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let written = export::append_records(&path, &[]).unwrap();
    assert_eq!(written, 0);
    assert!(!path.exists());
}

#[test]
fn fields_with_commas_are_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    export::append_records(
        &path,
        &[record("Chem C", "Acme Labs, Pvt. Ltd.", "M", "India")],
    )
    .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains(r#""Acme Labs, Pvt. Ltd.""#));
}
