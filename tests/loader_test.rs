//! Tests for the CSV record loader

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use orgchart::application::loader::{parse_companies, parse_relations};
use orgchart::application::{ApplicationError, CsvRecordSource, RecordSource};
use orgchart::infrastructure::traits::{MemoryFileSystem, RealFileSystem};

const COMPANIES: &str = "\
company_code,company_name,level,country,city,founded_year,annual_revenue,employees
C01,Acme Group,1,Germany,Berlin,1950,9000000,3000
C02,\"Acme Europe, GmbH\",2,Germany,Munich,1972,4000000.5,1600
C03,Acme Asia,2,Japan,Tokyo,1981,3000000,0
";

const RELATIONSHIPS: &str = "\
company_code,parent_company
C01,
C02,C01
C03,C01
";

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write csv file");
    path
}

fn load_error(result: Result<impl std::fmt::Debug, ApplicationError>) -> (usize, String) {
    match result {
        Err(ApplicationError::Load { line, message, .. }) => (line, message),
        other => panic!("expected load error, got {other:?}"),
    }
}

#[test]
fn given_csv_files_on_disk_when_loading_then_returns_records() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let companies = write_file(&temp, "companies.csv", COMPANIES);
    let relationships = write_file(&temp, "relationships.csv", RELATIONSHIPS);
    let source = CsvRecordSource::new(Arc::new(RealFileSystem), companies, relationships);

    // Act
    let records = source.load().unwrap();

    // Assert
    assert_eq!(records.companies.len(), 3);
    let europe = &records.companies["C02"];
    assert_eq!(europe.name, "Acme Europe, GmbH");
    assert_eq!(europe.level, 2);
    assert_eq!(europe.annual_revenue, 4_000_000.5);
    assert_eq!(records.companies["C03"].employees, 0);

    assert_eq!(records.relations.len(), 3);
    assert_eq!(records.relations[0].parent_code, None);
    assert_eq!(records.relations[1].parent_code.as_deref(), Some("C01"));
}

#[test]
fn given_missing_file_when_loading_then_operation_failed() {
    let temp = TempDir::new().unwrap();
    let relationships = write_file(&temp, "relationships.csv", RELATIONSHIPS);
    let source = CsvRecordSource::new(
        Arc::new(RealFileSystem),
        temp.path().join("missing.csv"),
        relationships,
    );

    let err = source.load().unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(err.to_string().contains("missing.csv"));
}

#[test]
fn given_memory_filesystem_when_loading_then_reads_through_it() {
    let fs = MemoryFileSystem::new()
        .with_file("/data/companies.csv", COMPANIES)
        .with_file("/data/relationships.csv", RELATIONSHIPS);
    let source = CsvRecordSource::new(
        Arc::new(fs),
        "/data/companies.csv",
        "/data/relationships.csv",
    );

    let records = source.load().unwrap();

    assert_eq!(records.companies.len(), 3);
    assert!(source.describe().contains("/data/companies.csv"));
}

#[test]
fn given_reordered_columns_and_bom_when_parsing_then_matches_by_header() {
    let content = "\u{feff}employees,Company_Code,level,company_name,city,country,annual_revenue,founded_year\n\
                   12,C09,3,Tiny Co,Porto,Portugal,240000,2019\n";

    let companies = parse_companies(content, Path::new("companies.csv")).unwrap();

    let tiny = &companies["C09"];
    assert_eq!(tiny.employees, 12);
    assert_eq!(tiny.city, "Porto");
    assert_eq!(tiny.founded_year, 2019);
    assert_eq!(tiny.efficiency(), 240000.0 / 12.0 / 1000.0);
}

#[test]
fn given_blank_lines_when_parsing_then_skipped() {
    let content = "company_code,parent_company\n\nC01,\n\nC02,C01\n";

    let relations = parse_relations(content, Path::new("relationships.csv")).unwrap();

    assert_eq!(relations.len(), 2);
}

#[test]
fn given_missing_column_when_parsing_then_load_error_on_header() {
    let content = "company_code,company_name,level\nC01,Acme,1\n";

    let (line, message) = load_error(parse_companies(content, Path::new("companies.csv")));

    assert_eq!(line, 1);
    assert!(message.contains("country"), "{message}");
}

#[test]
fn given_non_numeric_employees_when_parsing_then_reports_line() {
    let content = "\
company_code,company_name,level,country,city,founded_year,annual_revenue,employees
C01,Acme Group,1,Germany,Berlin,1950,9000000,3000
C02,Acme Europe,2,Germany,Munich,1972,4000000,many
";

    let (line, message) = load_error(parse_companies(content, Path::new("companies.csv")));

    assert_eq!(line, 3);
    assert_eq!(message, "invalid employees 'many'");
}

#[test]
fn given_level_out_of_range_when_parsing_then_rejected() {
    let content = "\
company_code,company_name,level,country,city,founded_year,annual_revenue,employees
C01,Acme Group,6,Germany,Berlin,1950,9000000,3000
";

    let (_, message) = load_error(parse_companies(content, Path::new("companies.csv")));

    assert!(message.contains("level 6"), "{message}");
}

#[test]
fn given_duplicate_code_when_parsing_then_rejected() {
    let content = "\
company_code,company_name,level,country,city,founded_year,annual_revenue,employees
C01,Acme Group,1,Germany,Berlin,1950,9000000,3000
C01,Acme Again,1,Germany,Berlin,1950,9000000,3000
";

    let (line, message) = load_error(parse_companies(content, Path::new("companies.csv")));

    assert_eq!(line, 3);
    assert!(message.contains("duplicate"), "{message}");
}

#[test]
fn given_empty_content_when_parsing_then_missing_header() {
    let err = parse_relations("", Path::new("relationships.csv")).unwrap_err();
    assert_eq!(err.to_string(), "relationships.csv:1: missing header line");
}
