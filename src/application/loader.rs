//! Record loader: turns the two CSV sources into in-memory collections.
//!
//! `companies.csv` columns (header-addressed, any order):
//! `company_code, company_name, level, country, city, founded_year, annual_revenue, employees`
//!
//! `relationships.csv` columns: `company_code, parent_company` (empty parent = root).
//!
//! Fields are trimmed. Quoted fields may contain commas, line breaks and `""`
//! escapes; blank lines are skipped. Error line numbers refer to the line a
//! record starts on.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use csv::{Position, ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{CompanyRecord, RelationRecord};
use crate::infrastructure::traits::FileSystem;

/// The two flat record sets the tree builder consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRecords {
    pub companies: BTreeMap<String, CompanyRecord>,
    pub relations: Vec<RelationRecord>,
}

/// Producer of source records; invoked on every (re)build.
pub trait RecordSource: Send + Sync {
    fn load(&self) -> ApplicationResult<SourceRecords>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

/// Hands out a fixed set of records, e.g. parsed elsewhere or built in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    records: SourceRecords,
}

impl StaticRecordSource {
    pub fn new(records: SourceRecords) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticRecordSource {
    fn load(&self) -> ApplicationResult<SourceRecords> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory companies", self.records.companies.len())
    }
}

/// Reads both CSV files through the [`FileSystem`] boundary.
pub struct CsvRecordSource {
    fs: Arc<dyn FileSystem>,
    companies_path: PathBuf,
    relationships_path: PathBuf,
}

impl CsvRecordSource {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        companies_path: impl Into<PathBuf>,
        relationships_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            companies_path: companies_path.into(),
            relationships_path: relationships_path.into(),
        }
    }
}

impl RecordSource for CsvRecordSource {
    #[instrument(level = "debug", skip(self), fields(source = %self.describe()))]
    fn load(&self) -> ApplicationResult<SourceRecords> {
        let content = self
            .fs
            .read_to_string(&self.companies_path)
            .with_path_context("read companies", &self.companies_path)?;
        let companies = parse_companies(&content, &self.companies_path)?;

        let content = self
            .fs
            .read_to_string(&self.relationships_path)
            .with_path_context("read relationships", &self.relationships_path)?;
        let relations = parse_relations(&content, &self.relationships_path)?;

        debug!(
            "loaded {} companies, {} relations",
            companies.len(),
            relations.len()
        );
        Ok(SourceRecords {
            companies,
            relations,
        })
    }

    fn describe(&self) -> String {
        format!(
            "{} + {}",
            self.companies_path.display(),
            self.relationships_path.display()
        )
    }
}

/// Parse the company attributes table, keyed by company code.
pub fn parse_companies(
    content: &str,
    path: &Path,
) -> ApplicationResult<BTreeMap<String, CompanyRecord>> {
    let mut rows = CsvTable::new(content, path)?;
    let code_col = rows.column("company_code")?;
    let name_col = rows.column("company_name")?;
    let level_col = rows.column("level")?;
    let country_col = rows.column("country")?;
    let city_col = rows.column("city")?;
    let year_col = rows.column("founded_year")?;
    let revenue_col = rows.column("annual_revenue")?;
    let employees_col = rows.column("employees")?;

    let mut companies = BTreeMap::new();
    while let Some(row) = rows.next_row()? {
        let code = row.text(code_col)?;
        if code.is_empty() {
            return Err(row.error("empty company_code"));
        }

        let level: u8 = row.number(level_col, "level")?;
        if !(1..=5).contains(&level) {
            return Err(row.error(format!("level {level} outside 1..=5")));
        }
        let annual_revenue: f64 = row.number(revenue_col, "annual_revenue")?;
        if !annual_revenue.is_finite() || annual_revenue < 0.0 {
            return Err(row.error(format!("invalid annual_revenue {annual_revenue}")));
        }

        let record = CompanyRecord {
            code: code.to_string(),
            name: row.text(name_col)?.to_string(),
            level,
            country: row.text(country_col)?.to_string(),
            city: row.text(city_col)?.to_string(),
            founded_year: row.number(year_col, "founded_year")?,
            annual_revenue,
            employees: row.number(employees_col, "employees")?,
        };

        if companies.insert(record.code.clone(), record).is_some() {
            return Err(row.error(format!("duplicate company_code {code}")));
        }
    }
    Ok(companies)
}

/// Parse the parent/child relation table, preserving row order.
pub fn parse_relations(content: &str, path: &Path) -> ApplicationResult<Vec<RelationRecord>> {
    let mut rows = CsvTable::new(content, path)?;
    let code_col = rows.column("company_code")?;
    let parent_col = rows.column("parent_company")?;

    let mut relations = Vec::new();
    while let Some(row) = rows.next_row()? {
        let code = row.text(code_col)?;
        if code.is_empty() {
            return Err(row.error("empty company_code"));
        }
        let parent = row.text(parent_col)?;
        relations.push(RelationRecord {
            code: code.to_string(),
            parent_code: (!parent.is_empty()).then(|| parent.to_string()),
        });
    }
    Ok(relations)
}

/// Header-addressed iteration over the records of a CSV document.
struct CsvTable<'a> {
    path: &'a Path,
    records: StringRecordsIntoIter<&'a [u8]>,
    columns: HashMap<String, usize>,
    header_line: usize,
}

struct CsvRow<'a> {
    path: &'a Path,
    line: usize,
    record: StringRecord,
}

impl<'a> CsvTable<'a> {
    fn new(content: &'a str, path: &'a Path) -> ApplicationResult<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers().map_err(|e| csv_error(path, &e))?;
        let header_line = line_of(headers.position());
        if headers.iter().all(str::is_empty) {
            return Err(ApplicationError::load(path, header_line, "missing header line"));
        }
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_ascii_lowercase(), i))
            .collect();

        Ok(Self {
            path,
            records: reader.into_records(),
            columns,
            header_line,
        })
    }

    fn column(&self, name: &str) -> ApplicationResult<usize> {
        self.columns.get(name).copied().ok_or_else(|| {
            ApplicationError::load(self.path, self.header_line, format!("missing column '{name}'"))
        })
    }

    fn next_row(&mut self) -> ApplicationResult<Option<CsvRow<'a>>> {
        for result in self.records.by_ref() {
            let record = result.map_err(|e| csv_error(self.path, &e))?;
            // whitespace-only lines come back as one empty field
            if record.iter().all(str::is_empty) {
                continue;
            }
            return Ok(Some(CsvRow {
                path: self.path,
                line: line_of(record.position()),
                record,
            }));
        }
        Ok(None)
    }
}

impl CsvRow<'_> {
    fn error(&self, message: impl Into<String>) -> ApplicationError {
        ApplicationError::load(self.path, self.line, message)
    }

    fn text(&self, col: usize) -> ApplicationResult<&str> {
        self.record
            .get(col)
            .ok_or_else(|| self.error(format!("expected at least {} fields", col + 1)))
    }

    fn number<T: FromStr>(&self, col: usize, name: &str) -> ApplicationResult<T> {
        let raw = self.text(col)?;
        raw.parse()
            .map_err(|_| self.error(format!("invalid {name} '{raw}'")))
    }
}

fn line_of(position: Option<&Position>) -> usize {
    position.map_or(1, |p| p.line() as usize)
}

fn csv_error(path: &Path, err: &csv::Error) -> ApplicationError {
    ApplicationError::load(path, line_of(err.position()), err.to_string())
}
