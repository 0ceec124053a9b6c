//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Attributes of one company as delivered by the record loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Globally unique company code, e.g. "C01"
    pub code: String,
    pub name: String,
    /// Tier assigned at source (1..=5), authoritative over tree depth
    pub level: u8,
    pub country: String,
    pub city: String,
    pub founded_year: i32,
    /// Annual revenue in source currency units
    pub annual_revenue: f64,
    pub employees: u64,
}

impl CompanyRecord {
    /// Revenue per employee in thousands; zero when there are no employees.
    pub fn efficiency(&self) -> f64 {
        if self.employees > 0 {
            self.annual_revenue / self.employees as f64 / 1000.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for CompanyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (L{}, {})", self.code, self.name, self.level, self.city)
    }
}

/// Declares the edge `parent_code -> code`. No parent marks the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub code: String,
    pub parent_code: Option<String>,
}

impl RelationRecord {
    pub fn root(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            parent_code: None,
        }
    }

    pub fn child(code: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            parent_code: Some(parent.into()),
        }
    }
}

/// Flat, derived view of one node. Recomputed on every flatten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatCompanyView {
    pub code: String,
    pub name: String,
    pub level: u8,
    pub country: String,
    pub city: String,
    pub founded_year: i32,
    pub annual_revenue: f64,
    pub employees: u64,
    pub efficiency: f64,
}

impl From<&CompanyRecord> for FlatCompanyView {
    fn from(record: &CompanyRecord) -> Self {
        Self {
            code: record.code.clone(),
            name: record.name.clone(),
            level: record.level,
            country: record.country.clone(),
            city: record.city.clone(),
            founded_year: record.founded_year,
            annual_revenue: record.annual_revenue,
            employees: record.employees,
            efficiency: record.efficiency(),
        }
    }
}

/// Subset of company attributes returned for a single-company lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    pub code: String,
    pub city: String,
    pub founded_year: i32,
    pub annual_revenue: f64,
    pub employees: u64,
}

impl From<&CompanyRecord> for CompanyDetail {
    fn from(record: &CompanyRecord) -> Self {
        Self {
            code: record.code.clone(),
            city: record.city.clone(),
            founded_year: record.founded_year,
            annual_revenue: record.annual_revenue,
            employees: record.employees,
        }
    }
}

/// Field usable as a grouping key for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Level,
    Country,
    City,
}

impl Dimension {
    pub const ALL: [Self; 3] = [Self::Level, Self::Country, Self::City];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Country => "country",
            Self::City => "city",
        }
    }

    /// Grouping key of a view. Levels are rendered as `level<N>`.
    pub fn key_of(self, view: &FlatCompanyView) -> String {
        match self {
            Self::Level => format!("level{}", view.level),
            Self::Country => view.country.clone(),
            Self::City => view.city.clone(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "level" => Ok(Self::Level),
            "country" => Ok(Self::Country),
            "city" => Ok(Self::City),
            other => Err(format!(
                "invalid dimension '{other}', expected one of: level, country, city"
            )),
        }
    }
}
