//! Filter engine: a conjunction of optional constraints over flat company views.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::entities::FlatCompanyView;

/// Inclusive range over founding years; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        self.start.map_or(true, |start| year >= start) && self.end.map_or(true, |end| year <= end)
    }
}

/// Inclusive numeric bounds; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Constraints ANDed together. Absent fields do not restrict.
///
/// Set-valued fields are membership tests (OR within the field). Strings are
/// compared exactly as stored; callers normalize case before filtering if
/// they need to. An empty set counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub levels: Option<BTreeSet<u8>>,
    pub countries: Option<BTreeSet<String>>,
    pub cities: Option<BTreeSet<String>>,
    /// Substring of the company name
    pub name: Option<String>,
    pub founded_year: Option<YearRange>,
    pub annual_revenue: Option<Bounds<f64>>,
    pub employees: Option<Bounds<u64>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_levels(mut self, levels: impl IntoIterator<Item = u8>) -> Self {
        self.levels = Some(levels.into_iter().collect());
        self
    }

    pub fn with_countries<S: Into<String>>(mut self, countries: impl IntoIterator<Item = S>) -> Self {
        self.countries = Some(countries.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cities<S: Into<String>>(mut self, cities: impl IntoIterator<Item = S>) -> Self {
        self.cities = Some(cities.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_founded_year(mut self, start: Option<i32>, end: Option<i32>) -> Self {
        self.founded_year = Some(YearRange { start, end });
        self
    }

    pub fn with_annual_revenue(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.annual_revenue = Some(Bounds { min, max });
        self
    }

    pub fn with_employees(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.employees = Some(Bounds { min, max });
        self
    }

    /// True if no constraint restricts anything.
    pub fn is_empty(&self) -> bool {
        fn unset<T>(set: &Option<BTreeSet<T>>) -> bool {
            set.as_ref().map_or(true, BTreeSet::is_empty)
        }
        unset(&self.levels)
            && unset(&self.countries)
            && unset(&self.cities)
            && self.name.as_deref().map_or(true, str::is_empty)
            && self.founded_year.map_or(true, |r| r == YearRange::default())
            && self.annual_revenue.map_or(true, |b| b == Bounds::default())
            && self.employees.map_or(true, |b| b == Bounds::default())
    }

    pub fn matches(&self, view: &FlatCompanyView) -> bool {
        fn member<T: Ord>(set: &Option<BTreeSet<T>>, value: &T) -> bool {
            match set {
                Some(set) if !set.is_empty() => set.contains(value),
                _ => true,
            }
        }

        member(&self.levels, &view.level)
            && member(&self.countries, &view.country)
            && member(&self.cities, &view.city)
            && self
                .name
                .as_deref()
                .map_or(true, |needle| view.name.contains(needle))
            && self
                .founded_year
                .map_or(true, |range| range.contains(view.founded_year))
            && self
                .annual_revenue
                .map_or(true, |bounds| bounds.contains(view.annual_revenue))
            && self
                .employees
                .map_or(true, |bounds| bounds.contains(view.employees))
    }
}

/// Keep the views that satisfy every present constraint, in their original order.
pub fn filter(views: &[FlatCompanyView], spec: &FilterSpec) -> Vec<FlatCompanyView> {
    views.iter().filter(|v| spec.matches(v)).cloned().collect()
}
