//! Aggregation of flat views into chart-ready statistics.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use serde::Serialize;

use crate::domain::entities::{Dimension, FlatCompanyView};

/// Counts per grouping key, in order of first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grouping {
    pub dimension: Dimension,
    entries: Vec<(String, usize)>,
}

impl Grouping {
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts; equals the number of grouped views.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn to_label_value_series(&self) -> LabelValueSeries {
        let (labels, values) = self.entries.iter().cloned().unzip();
        LabelValueSeries { labels, values }
    }
}

/// Parallel label/value arrays as consumed by chart widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelValueSeries {
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

/// Count views per dimension key. Only observed keys are emitted.
pub fn group_by(views: &[FlatCompanyView], dimension: Dimension) -> Grouping {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<(String, usize)> = Vec::new();

    for view in views {
        let key = dimension.key_of(view);
        match position.get(&key) {
            Some(&i) => entries[i].1 += 1,
            None => {
                position.insert(key.clone(), entries.len());
                entries.push((key, 1));
            }
        }
    }
    Grouping { dimension, entries }
}

/// Companies sharing one dimension key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    pub key: String,
    pub members: Vec<FlatCompanyView>,
}

/// Members per dimension key, keys and members in order of occurrence.
pub fn partition_by(views: &[FlatCompanyView], dimension: Dimension) -> Vec<Partition> {
    let mut partitions: Vec<Partition> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for view in views {
        let key = dimension.key_of(view);
        let i = *position.entry(key.clone()).or_insert_with(|| {
            partitions.push(Partition {
                key,
                members: Vec::new(),
            });
            partitions.len() - 1
        });
        partitions[i].members.push(view.clone());
    }
    partitions
}

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub company_count: usize,
    pub total_revenue: f64,
    pub total_employees: u64,
    pub country_count: usize,
}

pub fn dashboard_metrics(views: &[FlatCompanyView]) -> DashboardMetrics {
    DashboardMetrics {
        company_count: views.len(),
        total_revenue: views.iter().map(|v| v.annual_revenue).sum(),
        total_employees: views.iter().map(|v| v.employees).sum(),
        country_count: views
            .iter()
            .map(|v| v.country.as_str())
            .collect::<HashSet<_>>()
            .len(),
    }
}

/// Share of companies on one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierShare {
    pub level: u8,
    pub count: usize,
    /// Percentage of all views, 0..=100
    pub percentage: f64,
}

impl TierShare {
    /// Percentage with one decimal, e.g. "33.3%".
    pub fn percentage_label(&self) -> String {
        format!("{:.1}%", self.percentage)
    }
}

/// Companies per level, ascending by level.
pub fn tier_distribution(views: &[FlatCompanyView]) -> Vec<TierShare> {
    let total = views.len();
    let counts: BTreeMap<u8, usize> = views.iter().map(|v| v.level).counts().into_iter().collect();

    counts
        .into_iter()
        .map(|(level, count)| TierShare {
            level,
            count,
            percentage: count as f64 * 100.0 / total as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(code: &str, level: u8, country: &str, city: &str) -> FlatCompanyView {
        FlatCompanyView {
            code: code.into(),
            name: code.into(),
            level,
            country: country.into(),
            city: city.into(),
            founded_year: 2001,
            annual_revenue: 2_000.0,
            employees: 4,
            efficiency: 0.5,
        }
    }

    fn sample() -> Vec<FlatCompanyView> {
        vec![
            view("A", 1, "US", "Boston"),
            view("B", 2, "CN", "Shenzhen"),
            view("C", 2, "US", "Austin"),
            view("D", 3, "CN", "Shenzhen"),
        ]
    }

    #[test]
    fn given_views_when_grouping_by_country_then_keys_in_first_occurrence_order() {
        let grouping = group_by(&sample(), Dimension::Country);
        assert_eq!(
            grouping.entries(),
            &[("US".to_string(), 2), ("CN".to_string(), 2)]
        );
        assert_eq!(grouping.total(), 4);
    }

    #[test]
    fn given_views_when_grouping_by_level_then_keys_are_prefixed() {
        let series = group_by(&sample(), Dimension::Level).to_label_value_series();
        assert_eq!(series.labels, vec!["level1", "level2", "level3"]);
        assert_eq!(series.values, vec![1, 2, 1]);
    }

    #[test]
    fn given_no_views_when_grouping_then_emits_no_keys() {
        let grouping = group_by(&[], Dimension::City);
        assert!(grouping.is_empty());
        assert_eq!(grouping.to_label_value_series(), LabelValueSeries::default());
    }

    #[test]
    fn given_views_when_partitioning_then_members_keep_order() {
        let partitions = partition_by(&sample(), Dimension::City);
        assert_eq!(partitions.len(), 3);
        assert_eq!(partitions[1].key, "Shenzhen");
        let codes: Vec<_> = partitions[1].members.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "D"]);
    }

    #[test]
    fn given_views_when_computing_metrics_then_sums_and_counts_countries() {
        let metrics = dashboard_metrics(&sample());
        assert_eq!(metrics.company_count, 4);
        assert_eq!(metrics.total_revenue, 8_000.0);
        assert_eq!(metrics.total_employees, 16);
        assert_eq!(metrics.country_count, 2);
    }

    #[test]
    fn given_views_when_computing_tiers_then_ascending_with_percentages() {
        let tiers = tier_distribution(&sample());
        let levels: Vec<_> = tiers.iter().map(|t| (t.level, t.count)).collect();
        assert_eq!(levels, vec![(1, 1), (2, 2), (3, 1)]);
        assert_eq!(tiers[1].percentage_label(), "50.0%");
        assert_eq!(tiers[0].percentage_label(), "25.0%");
    }
}
