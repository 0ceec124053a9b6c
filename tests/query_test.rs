//! Tests for flatten, filter, group_by and find_by_code over a built tree

use std::collections::BTreeMap;

use rstest::{fixture, rstest};

use orgchart::domain::{
    build, dashboard_metrics, filter, find_by_code, flatten, group_by, tier_distribution,
    CompanyRecord, CompanyTree, Dimension, DomainError, FilterSpec, FlatCompanyView,
    RelationRecord,
};

#[allow(clippy::too_many_arguments)]
fn company(
    code: &str,
    name: &str,
    level: u8,
    country: &str,
    city: &str,
    founded_year: i32,
    annual_revenue: f64,
    employees: u64,
) -> CompanyRecord {
    CompanyRecord {
        code: code.to_string(),
        name: name.to_string(),
        level,
        country: country.to_string(),
        city: city.to_string(),
        founded_year,
        annual_revenue,
        employees,
    }
}

/// C01 -> (C02 -> (C04, C05), C03 -> C06)
#[fixture]
fn tree() -> CompanyTree {
    let companies: BTreeMap<String, CompanyRecord> = [
        company("C01", "Acme Group", 1, "Germany", "Berlin", 1950, 9_000_000.0, 3000),
        company("C02", "Acme Europe", 2, "Germany", "Munich", 1972, 4_000_000.0, 1600),
        company("C03", "Acme Asia", 2, "Japan", "Tokyo", 1981, 3_000_000.0, 1000),
        company("C04", "Acme Logistics", 3, "France", "Paris", 1990, 500_000.0, 0),
        company("C05", "Acme Retail", 3, "Germany", "Berlin", 2003, 800_000.0, 400),
        company("C06", "Acme Robotics", 3, "Japan", "Osaka", 2011, 1_200_000.0, 300),
    ]
    .into_iter()
    .map(|c| (c.code.clone(), c))
    .collect();

    let relations = vec![
        RelationRecord::root("C01"),
        RelationRecord::child("C02", "C01"),
        RelationRecord::child("C03", "C01"),
        RelationRecord::child("C04", "C02"),
        RelationRecord::child("C05", "C02"),
        RelationRecord::child("C06", "C03"),
    ];
    build(&companies, &relations).unwrap()
}

#[fixture]
fn views(tree: CompanyTree) -> Vec<FlatCompanyView> {
    flatten(&tree)
}

fn codes(views: &[FlatCompanyView]) -> Vec<&str> {
    views.iter().map(|v| v.code.as_str()).collect()
}

#[rstest]
fn given_tree_when_flattening_then_pre_order(tree: CompanyTree) {
    let views = flatten(&tree);
    assert_eq!(codes(&views), vec!["C01", "C02", "C04", "C05", "C03", "C06"]);
}

#[rstest]
fn given_tree_when_flattening_twice_then_identical(tree: CompanyTree) {
    assert_eq!(flatten(&tree), flatten(&tree));
}

#[rstest]
fn given_zero_employees_when_flattening_then_efficiency_is_zero(views: Vec<FlatCompanyView>) {
    let logistics = views.iter().find(|v| v.code == "C04").unwrap();
    assert_eq!(logistics.employees, 0);
    assert_eq!(logistics.efficiency, 0.0);

    let group = &views[0];
    assert_eq!(group.efficiency, 9_000_000.0 / 3000.0 / 1000.0);
}

#[rstest]
fn given_empty_spec_when_filtering_then_identity(views: Vec<FlatCompanyView>) {
    assert_eq!(filter(&views, &FilterSpec::default()), views);
}

#[rstest]
fn given_levels_one_and_two_when_filtering_then_keeps_order(views: Vec<FlatCompanyView>) {
    let spec = FilterSpec::new().with_levels([1, 2]);
    let kept = filter(&views, &spec);
    assert_eq!(codes(&kept), vec!["C01", "C02", "C03"]);
}

#[rstest]
#[case::levels(FilterSpec::new().with_levels([3]))]
#[case::countries(FilterSpec::new().with_countries(["Japan"]))]
#[case::cities(FilterSpec::new().with_cities(["Berlin", "Osaka"]))]
#[case::name(FilterSpec::new().with_name("Ro"))]
#[case::years(FilterSpec::new().with_founded_year(Some(1980), None))]
#[case::revenue(FilterSpec::new().with_annual_revenue(Some(800_000.0), Some(4_000_000.0)))]
#[case::employees(FilterSpec::new().with_employees(None, Some(400)))]
fn given_any_spec_when_filtering_twice_then_idempotent(
    views: Vec<FlatCompanyView>,
    #[case] spec: FilterSpec,
) {
    let once = filter(&views, &spec);
    let twice = filter(&once, &spec);
    assert_eq!(once, twice);
    assert!(once.len() < views.len());
}

#[rstest]
fn given_country_case_differs_when_filtering_then_no_match(views: Vec<FlatCompanyView>) {
    let spec = FilterSpec::new().with_countries(["germany"]);
    assert!(filter(&views, &spec).is_empty());
}

#[rstest]
fn given_inclusive_year_bounds_when_filtering_then_bounds_included(views: Vec<FlatCompanyView>) {
    let spec = FilterSpec::new().with_founded_year(Some(1972), Some(1990));
    assert_eq!(codes(&filter(&views, &spec)), vec!["C02", "C04", "C03"]);
}

#[rstest]
fn given_combined_constraints_when_filtering_then_all_must_hold(views: Vec<FlatCompanyView>) {
    let spec = FilterSpec::new()
        .with_countries(["Germany"])
        .with_employees(Some(1000), None);
    assert_eq!(codes(&filter(&views, &spec)), vec!["C01", "C02"]);
}

#[rstest]
fn given_any_dimension_when_grouping_then_counts_sum_to_len(views: Vec<FlatCompanyView>) {
    for dimension in Dimension::ALL {
        let grouping = group_by(&views, dimension);
        assert_eq!(grouping.total(), views.len(), "dimension {dimension}");
    }
}

#[rstest]
fn given_country_dimension_when_grouping_then_first_occurrence_order(
    views: Vec<FlatCompanyView>,
) {
    let series = group_by(&views, Dimension::Country).to_label_value_series();
    assert_eq!(series.labels, vec!["Germany", "France", "Japan"]);
    assert_eq!(series.values, vec![3, 1, 2]);
}

#[rstest]
fn given_level_dimension_when_grouping_then_keys_are_prefixed(views: Vec<FlatCompanyView>) {
    let grouping = group_by(&views, Dimension::Level);
    assert_eq!(grouping.get("level1"), Some(1));
    assert_eq!(grouping.get("level2"), Some(2));
    assert_eq!(grouping.get("level3"), Some(3));
    assert_eq!(grouping.get("level4"), None);
}

#[rstest]
fn given_filtered_views_when_grouping_then_only_observed_keys(views: Vec<FlatCompanyView>) {
    let kept = filter(&views, &FilterSpec::new().with_countries(["Japan"]));
    let grouping = group_by(&kept, Dimension::City);
    assert_eq!(grouping.len(), 2);
    assert_eq!(grouping.get("Berlin"), None);
}

#[rstest]
fn given_views_when_computing_metrics_then_totals_match(views: Vec<FlatCompanyView>) {
    let metrics = dashboard_metrics(&views);
    assert_eq!(metrics.company_count, 6);
    assert_eq!(metrics.total_employees, 6300);
    assert_eq!(metrics.total_revenue, 18_500_000.0);
    assert_eq!(metrics.country_count, 3);

    let tiers = tier_distribution(&views);
    let labels: Vec<_> = tiers.iter().map(|t| t.percentage_label()).collect();
    assert_eq!(labels, vec!["16.7%", "33.3%", "50.0%"]);
}

#[rstest]
fn given_known_code_when_finding_then_returns_subtree(tree: CompanyTree) {
    let subtree = find_by_code(&tree, "C02").unwrap();
    assert_eq!(subtree.record().name, "Acme Europe");
    assert_eq!(subtree.len(), 3);
    assert_eq!(codes(&subtree.flatten()), vec!["C02", "C04", "C05"]);
    assert_eq!(subtree.parent().map(|p| p.record().code.clone()), Some("C01".to_string()));
}

#[rstest]
fn given_leaf_code_when_finding_then_subtree_is_single_node(tree: CompanyTree) {
    let subtree = find_by_code(&tree, "C06").unwrap();
    assert_eq!(subtree.len(), 1);
    assert!(subtree.node().is_leaf());
}

#[rstest]
fn given_unknown_code_when_finding_then_not_found(tree: CompanyTree) {
    match find_by_code(&tree, "Z") {
        Err(DomainError::NotFound(code)) => assert_eq!(code, "Z"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[rstest]
fn given_subtree_when_nesting_then_mirrors_children(tree: CompanyTree) {
    let nested = find_by_code(&tree, "C03").unwrap().to_nested();
    assert_eq!(nested.company.code, "C03");
    assert_eq!(nested.children.len(), 1);
    assert_eq!(nested.children[0].company.code, "C06");
    assert!(nested.children[0].children.is_empty());

    let json = serde_json::to_value(&nested).unwrap();
    assert_eq!(json["code"], "C03");
    assert_eq!(json["children"][0]["city"], "Osaka");
}
