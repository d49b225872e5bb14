//! Tests for cohort summary metrics and group aggregators

use clinreg::pipeline::{
    group_by_label, group_by_year, interpretation_distribution, load_typed_view,
    management_distribution, summarize, type_frame, Cell, MetricValue, TypedView,
};
use clinreg::registry::SchemaVariant;
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

fn avs_view() -> TypedView {
    type_frame(&common::create_avs_dataframe(), SchemaVariant::Avs).unwrap()
}

#[test]
fn test_three_case_summary() {
    let summary = summarize(&avs_view());

    assert_eq!(summary.total_cases, 3);
    assert_eq!(summary.median_age_years, MetricValue::Measure(52.0));
    assert_eq!(summary.female_percent, MetricValue::Measure(66.7));
    assert_eq!(summary.complication_percent, MetricValue::Measure(33.3));
    // one selective case out of three, the third flag is unknown
    assert_eq!(summary.bilateral_selective_percent, MetricValue::Measure(33.3));
}

#[test]
fn test_total_cases_matches_row_count() {
    let (_temp_dir, path) = common::create_avs_registry();
    let view = load_typed_view(&path, SchemaVariant::Avs).unwrap();

    assert_eq!(summarize(&view).total_cases, view.height());
}

#[test]
fn test_female_match_is_case_insensitive() {
    let df = df! {
        "sex" => ["female", "FEMALE", "Male", "Other"],
        "complication" => ["yes", "Yes", "No", "Unknown"],
    }
    .unwrap();
    let df = clinreg::pipeline::conform_to_schema(df, SchemaVariant::Avs).unwrap();
    let summary = summarize(&type_frame(&df, SchemaVariant::Avs).unwrap());

    assert_eq!(summary.female_percent, MetricValue::Measure(50.0));
    // only the exact "Yes" counts
    assert_eq!(summary.complication_percent, MetricValue::Measure(25.0));
    assert_eq!(summary.median_age_years, MetricValue::Unknown);
    // no indices recorded, so no case is selective
    assert_eq!(summary.bilateral_selective_percent, MetricValue::Measure(0.0));
}

#[test]
fn test_year_groups_exclude_unparseable_dates() {
    let df = df! {
        "procedure_date" => [Some("2022-01-01"), Some("not a date"), None, Some("2022-06-30"), Some("2021-12-31")],
    }
    .unwrap();
    let df = clinreg::pipeline::conform_to_schema(df, SchemaVariant::Avs).unwrap();
    let view = type_frame(&df, SchemaVariant::Avs).unwrap();

    let table = group_by_year(&view).unwrap();

    assert_eq!(
        table.entries,
        vec![(Cell::Integer(2021), 1), (Cell::Integer(2022), 2)]
    );
    assert!(table.total() < view.height());
}

#[test]
fn test_year_groups_cover_all_rows_when_dates_parse() {
    let view = avs_view();
    let table = group_by_year(&view).unwrap();

    assert_eq!(table.total(), view.height());
    assert_eq!(
        table.entries,
        vec![(Cell::Integer(2023), 2), (Cell::Integer(2024), 1)]
    );
}

#[test]
fn test_label_groups_sum_to_row_count() {
    let view = avs_view();

    let interpretation = interpretation_distribution(&view).unwrap();
    assert_eq!(interpretation.total(), view.height());
    assert_eq!(
        interpretation.entries[0],
        (Cell::Text("Unilateral left".to_string()), 2)
    );

    let management = management_distribution(&view).unwrap();
    assert_eq!(management.total(), view.height());
    assert_eq!(management.count_for(None), Some(1));
}

#[test]
fn test_label_ties_keep_first_appearance() {
    let view = avs_view();
    let table = group_by_label(&view, "operator_name").unwrap();
    assert_eq!(table.entries[0], (Cell::Text("Dr A".to_string()), 2));

    let table = group_by_label(&view, "patient_code").unwrap();
    let labels: Vec<String> = table.entries.iter().map(|(c, _)| c.to_string()).collect();
    assert_eq!(labels, vec!["P001", "P002", "P003"]);
}
