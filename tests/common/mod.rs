//! Shared test utilities and registry fixtures

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use clinreg::registry::{FormSubmission, SchemaVariant};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fixed clock used by deterministic tests
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// Three AVS cases with known characteristics
///
/// - sex: Female, Male, Female (66.7% female)
/// - complication: Yes, No, No (33.3%)
/// - ages 45, 52, 60 (median 52.0)
/// - selectivity: (2.5, 3.0) selective, (1.5, 2.2) not, (absent, 4.0) unknown
/// - procedure dates in 2023, 2023 and 2024
pub fn create_avs_dataframe() -> DataFrame {
    let df = df! {
        "record_id" => ["avs_1", "avs_2", "avs_3"],
        "patient_code" => ["P001", "P002", "P003"],
        "age_years" => ["45", "52", "60"],
        "sex" => ["Female", "Male", "Female"],
        "procedure_date" => ["2023-03-10", "2023-11-02", "2024-01-15"],
        "operator_name" => ["Dr A", "Dr B", "Dr A"],
        "selectivity_index_right" => [Some("2.5"), Some("1.5"), None],
        "selectivity_index_left" => [Some("3.0"), Some("2.2"), Some("4.0")],
        "final_interpretation" => [Some("Unilateral left"), Some("Bilateral hypersecretion"), Some("Unilateral left")],
        "management_plan" => [Some("Left adrenalectomy"), Some("Medical therapy"), None],
        "complication" => ["Yes", "No", "No"],
    }
    .unwrap();
    clinreg::pipeline::conform_to_schema(df, SchemaVariant::Avs).unwrap()
}

/// Write a DataFrame to `<dir>/<name>` as CSV
pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .unwrap();
    path
}

/// Temp directory holding the three-case AVS registry
pub fn create_avs_registry() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = write_csv(temp_dir.path(), "avs_registry.csv", &mut create_avs_dataframe());
    (temp_dir, path)
}

/// A complete, valid AVS form submission
pub fn valid_avs_form() -> FormSubmission {
    [
        ("patient_code", "AVS_0042"),
        ("age_years", "58"),
        ("sex", "Male"),
        ("procedure_date", "2024-05-30"),
        ("operator_name", "Dr C"),
        ("aldo_r", "120.5"),
        ("cort_r", "400"),
        ("si_r", "5.0"),
        ("si_l", "4.2"),
        ("li", "6.1"),
        ("final_interpretation", "Unilateral right"),
        ("management_plan", "Right adrenalectomy"),
        ("complication", "No"),
        ("notes", "uneventful, discharged day 1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
