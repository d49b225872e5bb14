//! Descriptive report generation
//!
//! Each run writes into a fresh timestamped directory under the output root:
//! four CSV tables and one Markdown document.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::pipeline::groups::{
    group_by_year, interpretation_distribution, management_distribution, FrequencyTable,
    INTERPRETATION_COLUMN, MANAGEMENT_COLUMN,
};
use crate::pipeline::loader::get_column_names;
use crate::pipeline::summary::{summarize, MetricValue, SummaryRecord};
use crate::pipeline::typed::{load_typed_view, TypedView};
use crate::registry::schema::{SchemaVariant, SELECTIVITY_COLUMNS, YEAR_COLUMN};
use crate::report::markdown::{render_markdown, ReportTables};

pub const DEFAULT_REPORT_PREFIX: &str = "avs_descriptive";
pub const DEFAULT_REPORT_NAME: &str = "AVS_Descriptive_Report";

pub const SUMMARY_CSV: &str = "01_summary_metrics.csv";
pub const YEAR_CSV: &str = "02_yearly_case_volume.csv";
pub const INTERPRETATION_CSV: &str = "03_interpretation_distribution.csv";
pub const MANAGEMENT_CSV: &str = "04_management_distribution.csv";

/// Inputs for one report run
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub input_csv: PathBuf,
    pub output_root: PathBuf,
    pub variant: SchemaVariant,
    pub report_prefix: String,
    pub report_name: String,
}

impl ReportConfig {
    pub fn new(input_csv: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_csv: input_csv.into(),
            output_root: output_root.into(),
            variant: SchemaVariant::Avs,
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            report_name: DEFAULT_REPORT_NAME.to_string(),
        }
    }

    /// Markdown file name, e.g. `AVS_Descriptive_Report.md`
    pub fn markdown_file_name(&self) -> String {
        format!("{}.md", self.report_name)
    }
}

/// Paths of everything one run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifacts {
    pub run_dir: PathBuf,
    pub summary_csv: PathBuf,
    pub year_csv: PathBuf,
    pub interpretation_csv: PathBuf,
    pub management_csv: PathBuf,
    pub report_markdown: PathBuf,
}

impl ReportArtifacts {
    fn in_dir(run_dir: PathBuf, markdown_name: &str) -> Self {
        Self {
            summary_csv: run_dir.join(SUMMARY_CSV),
            year_csv: run_dir.join(YEAR_CSV),
            interpretation_csv: run_dir.join(INTERPRETATION_CSV),
            management_csv: run_dir.join(MANAGEMENT_CSV),
            report_markdown: run_dir.join(markdown_name),
            run_dir,
        }
    }

    /// The five artifact files in canonical order
    pub fn files(&self) -> [&Path; 5] {
        [
            self.summary_csv.as_path(),
            self.year_csv.as_path(),
            self.interpretation_csv.as_path(),
            self.management_csv.as_path(),
            self.report_markdown.as_path(),
        ]
    }
}

/// Generate a report stamped with the current local time
pub fn generate_descriptive_report(config: &ReportConfig) -> RegistryResult<ReportArtifacts> {
    generate_descriptive_report_at(config, Local::now().naive_local())
}

/// Generate a report for an explicit generation time
///
/// Fails with `NotFound` before creating anything when the input CSV is
/// missing. Files written before a later write failure are left in place.
pub fn generate_descriptive_report_at(
    config: &ReportConfig,
    generated: NaiveDateTime,
) -> RegistryResult<ReportArtifacts> {
    let view = load_typed_view(&config.input_csv, config.variant)?;
    let header = get_column_names(&config.input_csv)?;
    info!(
        input = %config.input_csv.display(),
        rows = view.height(),
        "Loaded registry for reporting"
    );

    let run_dir = config.output_root.join(run_dir_name(&config.report_prefix, generated));
    std::fs::create_dir_all(&run_dir).map_err(|e| RegistryError::write(&run_dir, e))?;
    let artifacts = ReportArtifacts::in_dir(run_dir, &config.markdown_file_name());

    write_report_files(&view, &header, &artifacts, config, generated)?;
    info!(run_dir = %artifacts.run_dir.display(), "Report written");
    Ok(artifacts)
}

/// `<prefix>_<YYYYMMDD_HHMMSS>`
pub fn run_dir_name(prefix: &str, generated: NaiveDateTime) -> String {
    format!("{}_{}", prefix, generated.format("%Y%m%d_%H%M%S"))
}

fn write_report_files(
    view: &TypedView,
    header: &[String],
    artifacts: &ReportArtifacts,
    config: &ReportConfig,
    generated: NaiveDateTime,
) -> RegistryResult<()> {
    let in_header = |name: &str| header.iter().any(|c| c == name);

    let summary = restrict_to_header(summarize(view), &in_header);
    let yearly = group_by_year(view).filter(|_| in_header(view.variant().date_column()));
    let interpretation =
        interpretation_distribution(view).filter(|_| in_header(INTERPRETATION_COLUMN));
    let management = management_distribution(view).filter(|_| in_header(MANAGEMENT_COLUMN));

    write_csv(&artifacts.summary_csv, &mut summary_frame(&summary))?;
    write_csv(
        &artifacts.year_csv,
        &mut frequency_frame(yearly.as_ref(), YEAR_COLUMN, "cases"),
    )?;
    write_csv(
        &artifacts.interpretation_csv,
        &mut frequency_frame(interpretation.as_ref(), INTERPRETATION_COLUMN, "cases"),
    )?;
    write_csv(
        &artifacts.management_csv,
        &mut frequency_frame(management.as_ref(), MANAGEMENT_COLUMN, "cases"),
    )?;

    let markdown = render_markdown(
        &config.report_name,
        generated,
        &ReportTables {
            has_rows: !view.is_empty(),
            summary: &summary,
            yearly: yearly.as_ref(),
            interpretation: interpretation.as_ref(),
            management: management.as_ref(),
        },
    );
    std::fs::write(&artifacts.report_markdown, markdown)
        .map_err(|e| RegistryError::write(&artifacts.report_markdown, e))?;

    Ok(())
}

/// Mark metrics whose source columns were backfilled by the loader as unknown
fn restrict_to_header(mut summary: SummaryRecord, in_header: impl Fn(&str) -> bool) -> SummaryRecord {
    if !in_header("age_years") {
        summary.median_age_years = MetricValue::Unknown;
    }
    if !in_header("sex") {
        summary.female_percent = MetricValue::Unknown;
    }
    let (right, left) = SELECTIVITY_COLUMNS;
    if !(in_header(right) && in_header(left)) {
        summary.bilateral_selective_percent = MetricValue::Unknown;
    }
    if !in_header("complication") {
        summary.complication_percent = MetricValue::Unknown;
    }
    summary
}

/// `metric,value` frame; unknown values become nulls
pub fn summary_frame(summary: &SummaryRecord) -> DataFrame {
    let entries = summary.entries();
    let metrics: Vec<String> = entries.iter().map(|(name, _)| name.to_string()).collect();
    let values: Vec<Option<String>> = entries.iter().map(|(_, value)| value.to_field()).collect();
    frame_of(vec![
        Column::new("metric".into(), metrics),
        Column::new("value".into(), values),
    ])
}

/// `<category>,cases` frame; a missing table yields a header-only frame
pub fn frequency_frame(table: Option<&FrequencyTable>, category: &str, count: &str) -> DataFrame {
    let entries = table.map(|t| t.entries.as_slice()).unwrap_or(&[]);
    let labels: Vec<Option<String>> = entries.iter().map(|(cell, _)| cell.to_field()).collect();
    let counts: Vec<u64> = entries.iter().map(|(_, n)| *n as u64).collect();
    frame_of(vec![
        Column::new(category.into(), labels),
        Column::new(count.into(), counts),
    ])
}

fn frame_of(columns: Vec<Column>) -> DataFrame {
    // Both columns always share one length
    DataFrame::new(columns).unwrap_or_else(|_| DataFrame::empty())
}

fn write_csv(path: &Path, df: &mut DataFrame) -> RegistryResult<()> {
    let mut file = File::create(path).map_err(|e| RegistryError::write(path, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| RegistryError::write(path, e))?;
    debug!(path = %path.display(), rows = df.height(), "Wrote report table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cell::Cell;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_run_dir_name() {
        assert_eq!(
            run_dir_name("avs_descriptive", at(8, 4, 5)),
            "avs_descriptive_20240702_080405"
        );
    }

    #[test]
    fn test_summary_frame_blanks_unknown() {
        let df = summary_frame(&SummaryRecord::empty());
        assert_eq!(df.shape(), (5, 2));
        assert_eq!(df.column("value").unwrap().null_count(), 4);
    }

    #[test]
    fn test_frequency_frame_without_table_is_header_only() {
        let df = frequency_frame(None, "management_plan", "cases");
        assert_eq!(df.shape(), (0, 2));
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["management_plan", "cases"]);
    }

    #[test]
    fn test_frequency_frame_null_bucket() {
        let mut table = FrequencyTable::new("final_interpretation");
        table.entries = vec![(Cell::Text("Indeterminate".into()), 2), (Cell::Absent, 1)];
        let df = frequency_frame(Some(&table), "final_interpretation", "cases");
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("final_interpretation").unwrap().null_count(), 1);
    }

    #[test]
    fn test_restrict_to_header_blanks_backfilled_metrics() {
        let summary = SummaryRecord {
            total_cases: 2,
            median_age_years: MetricValue::Measure(50.0),
            female_percent: MetricValue::Measure(50.0),
            bilateral_selective_percent: MetricValue::Measure(0.0),
            complication_percent: MetricValue::Measure(0.0),
        };
        let header = ["age_years", "sex", "selectivity_index_right"];

        let restricted = restrict_to_header(summary, |name| header.contains(&name));

        assert_eq!(restricted.total_cases, 2);
        assert_eq!(restricted.median_age_years, MetricValue::Measure(50.0));
        assert_eq!(restricted.female_percent, MetricValue::Measure(50.0));
        assert_eq!(restricted.bilateral_selective_percent, MetricValue::Unknown);
        assert_eq!(restricted.complication_percent, MetricValue::Unknown);
    }

    #[test]
    fn test_missing_input_creates_nothing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let config = ReportConfig::new(temp_dir.path().join("absent.csv"), &root);

        let result = generate_descriptive_report_at(&config, at(9, 0, 0));
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
        assert!(!root.exists());
    }
}
