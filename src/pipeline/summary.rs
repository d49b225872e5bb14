//! Cohort summary metrics

use std::fmt;

use crate::pipeline::cell::{format_number, round1, Cell};
use crate::pipeline::typed::TypedView;
use crate::registry::schema::BILATERAL_SELECTIVE_COLUMN;

pub const TOTAL_CASES: &str = "total_cases";
pub const MEDIAN_AGE_YEARS: &str = "median_age_years";
pub const FEMALE_PERCENT: &str = "female_percent";
pub const BILATERAL_SELECTIVE_PERCENT: &str = "bilateral_selective_percent";
pub const COMPLICATION_PERCENT: &str = "complication_percent";

/// A single metric value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(usize),
    Measure(f64),
    Unknown,
}

impl MetricValue {
    /// CSV field: unknown becomes an empty field
    pub fn to_field(&self) -> Option<String> {
        match self {
            MetricValue::Unknown => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Measure(v) => write!(f, "{}", format_number(*v)),
            MetricValue::Unknown => write!(f, "NA"),
        }
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map(MetricValue::Measure).unwrap_or(MetricValue::Unknown)
    }
}

/// The five fixed cohort metrics
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub total_cases: usize,
    pub median_age_years: MetricValue,
    pub female_percent: MetricValue,
    pub bilateral_selective_percent: MetricValue,
    pub complication_percent: MetricValue,
}

impl SummaryRecord {
    /// Summary of an empty registry: zero cases, everything else unknown
    pub fn empty() -> Self {
        Self {
            total_cases: 0,
            median_age_years: MetricValue::Unknown,
            female_percent: MetricValue::Unknown,
            bilateral_selective_percent: MetricValue::Unknown,
            complication_percent: MetricValue::Unknown,
        }
    }

    /// (metric, value) pairs in report order
    pub fn entries(&self) -> Vec<(&'static str, MetricValue)> {
        vec![
            (TOTAL_CASES, MetricValue::Count(self.total_cases)),
            (MEDIAN_AGE_YEARS, self.median_age_years),
            (FEMALE_PERCENT, self.female_percent),
            (BILATERAL_SELECTIVE_PERCENT, self.bilateral_selective_percent),
            (COMPLICATION_PERCENT, self.complication_percent),
        ]
    }

    pub fn get(&self, metric: &str) -> Option<MetricValue> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == metric)
            .map(|(_, value)| value)
    }
}

/// Compute the cohort summary
///
/// Every percentage is over all rows. A row whose bilateral flag is unknown
/// counts as not selective. All values are rounded to one decimal.
pub fn summarize(view: &TypedView) -> SummaryRecord {
    if view.is_empty() {
        return SummaryRecord::empty();
    }

    let total = view.height();

    let median_age_years: MetricValue = view
        .column("age_years")
        .and_then(|cells| median(cells.filter_map(Cell::as_f64).collect()).map(round1))
        .into();

    let female_percent: MetricValue = view
        .column("sex")
        .map(|cells| {
            let matches = cells
                .filter(|c| c.as_text().is_some_and(|s| s.eq_ignore_ascii_case("female")))
                .count();
            percent(matches, total)
        })
        .into();

    let bilateral_selective_percent: MetricValue = view
        .column(BILATERAL_SELECTIVE_COLUMN)
        .map(|cells| {
            let selective = cells.filter(|c| c.as_flag() == Some(true)).count();
            percent(selective, total)
        })
        .into();

    let complication_percent: MetricValue = view
        .column("complication")
        .map(|cells| {
            let matches = cells.filter(|c| c.as_text() == Some("Yes")).count();
            percent(matches, total)
        })
        .into();

    SummaryRecord {
        total_cases: total,
        median_age_years,
        female_percent,
        bilateral_selective_percent,
        complication_percent,
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    round1(100.0 * part as f64 / whole as f64)
}

/// Median of the given values; `None` when empty
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::typed::type_frame;
    use crate::registry::SchemaVariant;
    use polars::prelude::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(super::median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(super::median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(super::median(vec![]), None);
    }

    #[test]
    fn test_empty_view_summary() {
        let summary = summarize(&TypedView::empty(SchemaVariant::Avs));
        assert_eq!(summary, SummaryRecord::empty());
        assert_eq!(summary.get(TOTAL_CASES), Some(MetricValue::Count(0)));
        assert_eq!(summary.get(FEMALE_PERCENT), Some(MetricValue::Unknown));
    }

    #[test]
    fn test_template_view_has_unknown_clinical_metrics() {
        let df = df! {
            "record_id" => ["r1"],
            "entry_timestamp" => ["2024-01-01T10:00:00"],
            "subject_code" => ["S1"],
            "visit_date" => ["2024-01-01"],
            "category" => ["a"],
            "outcome" => ["b"],
            "notes" => [""],
        }
        .unwrap();
        let view = type_frame(&df, SchemaVariant::Template).unwrap();
        let summary = summarize(&view);

        assert_eq!(summary.total_cases, 1);
        assert_eq!(summary.median_age_years, MetricValue::Unknown);
        assert_eq!(summary.female_percent, MetricValue::Unknown);
        assert_eq!(summary.bilateral_selective_percent, MetricValue::Unknown);
        assert_eq!(summary.complication_percent, MetricValue::Unknown);
    }

    #[test]
    fn test_unknown_bilateral_flag_counts_as_not_selective() {
        let df = df! {
            "selectivity_index_right" => [Some("2.5"), None],
            "selectivity_index_left" => [Some("3.0"), Some("4.0")],
        }
        .unwrap();
        let df = crate::pipeline::loader::conform_to_schema(df, SchemaVariant::Avs).unwrap();
        let view = type_frame(&df, SchemaVariant::Avs).unwrap();

        assert_eq!(view.get(1, BILATERAL_SELECTIVE_COLUMN), &Cell::Absent);
        assert_eq!(
            summarize(&view).bilateral_selective_percent,
            MetricValue::Measure(50.0)
        );
    }

    #[test]
    fn test_metric_value_rendering() {
        assert_eq!(MetricValue::Count(3).to_string(), "3");
        assert_eq!(MetricValue::Measure(66.7).to_string(), "66.7");
        assert_eq!(MetricValue::Measure(52.0).to_string(), "52.0");
        assert_eq!(MetricValue::Unknown.to_string(), "NA");
        assert_eq!(MetricValue::Unknown.to_field(), None);
    }
}
