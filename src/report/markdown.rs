//! Markdown rendering of a report run

use std::fmt::{self, Write};

use chrono::NaiveDateTime;

use crate::pipeline::groups::FrequencyTable;
use crate::pipeline::summary::SummaryRecord;

const NO_DATA: &str = "- No data available.";
const NO_DATES: &str = "- No valid procedure dates available.";

/// Everything the document is rendered from
pub struct ReportTables<'a> {
    /// Whether the source table had any rows at all
    pub has_rows: bool,
    pub summary: &'a SummaryRecord,
    pub yearly: Option<&'a FrequencyTable>,
    pub interpretation: Option<&'a FrequencyTable>,
    pub management: Option<&'a FrequencyTable>,
}

/// `AVS_Descriptive_Report` -> `AVS Descriptive Report`
pub fn report_title(report_name: &str) -> String {
    report_name.replace('_', " ")
}

/// Render the report document
pub fn render_markdown(report_name: &str, generated: NaiveDateTime, tables: &ReportTables) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_document(&mut out, report_name, generated, tables);
    out
}

fn write_document(
    out: &mut String,
    report_name: &str,
    generated: NaiveDateTime,
    tables: &ReportTables,
) -> fmt::Result {
    writeln!(out, "# {}", report_title(report_name))?;
    writeln!(out)?;
    writeln!(out, "Generated: {}", generated.format("%Y-%m-%dT%H:%M:%S"))?;
    writeln!(out)?;

    writeln!(out, "## Cohort Summary")?;
    writeln!(out)?;
    for (metric, value) in tables.summary.entries() {
        writeln!(out, "- {}: {}", metric, value)?;
    }
    writeln!(out)?;

    writeln!(out, "## Annual Case Volume")?;
    writeln!(out)?;
    match tables.yearly {
        Some(table) if !table.is_empty() => write_entries(out, table)?,
        Some(_) if tables.has_rows => writeln!(out, "{}", NO_DATES)?,
        _ => writeln!(out, "{}", NO_DATA)?,
    }
    writeln!(out)?;

    writeln!(out, "## Interpretation Distribution")?;
    writeln!(out)?;
    write_distribution(out, tables.interpretation)?;
    writeln!(out)?;

    writeln!(out, "## Management Distribution")?;
    writeln!(out)?;
    write_distribution(out, tables.management)
}

fn write_distribution(out: &mut String, table: Option<&FrequencyTable>) -> fmt::Result {
    match table {
        Some(table) if !table.is_empty() => write_entries(out, table),
        _ => writeln!(out, "{}", NO_DATA),
    }
}

fn write_entries(out: &mut String, table: &FrequencyTable) -> fmt::Result {
    for (label, count) in &table.entries {
        writeln!(out, "- {}: {}", label, count)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cell::Cell;
    use crate::pipeline::summary::MetricValue;
    use chrono::NaiveDate;

    fn generated() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 1)
            .unwrap()
    }

    fn table(column: &str, entries: Vec<(Cell, usize)>) -> FrequencyTable {
        let mut t = FrequencyTable::new(column);
        t.entries = entries;
        t
    }

    #[test]
    fn test_empty_registry_document() {
        let summary = SummaryRecord::empty();
        let empty_year = table("year", vec![]);
        let doc = render_markdown(
            "AVS_Descriptive_Report",
            generated(),
            &ReportTables {
                has_rows: false,
                summary: &summary,
                yearly: Some(&empty_year),
                interpretation: None,
                management: None,
            },
        );

        assert!(doc.starts_with("# AVS Descriptive Report\n\nGenerated: 2024-01-05T10:00:01\n"));
        assert!(doc.contains("- total_cases: 0\n"));
        assert!(doc.contains("- median_age_years: NA\n"));
        assert!(!doc.contains("No valid procedure dates"));
        assert_eq!(doc.matches(NO_DATA).count(), 3);
    }

    #[test]
    fn test_rows_without_dates_use_date_fallback() {
        let mut summary = SummaryRecord::empty();
        summary.total_cases = 2;
        summary.female_percent = MetricValue::Measure(50.0);
        let empty_year = table("year", vec![]);
        let interp = table(
            "final_interpretation",
            vec![(Cell::Text("Unilateral left".into()), 1), (Cell::Absent, 1)],
        );
        let doc = render_markdown(
            "AVS_Descriptive_Report",
            generated(),
            &ReportTables {
                has_rows: true,
                summary: &summary,
                yearly: Some(&empty_year),
                interpretation: Some(&interp),
                management: None,
            },
        );

        assert!(doc.contains("## Annual Case Volume\n\n- No valid procedure dates available.\n"));
        assert!(doc.contains("- female_percent: 50.0\n"));
        assert!(doc.contains("- Unilateral left: 1\n- NA: 1\n"));
        assert!(doc.contains("## Management Distribution\n\n- No data available.\n"));
    }

    #[test]
    fn test_year_entries() {
        let summary = SummaryRecord::empty();
        let years = table("year", vec![(Cell::Integer(2023), 2), (Cell::Integer(2024), 1)]);
        let doc = render_markdown(
            "AVS_Descriptive_Report",
            generated(),
            &ReportTables {
                has_rows: true,
                summary: &summary,
                yearly: Some(&years),
                interpretation: None,
                management: None,
            },
        );
        assert!(doc.contains("- 2023: 2\n- 2024: 1\n"));
    }
}
