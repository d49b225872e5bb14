//! Terminal display of summaries, distributions and registry listings

use std::path::Path;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::groups::FrequencyTable;
use crate::pipeline::summary::{MetricValue, SummaryRecord};
use crate::pipeline::typed::TypedView;
use crate::report::history::ReportRun;

fn section_header(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

/// Cohort summary as a two-column table
pub fn display_summary(summary: &SummaryRecord) {
    section_header("📋", "COHORT SUMMARY");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["Metric", "Value"]));

    for (metric, value) in summary.entries() {
        let cell = match value {
            MetricValue::Unknown => Cell::new(value).fg(Color::DarkGrey),
            MetricValue::Count(_) => Cell::new(value)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
            MetricValue::Measure(_) => Cell::new(value).fg(Color::Cyan),
        };
        table.add_row(vec![Cell::new(metric), cell]);
    }

    print_indented(&table);
}

/// One frequency table with a share column
pub fn display_distribution(title: &str, table: Option<&FrequencyTable>) {
    section_header("📊", title);

    let table = match table {
        Some(t) if !t.is_empty() => t,
        _ => {
            println!("      {}", style("No data available.").dim());
            return;
        }
    };

    let total = table.total().max(1) as f64;
    let mut out = Table::new();
    out.load_preset(UTF8_FULL_CONDENSED);
    out.set_header(header(&[table.column.as_str(), "Cases", "Share"]));
    for (label, count) in &table.entries {
        out.add_row(vec![
            Cell::new(label),
            Cell::new(count),
            Cell::new(format!("{:.1}%", 100.0 * *count as f64 / total)).fg(Color::Yellow),
        ]);
    }

    print_indented(&out);
}

/// Registry rows, newest registry date first, limited to `limit` rows
pub fn display_review(view: &TypedView, limit: usize) {
    section_header("🗂️", "REGISTRY RECORDS");

    if view.is_empty() {
        println!("      {}", style("No records yet.").dim());
        return;
    }

    let columns = view.variant().review_columns();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&columns));

    for row in view.newest_first().into_iter().take(limit) {
        let cells: Vec<Cell> = columns
            .iter()
            .map(|name| {
                let value = view.get(row, name);
                if value.is_absent() {
                    Cell::new("").fg(Color::DarkGrey)
                } else {
                    Cell::new(value)
                }
            })
            .collect();
        table.add_row(cells);
    }

    print_indented(&table);
    if view.height() > limit {
        println!(
            "    {}",
            style(format!("Showing {} of {} records", limit, view.height())).dim()
        );
    }
}

/// Numbered list of file paths
pub fn display_paths(title: &str, paths: &[&Path]) {
    section_header("📂", title);
    for (i, path) in paths.iter().enumerate() {
        println!(
            "      {} {}",
            style(format!("{}.", i + 1)).dim(),
            style(path.display()).cyan()
        );
    }
}

/// Report runs with their modification time
pub fn display_runs(runs: &[ReportRun]) {
    section_header("🕘", "REPORT HISTORY");

    if runs.is_empty() {
        println!("      {}", style("No report runs found.").dim());
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["Run", "Modified"]));
    for run in runs {
        let modified: chrono::DateTime<chrono::Local> = run.modified.into();
        table.add_row(vec![
            Cell::new(&run.name),
            Cell::new(modified.format("%Y-%m-%d %H:%M:%S")).fg(Color::DarkGrey),
        ]);
    }

    print_indented(&table);
}
