//! Typed view construction
//!
//! Converts the raw string frame into an ordered table of [`Cell`]s, coercing
//! declared columns and appending the derived `year`, `month` and (for the
//! AVS registry) `bilateral_selective` columns.

use std::path::Path;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::error::{RegistryError, RegistryResult};
use crate::pipeline::cell::Cell;
use crate::pipeline::loader::load_registry_frame;
use crate::registry::schema::{
    ColumnKind, SchemaVariant, BILATERAL_SELECTIVE_COLUMN, MONTH_COLUMN, SELECTIVITY_COLUMNS,
    YEAR_COLUMN,
};

/// Both selectivity indices must reach this value for a bilateral-selective case
pub const SELECTIVITY_THRESHOLD: f64 = 2.0;

/// An in-memory, type-coerced copy of a registry table
#[derive(Debug, Clone, PartialEq)]
pub struct TypedView {
    variant: SchemaVariant,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TypedView {
    /// An empty view that still carries the full typed schema
    pub fn empty(variant: SchemaVariant) -> Self {
        Self {
            variant,
            columns: typed_column_names(variant),
            rows: Vec::new(),
        }
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate one column top to bottom; `None` when the column is not in the schema
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Cell at (row, column name); absent for unknown columns
    pub fn get(&self, row: usize, name: &str) -> &Cell {
        static ABSENT: Cell = Cell::Absent;
        match (self.rows.get(row), self.column_index(name)) {
            (Some(cells), Some(idx)) => &cells[idx],
            _ => &ABSENT,
        }
    }

    /// Keep rows whose registry date falls within `[start, end]` (both optional)
    ///
    /// Rows with an absent date are dropped as soon as either bound is given.
    pub fn filter_date_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        if start.is_none() && end.is_none() {
            return self.clone();
        }
        let date_col = self.variant.date_column();
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| match self.get(*i, date_col).as_date() {
                Some(d) => start.map_or(true, |s| d >= s) && end.map_or(true, |e| d <= e),
                None => false,
            })
            .map(|(_, row)| row.clone())
            .collect();
        Self {
            variant: self.variant,
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Earliest and latest present registry date
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates: Vec<NaiveDate> = self
            .column(self.variant.date_column())?
            .filter_map(Cell::as_date)
            .collect();
        let min = dates.iter().min()?;
        let max = dates.iter().max()?;
        Some((*min, *max))
    }

    /// Row indices ordered by registry date, newest first; absent dates last
    pub fn newest_first(&self) -> Vec<usize> {
        let date_col = self.variant.date_column();
        let mut order: Vec<usize> = (0..self.height()).collect();
        order.sort_by(|a, b| {
            let da = self.get(*a, date_col).as_date();
            let db = self.get(*b, date_col).as_date();
            match (da, db) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        order
    }
}

/// Schema columns followed by derived columns
fn typed_column_names(variant: SchemaVariant) -> Vec<String> {
    let mut names: Vec<String> = variant
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    names.push(YEAR_COLUMN.to_string());
    names.push(MONTH_COLUMN.to_string());
    if variant.has_selectivity_flag() {
        names.push(BILATERAL_SELECTIVE_COLUMN.to_string());
    }
    names
}

/// Derive the bilateral selectivity flag from the two indices
///
/// True only when both are present and at or above the threshold; absent when
/// either operand is absent.
pub fn bilateral_selective(right: Option<f64>, left: Option<f64>) -> Cell {
    match (right, left) {
        (Some(r), Some(l)) => {
            Cell::Flag(r >= SELECTIVITY_THRESHOLD && l >= SELECTIVITY_THRESHOLD)
        }
        _ => Cell::Absent,
    }
}

/// Build a typed view from a conformed string frame
pub fn type_frame(df: &DataFrame, variant: SchemaVariant) -> Result<TypedView> {
    let height = df.height();
    let specs = variant.columns();

    // Materialise each declared column as optional strings
    let mut raw_columns: Vec<Vec<Option<String>>> = Vec::with_capacity(specs.len());
    for spec in specs {
        let column = df.column(spec.name)?;
        let series = column.as_materialized_series().cast(&DataType::String)?;
        let values: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        raw_columns.push(values);
    }

    let date_idx = specs
        .iter()
        .position(|s| s.name == variant.date_column());
    let (right_name, left_name) = SELECTIVITY_COLUMNS;
    let right_idx = specs.iter().position(|s| s.name == right_name);
    let left_idx = specs.iter().position(|s| s.name == left_name);

    let mut rows = Vec::with_capacity(height);
    for i in 0..height {
        let mut row: Vec<Cell> = specs
            .iter()
            .zip(raw_columns.iter())
            .map(|(spec, values)| {
                let raw = values[i].as_deref();
                match spec.kind {
                    ColumnKind::Text => Cell::text(raw),
                    ColumnKind::Number => Cell::number(raw),
                    ColumnKind::Date => Cell::date(raw),
                }
            })
            .collect();

        let date = date_idx.and_then(|idx| row[idx].as_date());
        row.push(
            date.map(|d| Cell::Integer(d.year() as i64))
                .unwrap_or(Cell::Absent),
        );
        row.push(
            date.map(|d| Cell::Text(format!("{:04}-{:02}", d.year(), d.month())))
                .unwrap_or(Cell::Absent),
        );

        if variant.has_selectivity_flag() {
            let right = right_idx.and_then(|idx| row[idx].as_f64());
            let left = left_idx.and_then(|idx| row[idx].as_f64());
            row.push(bilateral_selective(right, left));
        }

        rows.push(row);
    }

    Ok(TypedView {
        variant,
        columns: typed_column_names(variant),
        rows,
    })
}

/// Load a registry CSV and type it
///
/// Fails with [`RegistryError::NotFound`] when the file does not exist.
pub fn load_typed_view(path: &Path, variant: SchemaVariant) -> RegistryResult<TypedView> {
    let df = load_registry_frame(path, variant)?;
    if df.height() == 0 {
        return Ok(TypedView::empty(variant));
    }
    type_frame(&df, variant).map_err(|e| RegistryError::read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_frame() -> DataFrame {
        df! {
            "record_id" => [Some("r1"), Some("r2"), Some("r3")],
            "entry_timestamp" => [None::<&str>, None, None],
            "subject_code" => [Some("S1"), Some("S2"), Some("S3")],
            "visit_date" => [Some("2023-05-01"), Some("garbage"), Some("2024-01-20")],
            "category" => [Some("a"), None, Some("b")],
            "outcome" => [None::<&str>, None, None],
            "notes" => [None::<&str>, None, None],
        }
        .unwrap()
    }

    #[test]
    fn test_flag_truth_table() {
        assert_eq!(bilateral_selective(Some(2.0), Some(2.0)), Cell::Flag(true));
        assert_eq!(bilateral_selective(Some(1.9), Some(5.0)), Cell::Flag(false));
        assert_eq!(bilateral_selective(None, Some(5.0)), Cell::Absent);
        assert_eq!(bilateral_selective(Some(1.0), None), Cell::Absent);
    }

    #[test]
    fn test_type_frame_derives_year_and_month() {
        let view = type_frame(&template_frame(), SchemaVariant::Template).unwrap();

        assert_eq!(view.height(), 3);
        assert!(view.has_column("year"));
        assert!(view.has_column("month"));
        assert!(!view.has_column("bilateral_selective"));
        assert_eq!(view.get(0, "year"), &Cell::Integer(2023));
        assert_eq!(view.get(0, "month"), &Cell::Text("2023-05".to_string()));
        assert_eq!(view.get(1, "year"), &Cell::Absent);
        assert_eq!(view.get(1, "category"), &Cell::Absent);
    }

    #[test]
    fn test_unknown_column_reads_absent() {
        let view = type_frame(&template_frame(), SchemaVariant::Template).unwrap();
        assert!(view.column("sex").is_none());
        assert_eq!(view.get(0, "sex"), &Cell::Absent);
    }

    #[test]
    fn test_filter_date_range_inclusive() {
        let view = type_frame(&template_frame(), SchemaVariant::Template).unwrap();
        let start = NaiveDate::from_ymd_opt(2023, 5, 1);
        let end = NaiveDate::from_ymd_opt(2023, 12, 31);

        let filtered = view.filter_date_range(start, end);
        assert_eq!(filtered.height(), 1);
        assert_eq!(filtered.get(0, "record_id"), &Cell::Text("r1".to_string()));

        assert_eq!(view.filter_date_range(None, None).height(), 3);
    }

    #[test]
    fn test_newest_first_puts_absent_dates_last() {
        let view = type_frame(&template_frame(), SchemaVariant::Template).unwrap();
        assert_eq!(view.newest_first(), vec![2, 0, 1]);
        assert_eq!(
            view.date_bounds(),
            Some((
                NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
            ))
        );
    }

    #[test]
    fn test_empty_view_keeps_schema() {
        let view = TypedView::empty(SchemaVariant::Avs);
        assert!(view.is_empty());
        assert_eq!(view.columns().len(), 28);
        assert!(view.has_column("bilateral_selective"));
    }
}
