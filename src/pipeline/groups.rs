//! Frequency tables grouped by derived categorical columns
//!
//! Two null policies coexist here and both are intentional:
//! date buckets (year, month) drop rows without a parseable date, while label
//! groupings (interpretation, plan) count the absent label as its own bucket.

use std::collections::BTreeMap;

use crate::pipeline::cell::Cell;
use crate::pipeline::typed::TypedView;
use crate::registry::schema::{MONTH_COLUMN, YEAR_COLUMN};

pub const INTERPRETATION_COLUMN: &str = "final_interpretation";
pub const MANAGEMENT_COLUMN: &str = "management_plan";

/// Ordered (category, count) pairs
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    /// Header of the category column when written out
    pub column: String,
    /// Categories with their counts; `Cell::Absent` is the null bucket
    pub entries: Vec<(Cell, usize)>,
}

impl FrequencyTable {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Count for a text label, or for the null bucket when `label` is `None`
    pub fn count_for(&self, label: Option<&str>) -> Option<usize> {
        self.entries
            .iter()
            .find(|(cell, _)| match label {
                Some(l) => cell.as_text() == Some(l),
                None => cell.is_absent(),
            })
            .map(|(_, n)| *n)
    }
}

/// Cases per year, ascending; rows without a parseable date are excluded
///
/// Returns `None` when the view has no year column.
pub fn group_by_year(view: &TypedView) -> Option<FrequencyTable> {
    let cells = view.column(YEAR_COLUMN)?;
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for year in cells.filter_map(Cell::as_i64) {
        *counts.entry(year).or_default() += 1;
    }

    let mut table = FrequencyTable::new(YEAR_COLUMN);
    table.entries = counts
        .into_iter()
        .map(|(year, n)| (Cell::Integer(year), n))
        .collect();
    Some(table)
}

/// Cases per `YYYY-MM` bucket, ascending; rows without a date are excluded
pub fn group_by_month(view: &TypedView) -> Option<FrequencyTable> {
    let cells = view.column(MONTH_COLUMN)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for month in cells.filter_map(Cell::as_text) {
        *counts.entry(month.to_string()).or_default() += 1;
    }

    let mut table = FrequencyTable::new(MONTH_COLUMN);
    table.entries = counts
        .into_iter()
        .map(|(month, n)| (Cell::Text(month), n))
        .collect();
    Some(table)
}

/// Cases per label, most frequent first; the absent label is its own bucket
///
/// Ties keep the order in which labels first appear. Returns `None` when the
/// column is not part of the view.
pub fn group_by_label(view: &TypedView, column: &str) -> Option<FrequencyTable> {
    let cells = view.column(column)?;

    let mut entries: Vec<(Cell, usize)> = Vec::new();
    for cell in cells {
        match entries.iter_mut().find(|(existing, _)| existing == cell) {
            Some((_, n)) => *n += 1,
            None => entries.push((cell.clone(), 1)),
        }
    }
    // stable sort: ties keep first-appearance order
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    let mut table = FrequencyTable::new(column);
    table.entries = entries;
    Some(table)
}

pub fn interpretation_distribution(view: &TypedView) -> Option<FrequencyTable> {
    group_by_label(view, INTERPRETATION_COLUMN)
}

pub fn management_distribution(view: &TypedView) -> Option<FrequencyTable> {
    group_by_label(view, MANAGEMENT_COLUMN)
}
