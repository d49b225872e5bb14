//! Fixed column schemas for each registry variant

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a registry column is coerced when building a typed view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text or categorical label, kept as-is
    Text,
    /// Lenient numeric measurement
    Number,
    /// Lenient calendar date
    Date,
}

/// A single declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Text,
    }
}

const fn number(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Number,
    }
}

const fn date(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Date,
    }
}

/// Adrenal vein sampling registry columns, in file order
pub const AVS_COLUMNS: &[ColumnSpec] = &[
    text("record_id"),
    text("entry_timestamp"),
    text("patient_code"),
    number("age_years"),
    text("sex"),
    number("bmi_kg_m2"),
    date("procedure_date"),
    text("operator_name"),
    text("referring_service"),
    number("aldosterone_ng_dl_ivc"),
    number("cortisol_ug_dl_ivc"),
    number("aldosterone_ng_dl_right"),
    number("cortisol_ug_dl_right"),
    number("aldosterone_ng_dl_left"),
    number("cortisol_ug_dl_left"),
    number("selectivity_index_right"),
    number("selectivity_index_left"),
    number("lateralization_index"),
    text("contralateral_suppression"),
    text("final_interpretation"),
    text("management_plan"),
    text("bp_improved_3m"),
    text("k_normalized_3m"),
    text("complication"),
    text("notes"),
];

/// Generic study template columns, in file order
pub const TEMPLATE_COLUMNS: &[ColumnSpec] = &[
    text("record_id"),
    text("entry_timestamp"),
    text("subject_code"),
    date("visit_date"),
    text("category"),
    text("outcome"),
    text("notes"),
];

/// Column names of derived values appended to every typed view
pub const YEAR_COLUMN: &str = "year";
pub const MONTH_COLUMN: &str = "month";
pub const BILATERAL_SELECTIVE_COLUMN: &str = "bilateral_selective";

/// Selectivity index pair feeding the bilateral flag (right, left)
pub const SELECTIVITY_COLUMNS: (&str, &str) = ("selectivity_index_right", "selectivity_index_left");

/// Which registry a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    #[default]
    Avs,
    Template,
}

impl SchemaVariant {
    /// Declared columns in file order
    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            Self::Avs => AVS_COLUMNS,
            Self::Template => TEMPLATE_COLUMNS,
        }
    }

    /// Column names in file order
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }

    /// The column that drives the year and month buckets
    pub fn date_column(&self) -> &'static str {
        match self {
            Self::Avs => "procedure_date",
            Self::Template => "visit_date",
        }
    }

    /// Whether the typed view carries the bilateral selectivity flag
    pub fn has_selectivity_flag(&self) -> bool {
        matches!(self, Self::Avs)
    }

    /// Columns shown by the review listing
    pub fn review_columns(&self) -> Vec<&'static str> {
        match self {
            Self::Avs => vec![
                "record_id",
                "procedure_date",
                "patient_code",
                "sex",
                "age_years",
                "final_interpretation",
                "management_plan",
                BILATERAL_SELECTIVE_COLUMN,
                "complication",
            ],
            Self::Template => self.column_names(),
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Avs => write!(f, "avs"),
            Self::Template => write!(f, "template"),
        }
    }
}

impl FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "avs" => Ok(Self::Avs),
            "template" => Ok(Self::Template),
            other => Err(format!(
                "Unknown registry variant '{}'. Expected 'avs' or 'template'",
                other
            )),
        }
    }
}
