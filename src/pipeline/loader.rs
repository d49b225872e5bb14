//! Registry CSV loader
//!
//! Every column is read as text so that coercion happens in one place
//! (see [`crate::pipeline::typed`]) with null-on-failure semantics.

use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::SchemaVariant;

/// Field spellings read as null in every column
pub const MISSING_VALUE_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a registry CSV with all columns as strings, conformed to the schema.
///
/// Missing schema columns are backfilled with nulls and extra columns are
/// dropped, so the returned frame always has exactly the variant's columns in
/// file order. A zero-byte or header-only file yields an empty frame.
pub fn load_registry_frame(path: &Path, variant: SchemaVariant) -> RegistryResult<DataFrame> {
    if !path.exists() {
        return Err(RegistryError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = read_text_csv(path)?;
    debug!(
        path = %path.display(),
        rows = raw.height(),
        cols = raw.width(),
        "Read registry CSV"
    );
    conform_to_schema(raw, variant).map_err(|e| RegistryError::read(path, e))
}

/// Read a CSV file with schema inference disabled (every column is a string)
fn read_text_csv(path: &Path) -> RegistryResult<DataFrame> {
    let is_blank = std::fs::read_to_string(path)
        .map_err(|e| RegistryError::read(path, e))?
        .trim()
        .is_empty();
    if is_blank {
        return Ok(DataFrame::empty());
    }

    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_null_values(Some(missing_value_markers()))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| RegistryError::read(path, e))
}

fn missing_value_markers() -> NullValues {
    NullValues::AllColumns(MISSING_VALUE_MARKERS.iter().map(|s| (*s).into()).collect())
}

/// Backfill, reorder and trim columns to match the variant schema
pub fn conform_to_schema(df: DataFrame, variant: SchemaVariant) -> PolarsResult<DataFrame> {
    let height = df.height();
    let mut df = df;

    for name in variant.column_names() {
        let present = df
            .get_column_names()
            .iter()
            .any(|existing| existing.as_str() == name);
        if present {
            // Header-only files can still yield non-string dtypes; normalise.
            let column = df.column(name)?;
            if column.dtype() != &DataType::String {
                let cast = column.cast(&DataType::String)?;
                df.with_column(cast)?;
            }
        } else {
            df.with_column(Series::full_null(name.into(), height, &DataType::String))?;
        }
    }

    df.select(variant.column_names())
}

/// An empty frame with every schema column typed as string
pub fn empty_registry_frame(variant: SchemaVariant) -> PolarsResult<DataFrame> {
    let columns: Vec<Column> = variant
        .column_names()
        .into_iter()
        .map(|name| Column::new(name.into(), Vec::<Option<String>>::new()))
        .collect();
    DataFrame::new(columns)
}

/// Column names in a registry file's header row, before any backfilling
pub fn get_column_names(path: &Path) -> RegistryResult<Vec<String>> {
    if !path.exists() {
        return Err(RegistryError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let df = read_text_csv(path)?;
    Ok(df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect())
}
