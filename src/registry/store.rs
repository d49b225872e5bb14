//! Registry file store
//!
//! The registry is a single CSV file. Every mutation rewrites the whole table
//! to a sibling temporary file and renames it over the target, so readers see
//! either the old or the new version, never a truncated one.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{BoxError, RegistryError, RegistryResult};
use crate::pipeline::loader::{empty_registry_frame, load_registry_frame};
use crate::registry::record::{AvsRecord, FormSubmission, RegistryRecord, TemplateRecord};
use crate::registry::schema::SchemaVariant;

/// Where a registry lives and what it holds
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    pub data_path: PathBuf,
    /// Optional CSV copied into place when the registry does not exist yet
    pub template_path: Option<PathBuf>,
    pub variant: SchemaVariant,
}

impl RegistryConfig {
    pub fn new(data_path: impl Into<PathBuf>, variant: SchemaVariant) -> Self {
        Self {
            data_path: data_path.into(),
            template_path: None,
            variant,
        }
    }

    pub fn with_template(mut self, template_path: Option<PathBuf>) -> Self {
        self.template_path = template_path;
        self
    }
}

/// Make sure the registry file exists
///
/// Parent directories are created. A missing file is seeded from the template
/// CSV when one is configured and present, otherwise a header-only file is
/// written. Existing files are never touched.
pub fn ensure_dataset(config: &RegistryConfig) -> RegistryResult<()> {
    let path = &config.data_path;
    create_parent_dirs(path)?;

    if path.exists() {
        return Ok(());
    }

    if let Some(template) = config.template_path.as_deref() {
        if template.exists() {
            std::fs::copy(template, path).map_err(|e| RegistryError::write(path, e))?;
            info!(
                template = %template.display(),
                path = %path.display(),
                "Seeded registry from template"
            );
            return Ok(());
        }
        warn!(template = %template.display(), "Template CSV not found, writing empty registry");
    }

    initialize_registry(path, config.variant)
}

/// (Re)write a header-only registry file
pub fn initialize_registry(path: &Path, variant: SchemaVariant) -> RegistryResult<()> {
    create_parent_dirs(path)?;
    let mut df = empty_registry_frame(variant).map_err(|e| RegistryError::write(path, e))?;
    write_atomically(path, |file| {
        CsvWriter::new(file).include_header(true).finish(&mut df)
    })?;
    info!(path = %path.display(), variant = %variant, "Initialized empty registry");
    Ok(())
}

/// Ensure the registry exists, then read it conformed to the schema
pub fn load_registry(config: &RegistryConfig) -> RegistryResult<DataFrame> {
    ensure_dataset(config)?;
    load_registry_frame(&config.data_path, config.variant)
}

/// Append exactly one record and atomically replace the registry file
///
/// Returns the new row count.
pub fn append_record<R: RegistryRecord>(config: &RegistryConfig, record: &R) -> RegistryResult<usize> {
    let path = &config.data_path;
    let existing = load_registry(config)?;

    let row = record_frame(R::VARIANT, record).map_err(|e| RegistryError::write(path, e))?;
    let mut combined = existing
        .vstack(&row)
        .map_err(|e| RegistryError::write(path, e))?;

    write_atomically(path, |file| {
        CsvWriter::new(file).include_header(true).finish(&mut combined)
    })?;

    debug!(record_id = record.record_id(), rows = combined.height(), "Appended record");
    Ok(combined.height())
}

/// Parse, validate and append a form submission for the configured variant
///
/// Returns the saved record id. Nothing is written when validation fails.
pub fn submit_form(
    config: &RegistryConfig,
    form: &FormSubmission,
    now: NaiveDateTime,
) -> RegistryResult<String> {
    match config.variant {
        SchemaVariant::Avs => save_form::<AvsRecord>(config, form, now),
        SchemaVariant::Template => save_form::<TemplateRecord>(config, form, now),
    }
}

fn save_form<R: RegistryRecord>(
    config: &RegistryConfig,
    form: &FormSubmission,
    now: NaiveDateTime,
) -> RegistryResult<String> {
    let record = R::from_form(form, now)?;
    append_record(config, &record)?;
    info!(record_id = record.record_id(), "Record saved");
    Ok(record.record_id().to_string())
}

/// One-row frame holding the record's values under the schema column names
fn record_frame<R: RegistryRecord>(variant: SchemaVariant, record: &R) -> PolarsResult<DataFrame> {
    let columns: Vec<Column> = variant
        .column_names()
        .into_iter()
        .zip(record.to_row())
        .map(|(name, value)| Column::new(name.into(), vec![value]))
        .collect();
    DataFrame::new(columns)
}

/// Replace `target` with whatever `writer` produces
///
/// The writer fills `<target>.tmp`, which is then renamed over the target. If
/// the writer fails the temporary file is removed and the target is left as
/// it was.
pub fn write_atomically<F, E>(target: &Path, writer: F) -> RegistryResult<()>
where
    F: FnOnce(&mut File) -> Result<(), E>,
    E: Into<BoxError>,
{
    let tmp = temporary_path(target);

    let result = File::create(&tmp)
        .map_err(|e| RegistryError::write(&tmp, e))
        .and_then(|mut file| {
            writer(&mut file).map_err(|e| RegistryError::write(target, e))?;
            file.sync_all().map_err(|e| RegistryError::write(&tmp, e))
        });

    if let Err(e) = result {
        std::fs::remove_file(&tmp).ok();
        return Err(e);
    }

    std::fs::rename(&tmp, target).map_err(|e| {
        std::fs::remove_file(&tmp).ok();
        RegistryError::write(target, e)
    })
}

/// `<path>.tmp`, keeping the original extension
pub fn temporary_path(target: &Path) -> PathBuf {
    let mut name: OsString = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write a registry table as CSV or Parquet, chosen by file extension
pub fn export_registry(df: &mut DataFrame, path: &Path) -> RegistryResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    create_parent_dirs(path)?;
    match extension.as_str() {
        "csv" => {
            let mut file = File::create(path).map_err(|e| RegistryError::write(path, e))?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(df)
                .map_err(|e| RegistryError::write(path, e))?;
        }
        "parquet" => {
            let file = File::create(path).map_err(|e| RegistryError::write(path, e))?;
            ParquetWriter::new(file)
                .finish(df)
                .map_err(|e| RegistryError::write(path, e))?;
        }
        _ => {
            return Err(RegistryError::write(
                path,
                format!(
                    "Unsupported output format: {}. Supported formats: csv, parquet",
                    extension
                ),
            ))
        }
    }

    info!(path = %path.display(), rows = df.height(), "Exported registry");
    Ok(())
}

/// `<variant>_registry_export_<YYYYMMDD_HHMMSS>.csv` next to the registry
pub fn default_export_path(data_path: &Path, variant: SchemaVariant, now: NaiveDateTime) -> PathBuf {
    let parent = data_path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!(
        "{}_registry_export_{}.csv",
        variant,
        now.format("%Y%m%d_%H%M%S")
    ))
}

fn create_parent_dirs(path: &Path) -> RegistryResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| RegistryError::write(parent, e))
        }
        _ => Ok(()),
    }
}
