//! Browsing and packaging earlier report runs

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::report::writer::{INTERPRETATION_CSV, MANAGEMENT_CSV, SUMMARY_CSV, YEAR_CSV};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// A report run directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRun {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Run directories under `root` named `<prefix>_*`, newest first
///
/// A missing root yields an empty list.
pub fn recent_report_runs(root: &Path, prefix: &str, limit: usize) -> Result<Vec<ReportRun>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}_", prefix);
    let mut runs = Vec::new();
    for entry in std::fs::read_dir(root)
        .with_context(|| format!("Failed to list report directory: {}", root.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if !path.is_dir() || !name.starts_with(&pattern) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        runs.push(ReportRun {
            name,
            path,
            modified,
        });
    }

    // Name breaks ties; run names embed their timestamp
    runs.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
    runs.truncate(limit);
    Ok(runs)
}

/// Known artifacts present in a run, in canonical order
///
/// Falls back to every regular file sorted by name when none of the known
/// artifacts exist.
pub fn run_artifact_paths(run_dir: &Path, report_name: &str) -> Result<Vec<PathBuf>> {
    let markdown = format!("{}.md", report_name);
    let preferred: Vec<PathBuf> = [
        SUMMARY_CSV,
        YEAR_CSV,
        INTERPRETATION_CSV,
        MANAGEMENT_CSV,
        markdown.as_str(),
    ]
    .iter()
    .map(|name| run_dir.join(name))
    .filter(|path| path.is_file())
    .collect();

    if !preferred.is_empty() {
        return Ok(preferred);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(run_dir)
        .with_context(|| format!("Failed to list run directory: {}", run_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Package a run's artifacts into a deflate-compressed zip archive
///
/// Returns the number of files added.
pub fn bundle_report_run(run_dir: &Path, report_name: &str, zip_path: &Path) -> Result<usize> {
    let files = run_artifact_paths(run_dir, report_name)?;

    if let Some(parent) = zip_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let zip_file = std::fs::File::create(zip_path)
        .with_context(|| format!("Failed to create zip file: {}", zip_path.display()))?;

    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in &files {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact");
        zip.start_file(filename, options)
            .with_context(|| format!("Failed to add {} to zip", filename))?;
        let mut content = Vec::new();
        std::fs::File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?
            .read_to_end(&mut content)?;
        zip.write_all(&content)?;
    }

    zip.finish().context("Failed to finalize zip file")?;
    Ok(files.len())
}
