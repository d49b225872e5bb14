//! Configuration file handling.
//!
//! Settings come from an optional `clinreg.toml`. Command-line flags (and
//! their environment fallbacks) override file values, which override the
//! built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::schema::SchemaVariant;
use crate::registry::store::RegistryConfig;
use crate::report::writer::{ReportConfig, DEFAULT_REPORT_NAME, DEFAULT_REPORT_PREFIX};

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "clinreg.toml";

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Registry CSV path.
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// CSV copied into place when the registry does not exist yet.
    #[serde(default)]
    pub template_path: Option<String>,

    /// Directory that receives report run directories.
    #[serde(default = "default_report_root")]
    pub report_root: String,

    /// Which registry schema the data file holds.
    #[serde(default)]
    pub variant: SchemaVariant,

    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,

    #[serde(default = "default_report_name")]
    pub report_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            template_path: None,
            report_root: default_report_root(),
            variant: SchemaVariant::default(),
            report_prefix: default_report_prefix(),
            report_name: default_report_name(),
        }
    }
}

fn default_data_path() -> String {
    "data/avs/avs_registry.csv".to_string()
}

fn default_report_root() -> String {
    "reporting/outputs".to_string()
}

fn default_report_prefix() -> String {
    DEFAULT_REPORT_PREFIX.to_string()
}

fn default_report_name() -> String {
    DEFAULT_REPORT_NAME.to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: AppConfig = toml::from_str(&content).map_err(|e| RegistryError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Explicit file if given, else `clinreg.toml` when present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> RegistryResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Registry location, with optional command-line overrides applied.
    pub fn registry_config(
        &self,
        data_path: Option<&Path>,
        variant: Option<SchemaVariant>,
    ) -> RegistryConfig {
        let data_path = data_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| expand_tilde(&self.data_path));
        RegistryConfig::new(data_path, variant.unwrap_or(self.variant))
            .with_template(self.template_path.as_deref().map(expand_tilde))
    }

    /// Report inputs, with optional command-line overrides applied.
    pub fn report_config(
        &self,
        input_csv: Option<&Path>,
        output_root: Option<&Path>,
        variant: Option<SchemaVariant>,
    ) -> ReportConfig {
        let mut config = ReportConfig::new(
            input_csv
                .map(Path::to_path_buf)
                .unwrap_or_else(|| expand_tilde(&self.data_path)),
            output_root
                .map(Path::to_path_buf)
                .unwrap_or_else(|| expand_tilde(&self.report_root)),
        );
        config.variant = variant.unwrap_or(self.variant);
        config.report_prefix = self.report_prefix.clone();
        config.report_name = self.report_name.clone();
        config
    }

    pub fn report_root(&self, output_root: Option<&Path>) -> PathBuf {
        output_root
            .map(Path::to_path_buf)
            .unwrap_or_else(|| expand_tilde(&self.report_root))
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
