//! Error types shared by the registry store, typing pipeline and report writer.

use std::path::PathBuf;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by registry and reporting operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry CSV handed to report generation does not exist.
    #[error("Input CSV not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// A submitted record failed one or more checks.
    ///
    /// Every failing check is listed; nothing was saved.
    #[error("Record failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The registry file exists but could not be read as CSV.
    #[error("Failed to read registry CSV {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// An I/O failure while replacing the registry or writing an artifact.
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// A configuration file could not be parsed.
    #[error("Invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl RegistryError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Write {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Validation messages, empty for any other variant.
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Result alias for library operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
