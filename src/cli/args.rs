//! Command-line argument definitions using clap

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::cell::parse_date_lenient;
use crate::registry::SchemaVariant;
use crate::report::history::DEFAULT_HISTORY_LIMIT;

/// clinreg - CSV-backed clinical registry with descriptive reporting
#[derive(Parser, Debug)]
#[command(name = "clinreg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML). Defaults to ./clinreg.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,
}

/// Which registry file a command works on
#[derive(Args, Debug, Clone, Default)]
pub struct RegistryArgs {
    /// Registry CSV path
    #[arg(short, long, env = "CLINREG_DATA")]
    pub data: Option<PathBuf>,

    /// Registry schema: "avs" or "template"
    #[arg(long)]
    pub variant: Option<SchemaVariant>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an empty registry containing only the header row
    Init {
        #[command(flatten)]
        registry: RegistryArgs,

        /// Overwrite an existing registry without asking
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },

    /// Validate a record and append it to the registry
    Add {
        #[command(flatten)]
        registry: RegistryArgs,

        /// Field value as key=value (repeatable)
        #[arg(short, long = "field", value_parser = parse_field_assignment)]
        fields: Vec<(String, String)>,

        /// JSON object of field -> value, merged before --field values
        #[arg(long)]
        json: Option<PathBuf>,

        /// Prompt for every field
        #[arg(long, default_value = "false")]
        interactive: bool,
    },

    /// List registry records, newest first
    Review {
        #[command(flatten)]
        registry: RegistryArgs,

        /// Maximum number of rows to show
        #[arg(long, default_value = "50", value_parser = validate_limit)]
        limit: usize,
    },

    /// Export the registry as CSV or Parquet (by extension)
    Export {
        #[command(flatten)]
        registry: RegistryArgs,

        /// Output path. Defaults to <variant>_registry_export_<timestamp>.csv next to the registry
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summary metrics and distributions, optionally for a date range
    Dashboard {
        #[command(flatten)]
        registry: RegistryArgs,

        /// First procedure/visit date to include (inclusive)
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,

        /// Last procedure/visit date to include (inclusive)
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<NaiveDate>,
    },

    /// Generate a descriptive report run
    Report {
        /// Input registry CSV
        #[arg(short, long, env = "CLINREG_DATA")]
        input: Option<PathBuf>,

        /// Output root directory for report runs
        #[arg(short, long, env = "CLINREG_REPORT_ROOT")]
        output: Option<PathBuf>,

        /// Registry schema of the input: "avs" or "template"
        #[arg(long)]
        variant: Option<SchemaVariant>,
    },

    /// List earlier report runs, show a run's artifacts or bundle them
    History {
        /// Output root directory holding report runs
        #[arg(short, long, env = "CLINREG_REPORT_ROOT")]
        output: Option<PathBuf>,

        /// Run directory name to inspect (defaults to the newest run when bundling)
        #[arg(long)]
        run: Option<String>,

        /// Maximum number of runs to list
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT, value_parser = validate_limit)]
        limit: usize,

        /// Write the run's artifacts into this zip file
        #[arg(long)]
        bundle: Option<PathBuf>,
    },
}

/// Parser for `key=value` field assignments
pub fn parse_field_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("'{}' is not a key=value pair", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("'{}' has an empty field name", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parser for date flags, accepting the same spellings as the registry
fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date_lenient(s).ok_or_else(|| format!("'{}' is not a valid date (expected YYYY-MM-DD)", s))
}

/// Validator for row and run limits
fn validate_limit(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value == 0 {
        Err("limit must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_assignment_keeps_value_verbatim() {
        assert_eq!(
            parse_field_assignment("notes=a=b, c").unwrap(),
            ("notes".to_string(), "a=b, c".to_string())
        );
        assert_eq!(
            parse_field_assignment("notes=").unwrap(),
            ("notes".to_string(), String::new())
        );
        assert!(parse_field_assignment("notes").is_err());
        assert!(parse_field_assignment("=x").is_err());
    }

    #[test]
    fn test_limit_rejects_zero() {
        assert!(validate_limit("0").is_err());
        assert_eq!(validate_limit("5").unwrap(), 5);
    }
}
