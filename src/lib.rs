//! clinreg: Clinical Registry Library
//!
//! Capture de-identified clinical cases into a CSV-backed registry and
//! produce descriptive summary reports from it.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod utils;

pub use error::{RegistryError, RegistryResult};
