//! Output writers for analysis results.
//!
//! This module handles writing data to disk in various formats:
//! - CSV tables of blocks and file writes
//! - JSON run summaries

pub mod csv;
pub mod json;

use std::path::Path;

use log::debug;

use crate::utils::error::OutputError;

// Re-export main functions
pub use self::csv::{build_table, read_table, table_path, write_table, EntryType, TableRow};
pub use self::json::{read_summary, to_summary, write_summary, RunSummary};

/// Check that `path` can be written, creating missing parent directories
///
/// # Errors
/// * `OutputError::InvalidPath` - path is empty, is a directory, or its
///   parent directory cannot be created
pub fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
