//! JSON run summary writer.
//!
//! Writes the simulation parameters, whole-run totals, warnings and the
//! exported rows of one analysed log as a single versioned document.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::csv::{build_table, TableRow};
use super::validate_output_path;
use crate::aggregator::{calculate_run_totals, RunAnalysis, RunTotals, RunWarning};
use crate::parser::schema::SimulationParameters;
use crate::utils::config::{TrackingMode, SUMMARY_SCHEMA_VERSION};
use crate::utils::error::OutputError;

/// Top-level summary structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version for compatibility checking
    pub version: String,

    /// Log file that was analysed
    pub log_file: String,

    pub mode: TrackingMode,

    pub parameters: SimulationParameters,

    pub totals: RunTotals,

    pub warnings: Vec<RunWarning>,

    pub rows: Vec<TableRow>,

    /// Timestamp when the summary was generated
    pub generated_at: String,
}

/// Assemble the summary of one analysed log
pub fn to_summary(log_file: &Path, analysis: &RunAnalysis) -> RunSummary {
    RunSummary {
        version: SUMMARY_SCHEMA_VERSION.to_string(),
        log_file: log_file.display().to_string(),
        mode: analysis.mode,
        parameters: analysis.parameters,
        totals: calculate_run_totals(&analysis.store),
        warnings: analysis.warnings.clone(),
        rows: build_table(analysis),
        generated_at: Utc::now().to_rfc3339(),
    }
}

/// Write a run summary to a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_summary(
    summary: &RunSummary,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing run summary to: {}", output_path.display());

    validate_output_path(output_path)?;

    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;

    Ok(())
}

/// Read a run summary from a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_summary(input_path: impl AsRef<Path>) -> Result<RunSummary, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading run summary from: {}", input_path.display());

    let file = File::open(input_path)?;
    let summary: RunSummary = serde_json::from_reader(file)?;

    debug!(
        "Summary loaded: version {}, log {}",
        summary.version, summary.log_file
    );

    Ok(summary)
}
