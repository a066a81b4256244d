//! CSV table writer for block and file-write records.
//!
//! One row per finalized region. Column names follow the weak-scaling
//! notebooks that consume these tables.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::validate_output_path;
use crate::aggregator::{BlockRecord, FileIoEvent, RunAnalysis};
use crate::parser::schema::FileKind;
use crate::utils::config::{TrackingMode, TIMESTAMP_OUTPUT_FORMAT};
use crate::utils::error::OutputError;

/// Kind of region a table row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    #[serde(rename = "block")]
    Block,
    #[serde(rename = "fileIO")]
    FileIo,
}

/// One exported row; undefined values are written as empty cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub entry_type: EntryType,
    pub id: usize,
    #[serde(rename = "core_hrs")]
    pub core_hours: Option<f64>,
    pub n_steps: usize,
    #[serde(rename = "avg_wall_time_per_step (s)")]
    pub avg_wall_time_per_step: Option<f64>,
    #[serde(rename = "avg_wall_time_norm (s)")]
    pub avg_wall_time_norm: Option<f64>,
    #[serde(rename = "std_wall_time_norm (s)")]
    pub std_wall_time_norm: Option<f64>,
    pub start_date: String,
    pub file_type: Option<FileKind>,
}

impl From<&BlockRecord> for TableRow {
    fn from(block: &BlockRecord) -> Self {
        Self {
            entry_type: EntryType::Block,
            id: block.block_id,
            core_hours: Some(block.core_hours),
            n_steps: block.n_steps,
            avg_wall_time_per_step: block.mean_step_secs,
            avg_wall_time_norm: block.mean_step_norm,
            std_wall_time_norm: block.std_step_norm,
            start_date: block.start.format(TIMESTAMP_OUTPUT_FORMAT).to_string(),
            file_type: None,
        }
    }
}

impl From<&FileIoEvent> for TableRow {
    fn from(event: &FileIoEvent) -> Self {
        // A write is a single "step": its duration fills the per-step column
        // and the spread is zero.
        Self {
            entry_type: EntryType::FileIo,
            id: event.event_id,
            core_hours: event.core_hours(),
            n_steps: 0,
            avg_wall_time_per_step: event.duration_secs(),
            avg_wall_time_norm: event.duration_norm(),
            std_wall_time_norm: event.timing().map(|_| 0.0),
            start_date: event.opened_at.format(TIMESTAMP_OUTPUT_FORMAT).to_string(),
            file_type: Some(event.kind),
        }
    }
}

/// Build the rows selected by the analysis' tracking mode
///
/// Combined tables list every block before every file write.
pub fn build_table(analysis: &RunAnalysis) -> Vec<TableRow> {
    let store = &analysis.store;
    let mut rows = Vec::with_capacity(store.block_count() + store.io_event_count());

    if analysis.mode.tracks_blocks() {
        rows.extend(store.blocks().map(TableRow::from));
    }
    if analysis.mode.tracks_file_writes() {
        rows.extend(store.io_events().map(TableRow::from));
    }

    rows
}

/// Default table path next to the log (or in `out_dir`)
///
/// `run/turb.log` becomes `run/turb_block_data.csv`, `run/turb_fileIO_data.csv`
/// or `run/turb_log_data.csv` depending on the mode.
pub fn table_path(log_path: &Path, mode: TrackingMode, out_dir: Option<&Path>) -> PathBuf {
    let suffix = match mode {
        TrackingMode::Blocks => "block_data",
        TrackingMode::FileWrites => "fileIO_data",
        TrackingMode::Both => "log_data",
    };
    sibling_path(log_path, out_dir, &format!("{}.csv", suffix))
}

/// `<dir>/<log stem>_<suffix>`, where `dir` is `out_dir` or the log's directory
pub(crate) fn sibling_path(log_path: &Path, out_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = log_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string());
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| log_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}_{}", stem, suffix))
}

/// The log path with its directory name folded into the file name
///
/// `run768/Turb.log` becomes `run768/run768_Turb.log`, so logs sharing a
/// stem get distinct outputs. `None` when the log has no parent directory name.
pub(crate) fn qualified_log_path(log_path: &Path) -> Option<PathBuf> {
    let parent = log_path.parent()?;
    let dir_name = parent.file_name()?.to_string_lossy();
    let file_name = log_path.file_name()?.to_string_lossy();
    Some(parent.join(format!("{}_{}", dir_name, file_name)))
}

/// Write table rows to a CSV file
///
/// **Public** - main entry point for tabular output
///
/// # Errors
/// * `OutputError::InvalidPath` - path is empty, a directory, or its parent can't be created
/// * `OutputError::CsvFailed` - I/O or serialization error while writing rows
pub fn write_table(rows: &[TableRow], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing {} rows to: {}", rows.len(), output_path.display());

    validate_output_path(output_path)?;

    let mut writer = csv::Writer::from_path(output_path)?;

    if rows.is_empty() {
        // Keep the header so downstream readers still see the columns
        writer.write_record(TABLE_HEADER)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!("Table written: {}", output_path.display());
    Ok(())
}

const TABLE_HEADER: [&str; 9] = [
    "entry_type",
    "id",
    "core_hrs",
    "n_steps",
    "avg_wall_time_per_step (s)",
    "avg_wall_time_norm (s)",
    "std_wall_time_norm (s)",
    "start_date",
    "file_type",
];

/// Read a table written by [`write_table`]
pub fn read_table(input_path: impl AsRef<Path>) -> Result<Vec<TableRow>, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading table from: {}", input_path.display());

    let mut reader = csv::Reader::from_path(input_path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<TableRow>, csv::Error>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_path_per_mode() {
        let log = Path::new("runs/n96/Turb.log");
        assert_eq!(
            table_path(log, TrackingMode::Blocks, None),
            Path::new("runs/n96/Turb_block_data.csv")
        );
        assert_eq!(
            table_path(log, TrackingMode::FileWrites, None),
            Path::new("runs/n96/Turb_fileIO_data.csv")
        );
        assert_eq!(
            table_path(log, TrackingMode::Both, Some(Path::new("out"))),
            Path::new("out/Turb_log_data.csv")
        );
    }

    #[test]
    fn test_qualified_log_path() {
        let qualified = qualified_log_path(Path::new("sweep/run768/Turb.log")).unwrap();
        assert_eq!(qualified, Path::new("sweep/run768/run768_Turb.log"));
        assert_eq!(
            table_path(&qualified, TrackingMode::Both, Some(Path::new("out"))),
            Path::new("out/run768_Turb_log_data.csv")
        );
        assert!(qualified_log_path(Path::new("Turb.log")).is_none());
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.csv");

        write_table(&[], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("entry_type,id,core_hrs,n_steps"));
        assert!(read_table(&path).unwrap().is_empty());
    }
}
