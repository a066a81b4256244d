//! Analyze command implementation.
//!
//! The analyze command, for every log file given:
//! 1. Reads the log
//! 2. Scans the fixed simulation parameters
//! 3. Deconstructs the log into blocks and file writes
//! 4. Writes the CSV table (and optionally a JSON run summary)
//!
//! Files are independent. A fatal error on one file is reported and the
//! batch moves on to the next. Logs sharing a stem (`run96/Turb.log`,
//! `run768/Turb.log`) never overwrite each other's outputs: a later log
//! whose table name is taken gets its directory name prefixed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use log::{error, info, warn};

use crate::aggregator::{calculate_run_totals, deconstruct_log, RunAnalysis};
use crate::output::csv::{qualified_log_path, sibling_path};
use crate::output::{build_table, table_path, to_summary, write_summary, write_table};
use crate::utils::config::{AnalyzerConfig, TrackingMode};
use crate::utils::error::AnalysisError;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Log files to analyse, in order
    pub files: Vec<PathBuf>,

    pub config: AnalyzerConfig,

    /// Directory for output files (defaults to each log's directory)
    pub out_dir: Option<PathBuf>,

    /// Also write `<stem>_summary.json` next to each table
    pub json_summary: bool,

    /// Print a text summary of each run to stdout
    pub print_summary: bool,
}

/// Outputs produced for one successfully analysed log
#[derive(Debug, Clone)]
pub struct FileReport {
    pub log_path: PathBuf,
    pub table_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    pub blocks: usize,
    pub file_writes: usize,
    pub warnings: usize,
}

/// Result of a whole batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<FileReport>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Read and deconstruct one log file
///
/// **Public** - the per-file pipeline without any output
///
/// # Errors
/// * `AnalysisError::ReadFailed` - the file can't be read
/// * `AnalysisError::MissingParameters` - the log lacks a required parameter
/// * `AnalysisError::InvalidParameters` - the log announces a zero core or cell count
/// * `AnalysisError::MalformedStepLine` - under `MalformedStepPolicy::Fail`
pub fn analyze_file(path: &Path, config: AnalyzerConfig) -> Result<RunAnalysis, AnalysisError> {
    let text = std::fs::read_to_string(path)?;
    deconstruct_log(&text, config)
}

/// Execute the analyze command over every file
///
/// **Public** - main entry point called from main.rs
///
/// Per-file failures are collected in the returned report rather than
/// aborting the batch.
pub fn execute_analyze(args: &AnalyzeArgs) -> BatchReport {
    let start_time = Instant::now();
    let mut report = BatchReport::default();
    let mut claimed = HashSet::new();

    for path in &args.files {
        info!("Beginning on file: {}", path.display());

        match process_file(path, args, &mut claimed) {
            Ok(file_report) => report.succeeded.push(file_report),
            Err(e) => {
                error!("{}: {:#}", path.display(), e);
                report.failed.push((path.clone(), e));
            }
        }
    }

    info!(
        "Analysed {} of {} files in {:.2}s",
        report.succeeded.len(),
        args.files.len(),
        start_time.elapsed().as_secs_f64()
    );

    report
}

fn process_file(
    path: &Path,
    args: &AnalyzeArgs,
    claimed: &mut HashSet<PathBuf>,
) -> Result<FileReport> {
    let analysis = analyze_file(path, args.config)
        .with_context(|| format!("Failed to analyse {}", path.display()))?;

    let out_dir = args.out_dir.as_deref();
    let output_base = choose_output_base(path, analysis.mode, out_dir, claimed)?;
    let table = table_path(&output_base, analysis.mode, out_dir);
    claimed.insert(table.clone());
    write_table(&build_table(&analysis), &table).context("Failed to write CSV table")?;
    info!("✓ Table written to: {}", table.display());

    let summary_path = if args.json_summary {
        let summary_path = sibling_path(&output_base, out_dir, "summary.json");
        write_summary(&to_summary(path, &analysis), &summary_path)
            .context("Failed to write JSON summary")?;
        info!("✓ Summary written to: {}", summary_path.display());
        Some(summary_path)
    } else {
        None
    };

    if args.print_summary {
        println!("\n{}", format_summary(path, &analysis));
    }

    Ok(FileReport {
        log_path: path.to_path_buf(),
        table_path: table,
        summary_path,
        blocks: analysis.store.block_count(),
        file_writes: analysis.store.io_event_count(),
        warnings: analysis.warnings.len(),
    })
}

/// Path the outputs of `path` are named after
///
/// The log itself unless an earlier log of the batch already took that
/// table name, in which case the directory-qualified name is used.
fn choose_output_base(
    path: &Path,
    mode: TrackingMode,
    out_dir: Option<&Path>,
    claimed: &HashSet<PathBuf>,
) -> Result<PathBuf> {
    if !claimed.contains(&table_path(path, mode, out_dir)) {
        return Ok(path.to_path_buf());
    }

    match qualified_log_path(path).filter(|q| !claimed.contains(&table_path(q, mode, out_dir))) {
        Some(qualified) => {
            warn!(
                "{}: table name already used in this batch, writing as {}",
                path.display(),
                table_path(&qualified, mode, out_dir).display()
            );
            Ok(qualified)
        }
        None => anyhow::bail!(
            "Outputs of {} would overwrite those of an earlier log",
            path.display()
        ),
    }
}

/// Human-readable summary of one run
pub fn format_summary(path: &Path, analysis: &RunAnalysis) -> String {
    let params = &analysis.parameters;
    let totals = calculate_run_totals(&analysis.store);
    let rule = "=".repeat(80);

    let mut lines = vec![
        rule.clone(),
        format!("RUN SUMMARY: {}", path.display()),
        rule.clone(),
        format!(
            "Cores:          {} ({:.2} nodes of {})",
            params.cores, params.nodes, params.cores_per_node
        ),
        format!(
            "Block cells:    {}x{}x{} = {} ({} total)",
            params.nxb, params.nyb, params.nzb, params.cells_per_block, params.total_cells
        ),
    ];

    if analysis.mode.tracks_blocks() {
        lines.push(format!(
            "Blocks:         {} ({} steps, {:.4} core-hours)",
            totals.blocks, totals.steps, totals.block_core_hours
        ));
        if let Some(mean) = totals.mean_step_secs {
            lines.push(format!("Mean step:      {:.6}s", mean));
        }
    }
    if analysis.mode.tracks_file_writes() {
        lines.push(format!(
            "File writes:    {} ({} chk, {} plt, {:.3}s, {:.6} hours)",
            totals.file_writes,
            totals.checkpoints,
            totals.plotfiles,
            totals.file_write_secs,
            totals.file_write_core_hours
        ));
    }
    lines.push(format!("Warnings:       {}", analysis.warnings.len()));
    for warning in &analysis.warnings {
        lines.push(format!("  - {}", warning));
    }
    lines.push(rule);

    lines.join("\n")
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.files.is_empty() {
        anyhow::bail!("At least one log file is required");
    }

    if args.config.cores_per_node == 0 {
        anyhow::bail!("cores per node must be greater than 0");
    }

    if let Some(dir) = &args.out_dir {
        if dir.is_file() {
            anyhow::bail!("Output directory is a file: {}", dir.display());
        }
    }

    Ok(())
}
