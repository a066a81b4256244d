//! FLASH Log Stats CLI
//!
//! Splits FLASH run logs into stepping blocks and file writes and
//! writes per-region timing tables for weak-scaling studies.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use flash_log_stats::commands::{
    display_version, execute_analyze, inspect_summary, validate_args, AnalyzeArgs,
};
use flash_log_stats::utils::config::{AnalyzerConfig, MalformedStepPolicy, Site, TrackingMode};

/// FLASH Log Stats - weak-scaling analysis of FLASH run logs
#[derive(Parser, Debug)]
#[command(name = "flash-log-stats")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true, visible_alias = "debug")]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse one or more run logs
    Analyze {
        /// Log files to analyse
        #[arg(short, long = "file", num_args = 1.., required = true)]
        files: Vec<PathBuf>,

        /// Which regions to track and export
        #[arg(short, long, value_enum, default_value = "both")]
        mode: TrackingMode,

        /// Site the runs were performed on (sets cores per node)
        #[arg(long, value_enum, default_value = "supermuc-ng")]
        site: Site,

        /// Override the site's cores per node
        #[arg(long)]
        cores_per_node: Option<u32>,

        /// What to do with step lines missing a timestamp or dt
        #[arg(long, value_enum, default_value = "skip")]
        malformed_steps: MalformedStepPolicy,

        /// Directory for output files (defaults to each log's directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Also write a JSON run summary per log
        #[arg(long)]
        json_summary: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a JSON run summary and print its totals
    Inspect {
        /// Path to summary JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Analyze {
            files,
            mode,
            site,
            cores_per_node,
            malformed_steps,
            out_dir,
            json_summary,
            summary,
        } => {
            let config = AnalyzerConfig::new(mode)
                .with_malformed_steps(malformed_steps)
                .with_cores_per_node(cores_per_node.unwrap_or_else(|| site.cores_per_node()));

            let args = AnalyzeArgs {
                files,
                config,
                out_dir,
                json_summary,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            let report = execute_analyze(&args);
            if !report.all_succeeded() {
                anyhow::bail!(
                    "{} of {} log files failed",
                    report.failed.len(),
                    args.files.len()
                );
            }
        }

        Commands::Inspect { file } => {
            inspect_summary(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
