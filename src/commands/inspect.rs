use anyhow::Result;
use std::path::Path;

use crate::output::{read_summary, EntryType};
use crate::utils::config::SUMMARY_SCHEMA_VERSION;

/// Validate a JSON run summary and print its headline numbers
pub fn inspect_summary(file_path: &Path) -> Result<()> {
    println!("Inspecting summary: {}", file_path.display());

    let summary = read_summary(file_path)?;
    let blocks = summary
        .rows
        .iter()
        .filter(|row| row.entry_type == EntryType::Block)
        .count();

    println!("✓ Valid run summary");
    println!("  Version: {}", summary.version);
    println!("  Log: {}", summary.log_file);
    println!("  Cores: {}", summary.parameters.cores);
    println!("  Cells per block: {}", summary.parameters.cells_per_block);
    println!("  Blocks: {} ({} rows)", summary.totals.blocks, blocks);
    println!("  Steps: {}", summary.totals.steps);
    println!("  Block core-hours: {:.4}", summary.totals.block_core_hours);
    println!("  File writes: {}", summary.totals.file_writes);
    println!("  Warnings: {}", summary.warnings.len());

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("flash-log-stats v{}", env!("CARGO_PKG_VERSION"));
    println!("Summary Schema: v{}", SUMMARY_SCHEMA_VERSION);
    println!();
    println!("Weak-scaling analysis of FLASH run logs.");
}
