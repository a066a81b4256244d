//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod inspect;

// Re-export main command functions
pub use analyze::{analyze_file, execute_analyze, format_summary, validate_args, AnalyzeArgs, BatchReport, FileReport};
pub use inspect::{display_version, inspect_summary};
