//! Reconstruction of stepping blocks and file writes from a run log.
//!
//! This module transforms classified log lines into:
//! - Stepping block records (contiguous runs of step lines)
//! - File-write records (checkpoint / plotfile open-to-close regions)
//! - Per-region timing statistics and whole-run totals

pub mod metrics;
pub mod regions;
pub mod store;

// Re-export main types and functions
pub use metrics::{calculate_run_totals, interval_stats, seconds_between, IntervalStats, RunTotals};
pub use regions::{deconstruct_log, BlockTracker, IoTracker, IoTransition, RegionStateMachine, RunAnalysis};
pub use store::{BlockRecord, FileIoEvent, IoOutcome, IoTiming, ResultStore, RunWarning};
