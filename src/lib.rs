//! FLASH Log Stats
//!
//! Weak-scaling analysis of FLASH simulation run logs.
//!
//! A run log is split into stepping blocks (contiguous runs of
//! time-step lines) and checkpoint/plotfile writes. Each block yields
//! per-step wall-clock statistics, per-cell normalized timings and
//! core-hours; each file write yields its duration.
//!
//! ## Getting Started
//!
//! ```bash
//! flash-log-stats analyze -f run_96/Turb.log run_768/Turb.log --mode both --summary
//! ```
//!
//! As a library, [`aggregator::deconstruct_log`] runs the whole pipeline
//! over the text of one log.

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
