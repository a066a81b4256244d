//! Log line parsing.
//!
//! This module handles:
//! - Extracting typed facts from single FLASH log lines
//! - Scanning a log for the fixed simulation parameters
//! - Defining the extracted value types

pub mod params;
pub mod patterns;
pub mod schema;

// Re-export main types
pub use params::scan_parameters;
pub use patterns::{
    extract_block_cell_count, extract_core_count, extract_io_marker, extract_step,
    extract_timestamp, extract_write_routine,
};
pub use schema::{Axis, FileKind, IoMatch, SimulationParameters, StepMatch, StepRecord};
