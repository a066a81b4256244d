//! Configuration and constants for the analyzer.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Current JSON run summary schema version
pub const SUMMARY_SCHEMA_VERSION: &str = "1.0.0";

pub const SECONDS_PER_HOUR: f64 = 3600.0;

// Fixed labels of the FLASH log grammar
pub const CORE_COUNT_LABEL: &str = "Number of MPI tasks:";
pub const X_ZONES_LABEL: &str = "Number x zones:";
pub const Y_ZONES_LABEL: &str = "Number y zones:";
pub const Z_ZONES_LABEL: &str = "Number z zones:";
pub const CHECKPOINT_LABEL: &str = "IO_writeCheckpoint";
pub const PLOTFILE_LABEL: &str = "IO_writePlotfile";

/// Date/time format used when writing timestamps back out
pub const TIMESTAMP_OUTPUT_FORMAT: &str = "%m-%d-%Y %H:%M:%S%.6f";

/// Which region streams the state machine tracks and the exporter emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Stepping blocks only
    Blocks,
    /// Checkpoint/plot file writes only
    FileWrites,
    /// Both streams, exported as one combined table
    Both,
}

impl TrackingMode {
    pub fn tracks_blocks(self) -> bool {
        matches!(self, TrackingMode::Blocks | TrackingMode::Both)
    }

    pub fn tracks_file_writes(self) -> bool {
        matches!(self, TrackingMode::FileWrites | TrackingMode::Both)
    }
}

/// What to do with a line that carries `n=<int>` but no usable timestamp or `dt`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MalformedStepPolicy {
    /// Record a warning and treat the line as a non-step line
    #[default]
    Skip,
    /// Abort analysis of the file
    Fail,
}

/// HPC site the run was performed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Site {
    #[default]
    #[value(name = "supermuc-ng")]
    SuperMucNg,
    Gadi,
}

impl Site {
    pub fn cores_per_node(self) -> u32 {
        match self {
            Site::SuperMucNg | Site::Gadi => 48,
        }
    }
}

/// Everything the region pass needs besides the log text itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub mode: TrackingMode,
    pub malformed_steps: MalformedStepPolicy,
    pub cores_per_node: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            mode: TrackingMode::Both,
            malformed_steps: MalformedStepPolicy::default(),
            cores_per_node: Site::default().cores_per_node(),
        }
    }
}

impl AnalyzerConfig {
    pub fn new(mode: TrackingMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_malformed_steps(mut self, policy: MalformedStepPolicy) -> Self {
        self.malformed_steps = policy;
        self
    }

    pub fn with_cores_per_node(mut self, cores_per_node: u32) -> Self {
        self.cores_per_node = cores_per_node;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_mode_flags() {
        assert!(TrackingMode::Blocks.tracks_blocks());
        assert!(!TrackingMode::Blocks.tracks_file_writes());
        assert!(!TrackingMode::FileWrites.tracks_blocks());
        assert!(TrackingMode::Both.tracks_blocks());
        assert!(TrackingMode::Both.tracks_file_writes());
    }

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.cores_per_node, 48);
        assert_eq!(config.malformed_steps, MalformedStepPolicy::Skip);
    }
}
