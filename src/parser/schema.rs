//! Typed facts extracted from FLASH log lines.
//!
//! These are the values the pattern extractors hand to the parameter
//! scan and the region state machine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::utils::config::{CHECKPOINT_LABEL, PLOTFILE_LABEL, X_ZONES_LABEL, Y_ZONES_LABEL, Z_ZONES_LABEL};

/// Grid axis of a computational block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Log label announcing the per-block cell count along this axis
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => X_ZONES_LABEL,
            Axis::Y => Y_ZONES_LABEL,
            Axis::Z => Z_ZONES_LABEL,
        }
    }
}

/// One completed simulation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    pub timestamp: NaiveDateTime,
    /// Simulation time-step size
    pub dt: f64,
}

/// Result of classifying a line for the block tracker
#[derive(Debug, Clone, PartialEq)]
pub enum StepMatch {
    Step(StepRecord),
    NoMatch,
}

/// Result of classifying a line for the file-I/O tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMatch {
    Open(NaiveDateTime),
    Close(NaiveDateTime),
    NoMatch,
}

/// Kind of file a write region produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    #[serde(rename = "chk")]
    Checkpoint,
    #[serde(rename = "plt")]
    Plot,
}

impl FileKind {
    /// Short code used in exported tables
    pub fn code(self) -> &'static str {
        match self {
            FileKind::Checkpoint => "chk",
            FileKind::Plot => "plt",
        }
    }

    /// Name of the write routine that logs this kind of file
    pub fn routine(self) -> &'static str {
        match self {
            FileKind::Checkpoint => CHECKPOINT_LABEL,
            FileKind::Plot => PLOTFILE_LABEL,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Run-wide parameters fixed for the whole simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub cores: u32,
    pub cores_per_node: u32,
    /// Fractional when the core count is not a whole number of nodes
    pub nodes: f64,
    pub nxb: u32,
    pub nyb: u32,
    pub nzb: u32,
    pub cells_per_block: u64,
    pub total_cells: u64,
}

impl SimulationParameters {
    pub fn new(cores: u32, cores_per_node: u32, nxb: u32, nyb: u32, nzb: u32) -> Self {
        let cells_per_block = u64::from(nxb) * u64::from(nyb) * u64::from(nzb);
        Self {
            cores,
            cores_per_node,
            nodes: f64::from(cores) / f64::from(cores_per_node.max(1)),
            nxb,
            nyb,
            nzb,
            cells_per_block,
            total_cells: cells_per_block * u64::from(cores),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_parameters() {
        let params = SimulationParameters::new(96, 48, 16, 16, 16);
        assert_eq!(params.cells_per_block, 4096);
        assert_eq!(params.total_cells, 393_216);
        assert_eq!(params.nodes, 2.0);
    }

    #[test]
    fn test_file_kind_codes() {
        assert_eq!(FileKind::Checkpoint.code(), "chk");
        assert_eq!(FileKind::Plot.to_string(), "plt");
        assert_eq!(FileKind::Plot.routine(), "IO_writePlotfile");
    }
}
