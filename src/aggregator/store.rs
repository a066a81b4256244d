//! Finalized region records and the store that owns them.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::schema::FileKind;

/// One maximal contiguous run of step lines
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRecord {
    pub block_id: usize,
    pub start: NaiveDateTime,
    /// Timestamp of the last step in the block
    pub end: NaiveDateTime,
    pub start_line: usize,
    pub end_line: usize,
    /// Number of step transitions, one less than the number of step lines
    pub n_steps: usize,
    pub timestamps: Vec<NaiveDateTime>,
    pub dts: Vec<f64>,
    pub wall_time_secs: f64,
    pub core_hours: f64,
    /// Step interval statistics in seconds; `None` for single-step blocks
    pub mean_step_secs: Option<f64>,
    pub std_step_secs: Option<f64>,
    /// Step interval statistics divided by cells per block
    pub mean_step_norm: Option<f64>,
    pub std_step_norm: Option<f64>,
}

/// Timing of a write region that saw its `close:` marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IoTiming {
    pub closed_at: NaiveDateTime,
    pub close_line: usize,
    pub duration_secs: f64,
    /// Duration in hours, not scaled by the core count
    pub core_hours: f64,
    pub duration_norm: f64,
}

/// How a write region ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IoOutcome {
    Closed(IoTiming),
    /// The log ended before the `close:` marker
    Unterminated,
}

/// One open-to-close checkpoint or plot file write
#[derive(Debug, Clone, PartialEq)]
pub struct FileIoEvent {
    pub event_id: usize,
    pub kind: FileKind,
    pub opened_at: NaiveDateTime,
    pub open_line: usize,
    pub outcome: IoOutcome,
}

impl FileIoEvent {
    pub fn timing(&self) -> Option<&IoTiming> {
        match &self.outcome {
            IoOutcome::Closed(timing) => Some(timing),
            IoOutcome::Unterminated => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.outcome, IoOutcome::Closed(_))
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.timing().map(|t| t.duration_secs)
    }

    pub fn core_hours(&self) -> Option<f64> {
        self.timing().map(|t| t.core_hours)
    }

    pub fn duration_norm(&self) -> Option<f64> {
        self.timing().map(|t| t.duration_norm)
    }
}

/// Non-fatal conditions seen during the region pass
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    #[error("line {line}: skipped malformed step line ({reason})")]
    MalformedStepLine { line: usize, reason: String },

    #[error("block {block_id} (from line {start_line}) still open at end of log, closed at line {end_line}")]
    UnterminatedBlock {
        block_id: usize,
        start_line: usize,
        end_line: usize,
    },

    #[error("file write {event_id} opened at line {open_line} never closed")]
    UnterminatedIoEvent { event_id: usize, open_line: usize },

    #[error("line {line}: file write reopened before close, discarding write opened at line {discarded_open_line}")]
    ReentrantIoEvent {
        line: usize,
        discarded_open_line: usize,
    },

    #[error("line {line}: close marker without a matching open")]
    OrphanIoClose { line: usize },

    #[error("line {line}: step timestamp earlier than the previous step, block restarted")]
    NonMonotonicStep { line: usize },

    #[error("file write opened at line {open_line} closed earlier in time at line {close_line}, dropped")]
    ReversedIoEvent { open_line: usize, close_line: usize },
}

/// Finalized blocks and file writes in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    blocks: BTreeMap<usize, BlockRecord>,
    io_events: BTreeMap<usize, FileIoEvent>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next stored block will receive
    pub fn next_block_id(&self) -> usize {
        self.blocks.len()
    }

    /// Id the next stored file write will receive
    pub fn next_io_event_id(&self) -> usize {
        self.io_events.len()
    }

    pub fn insert_block(&mut self, block: BlockRecord) {
        debug_assert_eq!(block.block_id, self.next_block_id());
        self.blocks.insert(block.block_id, block);
    }

    pub fn insert_io_event(&mut self, event: FileIoEvent) {
        debug_assert_eq!(event.event_id, self.next_io_event_id());
        self.io_events.insert(event.event_id, event);
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BlockRecord> {
        self.blocks.values()
    }

    pub fn io_events(&self) -> impl Iterator<Item = &FileIoEvent> {
        self.io_events.values()
    }

    pub fn block(&self, block_id: usize) -> Option<&BlockRecord> {
        self.blocks.get(&block_id)
    }

    pub fn io_event(&self, event_id: usize) -> Option<&FileIoEvent> {
        self.io_events.get(&event_id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn io_event_count(&self) -> usize {
        self.io_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.io_events.is_empty()
    }
}
