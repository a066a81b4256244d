//! Region state machine over the FLASH log.
//!
//! Two independent trackers consume the same line stream:
//!
//! - the block tracker (`Idle` / `InBlock`) groups contiguous step lines
//!   into stepping blocks; any non-step line ends the current block
//! - the file-I/O tracker (`Idle` / `AwaitingClose`) pairs `open:` and
//!   `close:` markers logged by the checkpoint and plotfile writers
//!
//! Trackers only report transitions. The [`RegionStateMachine`] turns
//! completed regions into records via the metrics module and hands
//! ownership of each record to the [`ResultStore`].

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use super::metrics::{finalize_block, finalize_io_event, finalize_unterminated_io};
use super::store::{ResultStore, RunWarning};
use crate::parser::params::scan_parameters;
use crate::parser::patterns::{extract_io_marker, extract_step, extract_write_routine};
use crate::parser::schema::{FileKind, IoMatch, SimulationParameters, StepMatch, StepRecord};
use crate::utils::config::{AnalyzerConfig, MalformedStepPolicy, TrackingMode};
use crate::utils::error::AnalysisError;

/// Step lines collected since the block began
#[derive(Debug, Clone, PartialEq)]
struct OpenBlock {
    start_line: usize,
    start: NaiveDateTime,
    last: NaiveDateTime,
    timestamps: Vec<NaiveDateTime>,
    dts: Vec<f64>,
}

impl OpenBlock {
    fn begin(line_no: usize, step: StepRecord) -> Self {
        Self {
            start_line: line_no,
            start: step.timestamp,
            last: step.timestamp,
            timestamps: vec![step.timestamp],
            dts: vec![step.dt],
        }
    }

    fn push(&mut self, step: StepRecord) {
        self.last = step.timestamp;
        self.timestamps.push(step.timestamp);
        self.dts.push(step.dt);
    }

    fn complete(self, end_line: usize) -> CompletedBlock {
        CompletedBlock {
            start_line: self.start_line,
            end_line,
            start: self.start,
            end: self.last,
            timestamps: self.timestamps,
            dts: self.dts,
        }
    }
}

/// A block whose last step line has been seen
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedBlock {
    pub start_line: usize,
    pub end_line: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timestamps: Vec<NaiveDateTime>,
    pub dts: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
enum BlockState {
    #[default]
    Idle,
    InBlock(OpenBlock),
}

/// Groups contiguous step lines into blocks
#[derive(Debug, Clone, Default)]
pub struct BlockTracker {
    state: BlockState,
}

impl BlockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_block(&self) -> bool {
        matches!(self.state, BlockState::InBlock(_))
    }

    /// Whether `step` is timestamped before the last step of the open block
    pub fn regresses(&self, step: &StepMatch) -> bool {
        match (&self.state, step) {
            (BlockState::InBlock(block), StepMatch::Step(step)) => step.timestamp < block.last,
            _ => false,
        }
    }

    /// Feed one classified line; returns the block that just ended, if any
    ///
    /// A step timestamped before the previous one ends the open block and
    /// starts a new one, so every block runs forward in time.
    pub fn observe(&mut self, line_no: usize, step: StepMatch) -> Option<CompletedBlock> {
        match (std::mem::take(&mut self.state), step) {
            (BlockState::Idle, StepMatch::Step(step)) => {
                debug!("Line {}: block begins", line_no);
                self.state = BlockState::InBlock(OpenBlock::begin(line_no, step));
                None
            }
            (BlockState::InBlock(block), StepMatch::Step(step)) if step.timestamp < block.last => {
                debug!("Line {}: timestamp goes backwards, block restarts", line_no);
                self.state = BlockState::InBlock(OpenBlock::begin(line_no, step));
                Some(block.complete(line_no - 1))
            }
            (BlockState::InBlock(mut block), StepMatch::Step(step)) => {
                block.push(step);
                self.state = BlockState::InBlock(block);
                None
            }
            (BlockState::InBlock(block), StepMatch::NoMatch) => {
                debug!("Line {}: block ends", line_no);
                Some(block.complete(line_no - 1))
            }
            (BlockState::Idle, StepMatch::NoMatch) => None,
        }
    }

    /// Close a block still open when the log ends at `last_line`
    pub fn finish(self, last_line: usize) -> Option<CompletedBlock> {
        match self.state {
            BlockState::InBlock(block) => Some(block.complete(last_line)),
            BlockState::Idle => None,
        }
    }
}

/// A file write that has been opened but not yet closed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingIo {
    pub kind: FileKind,
    pub open_line: usize,
    pub opened_at: NaiveDateTime,
}

/// A file write with both markers seen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedIo {
    /// Taken from the routine that logged the `close:` marker
    pub kind: FileKind,
    pub open_line: usize,
    pub opened_at: NaiveDateTime,
    pub close_line: usize,
    pub closed_at: NaiveDateTime,
}

/// What a single write-routine line did to the file-I/O tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IoTransition {
    /// No marker on the line, nothing changed
    Ignored,
    Opened,
    /// An `open:` arrived while awaiting `close:`; the earlier write is dropped
    Reopened { discarded: PendingIo },
    Closed(ClosedIo),
    /// A `close:` arrived with no write open
    OrphanClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum IoState {
    #[default]
    Idle,
    AwaitingClose(PendingIo),
}

/// Pairs `open:` / `close:` markers from the write routines
#[derive(Debug, Clone, Default)]
pub struct IoTracker {
    state: IoState,
}

impl IoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn awaiting_close(&self) -> bool {
        matches!(self.state, IoState::AwaitingClose(_))
    }

    /// Feed a line logged by the `kind` write routine
    pub fn observe(&mut self, line_no: usize, kind: FileKind, marker: IoMatch) -> IoTransition {
        let open = |opened_at: NaiveDateTime| {
            IoState::AwaitingClose(PendingIo {
                kind,
                open_line: line_no,
                opened_at,
            })
        };

        match (self.state, marker) {
            (_, IoMatch::NoMatch) => IoTransition::Ignored,
            (IoState::Idle, IoMatch::Open(at)) => {
                self.state = open(at);
                IoTransition::Opened
            }
            (IoState::AwaitingClose(discarded), IoMatch::Open(at)) => {
                self.state = open(at);
                IoTransition::Reopened { discarded }
            }
            (IoState::AwaitingClose(pending), IoMatch::Close(closed_at)) => {
                self.state = IoState::Idle;
                if pending.kind != kind {
                    debug!(
                        "Line {}: write opened by {} closed by {}",
                        line_no,
                        pending.kind.routine(),
                        kind.routine()
                    );
                }
                IoTransition::Closed(ClosedIo {
                    kind,
                    open_line: pending.open_line,
                    opened_at: pending.opened_at,
                    close_line: line_no,
                    closed_at,
                })
            }
            (IoState::Idle, IoMatch::Close(_)) => IoTransition::OrphanClose,
        }
    }

    /// The write still open when the log ends, if any
    pub fn finish(self) -> Option<PendingIo> {
        match self.state {
            IoState::AwaitingClose(pending) => Some(pending),
            IoState::Idle => None,
        }
    }
}

/// Everything learned from one log file
#[derive(Debug, Clone)]
pub struct RunAnalysis {
    pub mode: TrackingMode,
    pub parameters: SimulationParameters,
    pub store: ResultStore,
    pub warnings: Vec<RunWarning>,
    pub line_count: usize,
}

/// Drives both trackers over a line stream and collects the results
///
/// **Public** - construct with the scanned parameters, feed every line in
/// order through [`consume_line`](Self::consume_line), then call
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct RegionStateMachine {
    config: AnalyzerConfig,
    params: SimulationParameters,
    blocks: Option<BlockTracker>,
    io: Option<IoTracker>,
    store: ResultStore,
    warnings: Vec<RunWarning>,
    line_no: usize,
}

impl RegionStateMachine {
    pub fn new(params: SimulationParameters, config: AnalyzerConfig) -> Self {
        Self {
            config,
            params,
            blocks: config.mode.tracks_blocks().then(BlockTracker::new),
            io: config.mode.tracks_file_writes().then(IoTracker::new),
            store: ResultStore::new(),
            warnings: Vec::new(),
            line_no: 0,
        }
    }

    /// Number of lines consumed so far
    pub fn line_count(&self) -> usize {
        self.line_no
    }

    /// Consume the next line of the log
    ///
    /// # Errors
    /// * `AnalysisError::MalformedStepLine` - under `MalformedStepPolicy::Fail`
    pub fn consume_line(&mut self, line: &str) -> Result<(), AnalysisError> {
        self.line_no += 1;
        let line_no = self.line_no;

        if let Some(io) = self.io.as_mut() {
            if let Some(kind) = extract_write_routine(line) {
                let transition = io.observe(line_no, kind, extract_io_marker(line));
                self.apply_io_transition(line_no, transition);
            }
        }

        if self.blocks.is_some() {
            let step = self.classify_step(line_no, line)?;
            if self.blocks.as_ref().is_some_and(|t| t.regresses(&step)) {
                self.warn(RunWarning::NonMonotonicStep { line: line_no });
            }
            let completed = self
                .blocks
                .as_mut()
                .and_then(|tracker| tracker.observe(line_no, step));

            if let Some(completed) = completed {
                let block_id = self.store.next_block_id();
                self.store
                    .insert_block(finalize_block(block_id, completed, &self.params));
            }
        }

        Ok(())
    }

    fn classify_step(&mut self, line_no: usize, line: &str) -> Result<StepMatch, AnalysisError> {
        match extract_step(line) {
            Ok(step) => Ok(step),
            Err(e) => match self.config.malformed_steps {
                MalformedStepPolicy::Fail => Err(AnalysisError::MalformedStepLine {
                    line: line_no,
                    reason: e.to_string(),
                }),
                MalformedStepPolicy::Skip => {
                    self.warn(RunWarning::MalformedStepLine {
                        line: line_no,
                        reason: e.to_string(),
                    });
                    Ok(StepMatch::NoMatch)
                }
            },
        }
    }

    fn apply_io_transition(&mut self, line_no: usize, transition: IoTransition) {
        match transition {
            IoTransition::Ignored | IoTransition::Opened => {}
            IoTransition::Reopened { discarded } => {
                self.warn(RunWarning::ReentrantIoEvent {
                    line: line_no,
                    discarded_open_line: discarded.open_line,
                });
            }
            IoTransition::Closed(closed) if closed.closed_at < closed.opened_at => {
                self.warn(RunWarning::ReversedIoEvent {
                    open_line: closed.open_line,
                    close_line: closed.close_line,
                });
            }
            IoTransition::Closed(closed) => {
                let event_id = self.store.next_io_event_id();
                self.store
                    .insert_io_event(finalize_io_event(event_id, closed, &self.params));
            }
            IoTransition::OrphanClose => {
                self.warn(RunWarning::OrphanIoClose { line: line_no });
            }
        }
    }

    fn warn(&mut self, warning: RunWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Flush any region still open at end of log and return the results
    pub fn finish(mut self) -> RunAnalysis {
        let last_line = self.line_no;

        if let Some(completed) = self.blocks.take().and_then(|t| t.finish(last_line)) {
            let block_id = self.store.next_block_id();
            self.warn(RunWarning::UnterminatedBlock {
                block_id,
                start_line: completed.start_line,
                end_line: completed.end_line,
            });
            self.store
                .insert_block(finalize_block(block_id, completed, &self.params));
        }

        if let Some(pending) = self.io.take().and_then(IoTracker::finish) {
            let event_id = self.store.next_io_event_id();
            self.warn(RunWarning::UnterminatedIoEvent {
                event_id,
                open_line: pending.open_line,
            });
            self.store
                .insert_io_event(finalize_unterminated_io(event_id, pending));
        }

        RunAnalysis {
            mode: self.config.mode,
            parameters: self.params,
            store: self.store,
            warnings: self.warnings,
            line_count: last_line,
        }
    }
}

/// Run both passes over a complete log text
///
/// **Public** - main entry point for analysing one log
///
/// # Errors
/// * `AnalysisError::MissingParameters` - the parameter scan came up short
/// * `AnalysisError::InvalidParameters` - a parameter was announced as 0
/// * `AnalysisError::MalformedStepLine` - under `MalformedStepPolicy::Fail`
pub fn deconstruct_log(text: &str, config: AnalyzerConfig) -> Result<RunAnalysis, AnalysisError> {
    let params = scan_parameters(text.lines(), config.cores_per_node)?;

    let mut machine = RegionStateMachine::new(params, config);
    for line in text.lines() {
        machine.consume_line(line)?;
    }

    let analysis = machine.finish();
    info!(
        "Deconstructed {} lines: {} blocks, {} file writes, {} warnings",
        analysis.line_count,
        analysis.store.block_count(),
        analysis.store.io_event_count(),
        analysis.warnings.len()
    );

    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%m-%d-%Y %H:%M:%S%.f").unwrap()
    }

    fn step(s: &str) -> StepMatch {
        StepMatch::Step(StepRecord {
            timestamp: ts(s),
            dt: 0.01,
        })
    }

    #[test]
    fn test_block_tracker_transitions() {
        let mut tracker = BlockTracker::new();
        assert!(tracker.observe(1, StepMatch::NoMatch).is_none());
        assert!(!tracker.in_block());

        assert!(tracker.observe(2, step("01-01-2022 00:00:00.0")).is_none());
        assert!(tracker.in_block());
        assert!(tracker.observe(3, step("01-01-2022 00:00:01.0")).is_none());

        let done = tracker.observe(4, StepMatch::NoMatch).unwrap();
        assert_eq!((done.start_line, done.end_line), (2, 3));
        assert_eq!(done.timestamps.len(), 2);
        assert_eq!(done.end, ts("01-01-2022 00:00:01.0"));
        assert!(!tracker.in_block());
        assert!(tracker.finish(4).is_none());
    }

    #[test]
    fn test_block_tracker_restarts_on_backwards_step() {
        let mut tracker = BlockTracker::new();
        tracker.observe(1, step("01-01-2022 00:00:00.0"));
        tracker.observe(2, step("01-01-2022 00:00:05.0"));

        let backwards = step("01-01-2022 00:00:01.5");
        assert!(tracker.regresses(&backwards));
        let done = tracker.observe(3, backwards).unwrap();
        assert_eq!((done.start_line, done.end_line), (1, 2));
        assert!(tracker.in_block());

        let rest = tracker.finish(3).unwrap();
        assert_eq!((rest.start_line, rest.end_line), (3, 3));
        assert_eq!(rest.start, ts("01-01-2022 00:00:01.5"));
    }

    #[test]
    fn test_block_tracker_flushes_at_eof() {
        let mut tracker = BlockTracker::new();
        tracker.observe(9, step("01-01-2022 00:00:00.0"));
        let done = tracker.finish(9).unwrap();
        assert_eq!((done.start_line, done.end_line), (9, 9));
    }

    #[test]
    fn test_io_tracker_transitions() {
        let mut tracker = IoTracker::new();
        let t0 = ts("01-01-2022 00:00:00.0");
        let t1 = ts("01-01-2022 00:00:05.0");
        let t2 = ts("01-01-2022 00:00:06.0");

        assert_eq!(
            tracker.observe(1, FileKind::Plot, IoMatch::Close(t0)),
            IoTransition::OrphanClose
        );
        assert_eq!(
            tracker.observe(2, FileKind::Plot, IoMatch::NoMatch),
            IoTransition::Ignored
        );
        assert_eq!(
            tracker.observe(3, FileKind::Plot, IoMatch::Open(t0)),
            IoTransition::Opened
        );
        assert_eq!(
            tracker.observe(4, FileKind::Checkpoint, IoMatch::Open(t1)),
            IoTransition::Reopened {
                discarded: PendingIo {
                    kind: FileKind::Plot,
                    open_line: 3,
                    opened_at: t0,
                }
            }
        );
        assert_eq!(
            tracker.observe(5, FileKind::Checkpoint, IoMatch::Close(t2)),
            IoTransition::Closed(ClosedIo {
                kind: FileKind::Checkpoint,
                open_line: 4,
                opened_at: t1,
                close_line: 5,
                closed_at: t2,
            })
        );
        assert!(!tracker.awaiting_close());
        assert!(tracker.finish().is_none());
    }

    #[test]
    fn test_machine_skips_io_when_blocks_only() {
        let params = SimulationParameters::new(8, 48, 8, 8, 8);
        let mut machine = RegionStateMachine::new(params, AnalyzerConfig::new(TrackingMode::Blocks));
        machine
            .consume_line("[IO_writeCheckpoint] open: 01-01-2022 00:00:00.000000")
            .unwrap();
        let analysis = machine.finish();
        assert_eq!(analysis.store.io_event_count(), 0);
        assert!(analysis.warnings.is_empty());
    }
}
