//! Derived timing metrics for completed regions.
//!
//! Step intervals, core-hours and per-cell normalization. Block core-hours
//! are scaled by the core count; file-write core-hours are not.

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use super::regions::{ClosedIo, CompletedBlock, PendingIo};
use super::store::{BlockRecord, FileIoEvent, IoOutcome, IoTiming, ResultStore};
use crate::parser::schema::{FileKind, SimulationParameters};
use crate::utils::config::SECONDS_PER_HOUR;

/// Wall-clock seconds from `start` to `end`, exact to the microsecond
pub fn seconds_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Consecutive differences between timestamps, in seconds
pub fn step_intervals(timestamps: &[NaiveDateTime]) -> Vec<f64> {
    timestamps
        .windows(2)
        .map(|pair| seconds_between(pair[0], pair[1]))
        .collect()
}

/// Mean and population standard deviation of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalStats {
    pub mean: f64,
    pub std: f64,
}

impl IntervalStats {
    fn scaled(self, divisor: f64) -> Self {
        Self {
            mean: self.mean / divisor,
            std: self.std / divisor,
        }
    }
}

/// Mean and population std of `values`, or `None` when there are none
pub fn interval_stats(values: &[f64]) -> Option<IntervalStats> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(IntervalStats {
        mean,
        std: variance.sqrt(),
    })
}

/// Core-hours for a stepping block: wall-clock hours times cores
pub fn block_core_hours(wall_time_secs: f64, cores: u32) -> f64 {
    wall_time_secs / SECONDS_PER_HOUR * f64::from(cores)
}

/// Core-hours for a file write: wall-clock hours only
pub fn io_core_hours(duration_secs: f64) -> f64 {
    duration_secs / SECONDS_PER_HOUR
}

/// Divide a timing quantity by the number of cells in one block
pub fn per_cell(value: f64, params: &SimulationParameters) -> f64 {
    value / params.cells_per_block as f64
}

/// Compute the statistics of a finished block
///
/// **Public** - called by the region state machine when a block ends
pub fn finalize_block(
    block_id: usize,
    block: CompletedBlock,
    params: &SimulationParameters,
) -> BlockRecord {
    let intervals = step_intervals(&block.timestamps);
    let stats = interval_stats(&intervals);
    let norm = stats.map(|s| s.scaled(params.cells_per_block as f64));
    let wall_time_secs = seconds_between(block.start, block.end);

    debug!(
        "Block {}: lines {}-{}, {} steps, {:.3}s wall time",
        block_id,
        block.start_line,
        block.end_line,
        intervals.len(),
        wall_time_secs
    );

    BlockRecord {
        block_id,
        start: block.start,
        end: block.end,
        start_line: block.start_line,
        end_line: block.end_line,
        n_steps: intervals.len(),
        timestamps: block.timestamps,
        dts: block.dts,
        wall_time_secs,
        core_hours: block_core_hours(wall_time_secs, params.cores),
        mean_step_secs: stats.map(|s| s.mean),
        std_step_secs: stats.map(|s| s.std),
        mean_step_norm: norm.map(|s| s.mean),
        std_step_norm: norm.map(|s| s.std),
    }
}

/// Compute the timing of a closed file write
///
/// **Public** - called by the region state machine on a `close:` marker
pub fn finalize_io_event(
    event_id: usize,
    io: ClosedIo,
    params: &SimulationParameters,
) -> FileIoEvent {
    let duration_secs = seconds_between(io.opened_at, io.closed_at);

    debug!(
        "File write {} ({}): {:.3}s between lines {} and {}",
        event_id, io.kind, duration_secs, io.open_line, io.close_line
    );

    FileIoEvent {
        event_id,
        kind: io.kind,
        opened_at: io.opened_at,
        open_line: io.open_line,
        outcome: IoOutcome::Closed(IoTiming {
            closed_at: io.closed_at,
            close_line: io.close_line,
            duration_secs,
            core_hours: io_core_hours(duration_secs),
            duration_norm: per_cell(duration_secs, params),
        }),
    }
}

/// Record a file write that never saw its `close:` marker
pub fn finalize_unterminated_io(event_id: usize, pending: PendingIo) -> FileIoEvent {
    FileIoEvent {
        event_id,
        kind: pending.kind,
        opened_at: pending.opened_at,
        open_line: pending.open_line,
        outcome: IoOutcome::Unterminated,
    }
}

/// Whole-run totals across every finalized region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub blocks: usize,
    pub steps: usize,
    pub block_wall_time_secs: f64,
    pub block_core_hours: f64,
    /// Mean step interval over all blocks, weighted by step count
    pub mean_step_secs: Option<f64>,
    pub file_writes: usize,
    pub checkpoints: usize,
    pub plotfiles: usize,
    pub file_write_secs: f64,
    pub file_write_core_hours: f64,
}

/// Sum up every finalized block and file write
pub fn calculate_run_totals(store: &ResultStore) -> RunTotals {
    let mut totals = RunTotals::default();

    for block in store.blocks() {
        totals.blocks += 1;
        totals.steps += block.n_steps;
        totals.block_core_hours += block.core_hours;
        totals.block_wall_time_secs += block.wall_time_secs;
    }

    if totals.steps > 0 {
        totals.mean_step_secs = Some(totals.block_wall_time_secs / totals.steps as f64);
    }

    for event in store.io_events() {
        totals.file_writes += 1;
        match event.kind {
            FileKind::Checkpoint => totals.checkpoints += 1,
            FileKind::Plot => totals.plotfiles += 1,
        }
        if let Some(timing) = event.timing() {
            totals.file_write_secs += timing.duration_secs;
            totals.file_write_core_hours += timing.core_hours;
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%m-%d-%Y %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_seconds_across_midnight() {
        let a = ts("12-31-2021 23:59:59.250000");
        let b = ts("01-01-2022 00:00:01.000000");
        assert_eq!(seconds_between(a, b), 1.75);
    }

    #[test]
    fn test_interval_stats() {
        let stats = interval_stats(&[1.0, 3.0]).unwrap();
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.std, 1.0);
    }

    #[test]
    fn test_interval_stats_empty() {
        assert!(interval_stats(&[]).is_none());
    }

    #[test]
    fn test_core_hours_asymmetry() {
        assert_eq!(block_core_hours(3600.0, 96), 96.0);
        assert_eq!(io_core_hours(3600.0), 1.0);
    }

    #[test]
    fn test_single_step_block_has_no_interval_stats() {
        let params = SimulationParameters::new(4, 48, 8, 8, 8);
        let t = ts("01-01-2022 00:00:00.000000");
        let block = CompletedBlock {
            start_line: 7,
            end_line: 7,
            start: t,
            end: t,
            timestamps: vec![t],
            dts: vec![0.01],
        };

        let record = finalize_block(0, block, &params);
        assert_eq!(record.n_steps, 0);
        assert_eq!(record.core_hours, 0.0);
        assert!(record.mean_step_secs.is_none());
        assert!(record.std_step_norm.is_none());
    }
}
