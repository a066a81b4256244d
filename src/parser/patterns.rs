//! Line-level pattern extractors for the FLASH log grammar.
//!
//! Each extractor looks at a single line and either returns a typed
//! value or reports that the fact is not present. None of them keep
//! state, and "not present" is never an error.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use super::schema::{Axis, FileKind, IoMatch, StepMatch, StepRecord};
use crate::utils::config::{CHECKPOINT_LABEL, CORE_COUNT_LABEL, PLOTFILE_LABEL};
use crate::utils::error::StepLineError;

const STEP_MARKER_RE: &str = r"\bn=\d+";
const TIMESTAMP_RE: &str = r"(\d{1,2}-\d{1,2}-\d{4})\s+(\d{1,2}:\d{2}:\d{2}\.\d+)";
const DT_RE: &str = r"\bdt=(\d+(?:\.\d*)?(?:[eE][-+]?\d+)?)";
const INTEGER_RE: &str = r"\d+";
const OPEN_MARKER: &str = "open:";
const CLOSE_MARKER: &str = "close:";

fn step_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(STEP_MARKER_RE).expect("step marker pattern compiles"))
}

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMESTAMP_RE).expect("timestamp pattern compiles"))
}

fn dt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DT_RE).expect("dt pattern compiles"))
}

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(INTEGER_RE).expect("integer pattern compiles"))
}

/// Extract the MPI task count from a `Number of MPI tasks: <int>` line
pub fn extract_core_count(line: &str) -> Option<u32> {
    first_integer_after(line, CORE_COUNT_LABEL)
}

/// Extract the per-block cell count along `axis` from a `Number <axis> zones: <int>` line
pub fn extract_block_cell_count(line: &str, axis: Axis) -> Option<u32> {
    first_integer_after(line, axis.label())
}

fn first_integer_after(line: &str, label: &str) -> Option<u32> {
    let (_, rest) = line.split_once(label)?;
    integer_re().find(rest)?.as_str().parse().ok()
}

/// Classify a line as a completed simulation step
///
/// A line is a step line only if it carries an `n=<int>` marker. Once the
/// marker is present the timestamp and `dt` token are required.
///
/// # Errors
/// * `StepLineError` - the step marker is present but the timestamp or
///   `dt` token is missing or unparseable
pub fn extract_step(line: &str) -> Result<StepMatch, StepLineError> {
    if !step_marker_re().is_match(line) {
        return Ok(StepMatch::NoMatch);
    }

    let timestamp = extract_timestamp(line)?.ok_or(StepLineError::MissingTimestamp)?;
    let dt = extract_dt(line)?;

    Ok(StepMatch::Step(StepRecord { timestamp, dt }))
}

fn extract_dt(line: &str) -> Result<f64, StepLineError> {
    let Some(caps) = dt_re().captures(line) else {
        return Err(match line.find("dt=") {
            Some(idx) => StepLineError::InvalidDt(token_at(&line[idx + 3..])),
            None => StepLineError::MissingDt,
        });
    };

    let raw = &caps[1];
    match raw.parse::<f64>() {
        Ok(dt) if dt > 0.0 && dt.is_finite() => Ok(dt),
        _ => Err(StepLineError::InvalidDt(raw.to_string())),
    }
}

fn token_at(s: &str) -> String {
    s.split_whitespace().next().unwrap_or_default().to_string()
}

/// Find the first `MM-DD-YYYY HH:MM:SS.ffffff` timestamp on a line
///
/// Returns `Ok(None)` when the line has nothing shaped like a timestamp,
/// and an error when it does but the calendar values are out of range.
pub fn extract_timestamp(line: &str) -> Result<Option<NaiveDateTime>, StepLineError> {
    let Some(caps) = timestamp_re().captures(line) else {
        return Ok(None);
    };

    let invalid = || StepLineError::InvalidTimestamp(caps[0].to_string());
    let date = NaiveDate::parse_from_str(&caps[1], "%m-%d-%Y").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(&caps[2], "%H:%M:%S%.f").map_err(|_| invalid())?;

    Ok(Some(date.and_time(time)))
}

/// Identify which write routine, if any, logged this line
pub fn extract_write_routine(line: &str) -> Option<FileKind> {
    if line.contains(CHECKPOINT_LABEL) {
        Some(FileKind::Checkpoint)
    } else if line.contains(PLOTFILE_LABEL) {
        Some(FileKind::Plot)
    } else {
        None
    }
}

/// Extract an `open:` / `close:` marker and its embedded timestamp
///
/// Lines without a marker, or with a marker but no valid timestamp,
/// are `IoMatch::NoMatch`.
pub fn extract_io_marker(line: &str) -> IoMatch {
    let Ok(Some(timestamp)) = extract_timestamp(line) else {
        return IoMatch::NoMatch;
    };

    if line.contains(OPEN_MARKER) {
        IoMatch::Open(timestamp)
    } else if line.contains(CLOSE_MARKER) {
        IoMatch::Close(timestamp)
    } else {
        IoMatch::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%m-%d-%Y %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_core_count() {
        assert_eq!(extract_core_count("Number of MPI tasks:     96"), Some(96));
        assert_eq!(extract_core_count("Number of MPI tasks: none"), None);
        assert_eq!(extract_core_count("Number x zones: 16"), None);
    }

    #[test]
    fn test_block_cell_count() {
        assert_eq!(extract_block_cell_count(" Number y zones:   24", Axis::Y), Some(24));
        assert_eq!(extract_block_cell_count(" Number y zones:   24", Axis::X), None);
    }

    #[test]
    fn test_flash_style_step_line() {
        let line = " [ 03-28-2022  10:15:42.123456 ] step: n=12 t=1.000000E-03 dt=2.500000E-05";
        let StepMatch::Step(step) = extract_step(line).unwrap() else {
            panic!("expected a step");
        };
        assert_eq!(step.timestamp, ts("03-28-2022 10:15:42.123456"));
        assert_eq!(step.dt, 2.5e-5);
    }

    #[test]
    fn test_plain_line_is_not_a_step() {
        assert_eq!(extract_step("[IO_writeCheckpoint] done").unwrap(), StepMatch::NoMatch);
        // `dtn=` and `nn=` style tokens don't count as a step marker
        assert_eq!(extract_step("cfl=0.8 dtn=5 nn=2").unwrap(), StepMatch::NoMatch);
    }

    #[test]
    fn test_step_without_dt() {
        let line = "01-01-2022 00:00:00.000000 step: n=3";
        assert_eq!(extract_step(line), Err(StepLineError::MissingDt));
    }

    #[test]
    fn test_step_with_bad_dt() {
        let line = "01-01-2022 00:00:00.000000 step: n=3 dt=abc";
        assert_eq!(
            extract_step(line),
            Err(StepLineError::InvalidDt("abc".to_string()))
        );
    }

    #[test]
    fn test_step_with_non_positive_dt() {
        let negative = "01-01-2022 00:00:00.000000 step: n=3 dt=-0.01";
        assert_eq!(
            extract_step(negative),
            Err(StepLineError::InvalidDt("-0.01".to_string()))
        );
        let zero = "01-01-2022 00:00:00.000000 step: n=3 dt=0.0E+00";
        assert_eq!(
            extract_step(zero),
            Err(StepLineError::InvalidDt("0.0E+00".to_string()))
        );
    }

    #[test]
    fn test_step_without_timestamp() {
        assert_eq!(
            extract_step("step: n=3 dt=0.01 s"),
            Err(StepLineError::MissingTimestamp)
        );
    }

    #[test]
    fn test_step_with_impossible_date() {
        let line = "13-45-2022 00:00:00.000000 step: n=3 dt=0.01 s";
        assert!(matches!(
            extract_step(line),
            Err(StepLineError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_io_markers() {
        let open = "[IO_writeCheckpoint] open: 01-01-2022 00:00:00.000000 type=checkpoint";
        let close = "[IO_writePlotfile] close: 01-01-2022 00:00:10.000000";
        assert_eq!(extract_io_marker(open), IoMatch::Open(ts("01-01-2022 00:00:00.0")));
        assert_eq!(extract_io_marker(close), IoMatch::Close(ts("01-01-2022 00:00:10.0")));
        assert_eq!(extract_io_marker("[IO_writePlotfile] wrote 4 blocks"), IoMatch::NoMatch);
        assert_eq!(extract_write_routine(open), Some(FileKind::Checkpoint));
        assert_eq!(extract_write_routine(close), Some(FileKind::Plot));
        assert_eq!(extract_write_routine("step: n=1"), None);
    }
}
