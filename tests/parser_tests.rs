use chrono::NaiveDateTime;
use flash_log_stats::parser::{
    extract_block_cell_count, extract_core_count, extract_io_marker, extract_step,
    extract_write_routine, scan_parameters, Axis, FileKind, IoMatch, StepMatch,
};
use flash_log_stats::utils::error::{AnalysisError, StepLineError};

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%m-%d-%Y %H:%M:%S%.f").unwrap()
}

#[test]
fn test_setup_lines() {
    assert_eq!(extract_core_count(" Number of MPI tasks:                    768"), Some(768));
    assert_eq!(extract_block_cell_count(" Number x zones:    16", Axis::X), Some(16));
    assert_eq!(extract_block_cell_count(" Number z zones:    32", Axis::Z), Some(32));
    assert_eq!(extract_block_cell_count(" Number z zones:    32", Axis::Y), None);
    assert_eq!(extract_core_count(" Number of blocks: 12"), None);
}

#[test]
fn test_step_line_with_trailing_dt_unit() {
    let line = "01-01-2022 00:00:01.500000, dt=0.01 s, n=7";
    assert_eq!(
        extract_step(line).unwrap(),
        StepMatch::Step(flash_log_stats::parser::StepRecord {
            timestamp: ts("01-01-2022 00:00:01.5"),
            dt: 0.01,
        })
    );
}

#[test]
fn test_non_step_line_is_absent_not_error() {
    assert_eq!(extract_step(" [ 01-01-2022 00:00:00.000 ] [GRID amr_refine_derefine]: initiating refinement").unwrap(), StepMatch::NoMatch);
    assert_eq!(extract_step("").unwrap(), StepMatch::NoMatch);
}

#[test]
fn test_step_marker_without_timestamp() {
    assert_eq!(extract_step("n=4 dt=1.0E-04"), Err(StepLineError::MissingTimestamp));
}

#[test]
fn test_write_routine_lines() {
    let open = " [ 03-28-2022  10:15:42.000001 ] [IO_writePlotfile] open: type=plotfile name=turb_plt_cnt_0003";
    assert_eq!(extract_write_routine(open), Some(FileKind::Plot));
    assert_eq!(extract_io_marker(open), IoMatch::Open(ts("03-28-2022 10:15:42.000001")));

    let close = " [ 03-28-2022  10:15:44.500001 ] [IO_writePlotfile] close: type=plotfile name=turb_plt_cnt_0003";
    assert_eq!(extract_io_marker(close), IoMatch::Close(ts("03-28-2022 10:15:44.500001")));
}

#[test]
fn test_scan_parameters_weak_scaling() {
    let log = "\
 Number of MPI tasks: 96
 Number x zones: 16
 Number y zones: 16
 Number z zones: 16
";
    let params = scan_parameters(log.lines(), 48).unwrap();
    assert_eq!(params.cores, 96);
    assert_eq!(params.cells_per_block, 4096);
    assert_eq!(params.total_cells, 393_216);
}

#[test]
fn test_scan_parameters_missing_everything() {
    match scan_parameters("nothing here".lines(), 48) {
        Err(AnalysisError::MissingParameters { missing }) => assert_eq!(missing.len(), 4),
        other => panic!("expected missing parameters, got {:?}", other),
    }
}
