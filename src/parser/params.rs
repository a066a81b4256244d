//! First pass over the log: the fixed simulation parameters.

use log::debug;

use super::patterns::{extract_block_cell_count, extract_core_count};
use super::schema::{Axis, SimulationParameters};
use crate::utils::error::AnalysisError;

/// Scan every line for the core count and per-block cell dimensions
///
/// **Public** - runs once per file before the region pass
///
/// The first value found for each field wins; later lines announcing the
/// same field are ignored.
///
/// # Errors
/// * `AnalysisError::MissingParameters` - one or more fields never appeared
/// * `AnalysisError::InvalidParameters` - a field was announced as 0
pub fn scan_parameters<'a, I>(
    lines: I,
    cores_per_node: u32,
) -> Result<SimulationParameters, AnalysisError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut cores = None;
    let mut nxb = None;
    let mut nyb = None;
    let mut nzb = None;

    for (index, line) in lines.into_iter().enumerate() {
        if cores.is_none() {
            cores = extract_core_count(line);
            if let Some(n) = cores {
                debug!("Line {}: core count {}", index + 1, n);
            }
        }
        if nxb.is_none() {
            nxb = extract_block_cell_count(line, Axis::X);
        }
        if nyb.is_none() {
            nyb = extract_block_cell_count(line, Axis::Y);
        }
        if nzb.is_none() {
            nzb = extract_block_cell_count(line, Axis::Z);
        }

        if cores.is_some() && nxb.is_some() && nyb.is_some() && nzb.is_some() {
            break;
        }
    }

    match (cores, nxb, nyb, nzb) {
        (Some(cores), Some(nxb), Some(nyb), Some(nzb)) => {
            let invalid: Vec<_> = [
                ("core count", cores),
                ("x zones", nxb),
                ("y zones", nyb),
                ("z zones", nzb),
            ]
            .into_iter()
            .filter_map(|(name, value)| (value == 0).then_some(name))
            .collect();
            if !invalid.is_empty() {
                return Err(AnalysisError::InvalidParameters { invalid });
            }

            let params = SimulationParameters::new(cores, cores_per_node, nxb, nyb, nzb);
            debug!(
                "Simulation parameters: {} cores, {}x{}x{} cells per block, {} cells total",
                params.cores, nxb, nyb, nzb, params.total_cells
            );
            Ok(params)
        }
        _ => {
            let missing = [
                ("core count", cores.is_none()),
                ("x zones", nxb.is_none()),
                ("y zones", nyb.is_none()),
                ("z zones", nzb.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            Err(AnalysisError::MissingParameters { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_weak_scaling_header() {
        let log = "Number of MPI tasks: 96\nNumber x zones: 16\nNumber y zones: 16\nNumber z zones: 16\n";
        let params = scan_parameters(log.lines(), 48).unwrap();
        assert_eq!(params.cores, 96);
        assert_eq!(params.cells_per_block, 4096);
        assert_eq!(params.total_cells, 393_216);
        assert_eq!(params.nodes, 2.0);
    }

    #[test]
    fn test_first_value_wins() {
        let log = "Number of MPI tasks: 8\nNumber of MPI tasks: 16\nNumber x zones: 8\nNumber y zones: 8\nNumber z zones: 8\nNumber x zones: 32";
        let params = scan_parameters(log.lines(), 48).unwrap();
        assert_eq!(params.cores, 8);
        assert_eq!(params.nxb, 8);
    }

    #[test]
    fn test_zero_counts_are_rejected() {
        let log = "Number of MPI tasks: 0\nNumber x zones: 0\nNumber y zones: 8\nNumber z zones: 8";
        match scan_parameters(log.lines(), 48) {
            Err(AnalysisError::InvalidParameters { invalid }) => {
                assert_eq!(invalid, vec!["core count", "x zones"]);
            }
            other => panic!("expected invalid parameters, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let log = "Number of MPI tasks: 8\nNumber y zones: 8";
        match scan_parameters(log.lines(), 48) {
            Err(AnalysisError::MissingParameters { missing }) => {
                assert_eq!(missing, vec!["x zones", "z zones"]);
            }
            other => panic!("expected missing parameters, got {:?}", other),
        }
    }
}
