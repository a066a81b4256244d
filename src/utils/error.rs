//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Fatal errors while analysing a single log file
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read log file: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Missing simulation parameters: {}", .missing.join(", "))]
    MissingParameters { missing: Vec<&'static str> },

    #[error("Simulation parameters must be positive, got 0 for: {}", .invalid.join(", "))]
    InvalidParameters { invalid: Vec<&'static str> },

    #[error("Malformed step line {line}: {reason}")]
    MalformedStepLine { line: usize, reason: String },
}

/// A step marker was found but the rest of the line was unusable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepLineError {
    #[error("no timestamp on step line")]
    MissingTimestamp,

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("no dt token on step line")]
    MissingDt,

    #[error("invalid dt value '{0}'")]
    InvalidDt(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    CsvFailed(#[from] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameters_message() {
        let err = AnalysisError::MissingParameters {
            missing: vec!["core count", "z zones"],
        };
        assert_eq!(
            err.to_string(),
            "Missing simulation parameters: core count, z zones"
        );
    }
}
