//! Error types for the flowcalc command line.

use thiserror::Error;

/// Problems with the command line itself.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Invalid --cell assignment '{0}', expected REF=INPUT")]
    InvalidCellAssignment(String),

    #[error("Invalid --limit '{0}', expected a non-negative integer")]
    InvalidLimit(String),

    #[error("--sql requires --table")]
    MissingTable,

    #[error("Only one of -c, --sql, --deps or --functions may be given")]
    ConflictingModes,
}
