use std::path::PathBuf;
use thiserror::Error;

pub type GradeResult<T> = Result<T, GradeError>;

#[derive(Error, Debug)]
pub enum GradeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read spreadsheet: {0}")]
    Read(String),

    #[error("Failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Column '{0}' not found in roster")]
    MissingColumn(String),

    #[error("Unsupported file type: {0}. Use .csv or .xlsx")]
    UnsupportedFormat(String),

    #[error("File exists: {}. Use --overwrite to replace", .0.display())]
    OutputExists(PathBuf),

    #[error("Invalid cell reference: '{0}'")]
    InvalidCell(String),

    #[error("Duplicate identity '{identity}' in roster rows {first} and {second}")]
    DuplicateIdentity {
        identity: String,
        first: usize,
        second: usize,
    },

    #[error("Unreadable group sheet: {0}")]
    GroupSheet(String),

    #[error("Could not parse score: '{0}'")]
    Score(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Coarse classification used to decide whether a failure aborts a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or settings; the whole run stops.
    Configuration,
    /// Target file already present and overwrite was not requested.
    OutputExists,
    /// A single group sheet could not be used; the batch continues.
    Record,
    /// Filesystem or encoding failure.
    Io,
}

impl GradeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GradeError::Io(_) | GradeError::Csv(_) | GradeError::Read(_) | GradeError::Write(_) => {
                ErrorKind::Io
            }
            GradeError::OutputExists(_) => ErrorKind::OutputExists,
            GradeError::GroupSheet(_) | GradeError::Score(_) => ErrorKind::Record,
            GradeError::Yaml(_)
            | GradeError::MissingColumn(_)
            | GradeError::UnsupportedFormat(_)
            | GradeError::InvalidCell(_)
            | GradeError::DuplicateIdentity { .. }
            | GradeError::Validation(_) => ErrorKind::Configuration,
        }
    }

    /// True for failures that should skip one record rather than abort.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Record
    }
}
