use std::path::PathBuf;
use thiserror::Error;

/// Failures while opening, decoding or splitting the ledger export.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The ledger file could not be opened or read from disk.
    #[error("Failed to read ledger {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be split into fields.
    #[error("Malformed record in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The file has no header line at all.
    #[error("Ledger file is empty: {0}")]
    EmptyFile(PathBuf),

    /// The header produced no usable column names (wrong delimiter or encoding).
    #[error("No usable columns in {0}")]
    NoColumns(PathBuf),

    /// A column the pipeline cannot run without is absent from the header.
    #[error("Required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },
}

/// A required numeric field could not be coerced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// The document value is not a locale-formatted decimal.
    #[error("Invalid currency value '{value}' in column '{column}' at line {line}")]
    InvalidCurrency {
        column: String,
        line: usize,
        value: String,
    },

    /// The branch identifier is not an integer.
    #[error("Invalid branch code '{value}' in column '{column}' at line {line}")]
    InvalidBranchCode {
        column: String,
        line: usize,
        value: String,
    },
}

/// Filesystem or encoder failure while writing a branch artifact.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The branch/period directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workbook encoder or its final save failed.
    #[error("Failed to write workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },
}

/// Failure while handing a composed notification to a dispatcher.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to write outbox file {path}: {source}")]
    Outbox {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

/// All errors produced by the ledger report pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    /// Every issue date in the ledger was empty or unparsable.
    #[error("No valid issue dates found in the ledger")]
    NoValidDates,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;
