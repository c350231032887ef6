//! Error types for clampstore
//!
//! Builder errors are detectable before any I/O; sink failures carry the
//! path they were writing and the underlying cause.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// clampstore error types
#[derive(Error, Debug)]
pub enum Error {
    /// Cell identifier is empty or blank
    #[error("Missing cell identifier: cell_id must be a non-empty string")]
    MissingIdentifier,

    /// Recording has no sweeps
    #[error("Empty recording: at least one sweep is required")]
    EmptyRecording,

    /// A sweep's sample count differs from the first sweep's
    #[error(
        "Irregular sweep shape: sweep {sweep} has {actual} samples, expected {expected}\n\
         Recordings must be rectangular; sweeps are never truncated or padded"
    )]
    IrregularSweepShape {
        /// Index of the offending sweep
        sweep: usize,
        /// Sample count of sweep 0
        expected: usize,
        /// Sample count found in the offending sweep
        actual: usize,
    },

    /// Command and response traces disagree on the number of sweeps
    #[error(
        "Sweep count mismatch: {command} command traces but {response} response traces\n\
         Every sweep needs both a command and a response trace"
    )]
    SweepCountMismatch {
        /// Number of command traces
        command: usize,
        /// Number of response traces
        response: usize,
    },

    /// Metadata failed validation
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The recording source could not be opened or decoded
    #[error("Recording unavailable at {}: {source}", .path.display())]
    RecordingUnavailable {
        /// Path handed to the recording source
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// The persistence sink failed to write the session
    #[error("Persistence failed for {}: {source}", .path.display())]
    PersistenceFailure {
        /// Destination artifact path
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// The tracking log sink failed to append a row
    #[error("Tracking log append failed for {}: {source}", .path.display())]
    LogAppendFailure {
        /// Tracking log path
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// Storage error (Parquet/Arrow/CSV layout)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
