//! Conversion jobs - the single entry point
//!
//! A [`ConversionJob`] names one recording, where its session container
//! goes, the tracking log, and the metadata. A [`Converter`] runs it:
//!
//! ```text
//! open recording ──> build SessionRecord ──> persist ──> append tracking row
//! ```
//!
//! Every step propagates its error immediately. Nothing is retried, and a
//! persisted artifact is left in place if the tracking append fails.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::recording::RecordingSource;
use crate::session::{ConversionMetadata, SessionRecordBuilder};
use crate::storage::{ParquetSessionStore, ParquetSweepSource, PersistenceSink};
use crate::tracking::{CsvTrackingLog, TrackingLog, TrackingRow};
use crate::{Error, Result};

/// One conversion request.
///
/// Deserializable from JSON:
///
/// ```json
/// {
///   "recording_path": "/data/18o22025.parquet",
///   "output_dir": "/data/sessions",
///   "log_path": "/data/ResponseVariabilityCells.csv",
///   "metadata": {
///     "cell_id": "18o22025",
///     "gain": 40.0,
///     "dc_offset": "125",
///     "rmp_offset": "-20",
///     "session": {
///       "recording_date": "Oct 22, 2018",
///       "species": "Human",
///       "experimental_condition": "Tumor",
///       "cell_type": "Hu L2/3",
///       "cell_number": "3"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Recording to convert.
    pub recording_path: PathBuf,
    /// Directory receiving `<cell_id>.<ext>`.
    pub output_dir: PathBuf,
    /// Tracking log to append to.
    pub log_path: PathBuf,
    /// Caller-supplied metadata.
    pub metadata: ConversionMetadata,
}

impl ConversionJob {
    /// Create a job.
    #[must_use]
    pub fn new(
        recording_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
        metadata: ConversionMetadata,
    ) -> Self {
        Self {
            recording_path: recording_path.into(),
            output_dir: output_dir.into(),
            log_path: log_path.into(),
            metadata,
        }
    }

    /// Parse and validate a job from JSON text.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the metadata is invalid
    pub fn from_json_str(json: &str) -> Result<Self> {
        let job: Self = serde_json::from_str(json)?;
        job.metadata.validate()?;
        Ok(job)
    }

    /// Read, parse and validate a job from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or does not hold a valid job
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Artifact path: `<output_dir>/<cell_id>.<extension>`.
    #[must_use]
    pub fn artifact_path(&self, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{extension}", self.metadata.cell_id()))
    }
}

/// Runs conversion jobs against a recording source, a persistence sink and
/// a tracking log.
///
/// The default collaborators read Parquet sweep tables, write Parquet
/// session containers and append to a CSV log:
///
/// ```rust
/// use clampstore::Converter;
///
/// let converter: Converter = Converter::default();
/// # let _ = converter;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter<S = ParquetSweepSource, P = ParquetSessionStore, L = CsvTrackingLog> {
    source: S,
    sink: P,
    log: L,
}

impl<S, P, L> Converter<S, P, L>
where
    S: RecordingSource,
    P: PersistenceSink,
    L: TrackingLog,
{
    /// Create a converter from its three collaborators.
    pub const fn new(source: S, sink: P, log: L) -> Self {
        Self { source, sink, log }
    }

    /// Convert one recording.
    ///
    /// # Errors
    ///
    /// - `MissingIdentifier` / `InvalidMetadata` before any I/O
    /// - `RecordingUnavailable` if the source cannot open the recording
    /// - `EmptyRecording` / `IrregularSweepShape` from the builder
    /// - `PersistenceFailure` if the sink fails (no tracking row is appended)
    /// - `LogAppendFailure` if the tracking append fails (the artifact stays)
    pub fn run(&self, job: &ConversionJob) -> Result<()> {
        let span = info_span!("convert", cell_id = job.metadata.cell_id());
        let _guard = span.enter();

        job.metadata.validate()?;

        let recording = self
            .source
            .open(&job.recording_path)
            .map_err(|e| Error::RecordingUnavailable {
                path: job.recording_path.clone(),
                source: Box::new(e),
            })?;
        let record = SessionRecordBuilder::build(&recording, &job.metadata)?;
        drop(recording);
        let (sweeps, samples) = record.shape();
        debug!(sweeps, samples, "built session record");

        let artifact = job.artifact_path(self.sink.file_extension());
        self.sink
            .persist(&record, &artifact)
            .map_err(|e| Error::PersistenceFailure {
                path: artifact.clone(),
                source: Box::new(e),
            })?;

        let row = TrackingRow::from_record(&record);
        self.log
            .append_row(&row, &job.log_path)
            .map_err(|e| Error::LogAppendFailure {
                path: job.log_path.clone(),
                source: Box::new(e),
            })?;

        info!(artifact = %artifact.display(), "conversion complete");
        Ok(())
    }
}
