//! Session storage (Arrow/Parquet)
//!
//! Session containers and recording sources share one columnar layout: a
//! Parquet file with one row per sweep (`sweep`, `command`, `response`).
//! A session container additionally carries its metadata in the file's
//! key-value metadata:
//!
//! | key                          | value                                 |
//! |------------------------------|---------------------------------------|
//! | `clampstore.format_version`  | `1`                                   |
//! | `clampstore.sampling_rate`   | Hz, Rust float formatting             |
//! | `clampstore.command_unit`    | `pA`                                  |
//! | `clampstore.response_unit`   | `mV`                                  |
//! | `clampstore.starting_time`   | seconds                               |
//! | `clampstore.metadata`        | JSON of [`ConversionMetadata`]        |
//! | `clampstore.device`          | acquisition device                    |
//! | `clampstore.electrode`       | recording electrode                   |
//! | `clampstore.session_description`, `.experiment_description`, `.stimulus_description`, `.notes` | derived text |
//! | `clampstore.experimenter`, `.lab`, `.institution` | only when given    |
//!
//! A bare sweep table (input to [`ParquetSweepSource`]) only needs
//! `clampstore.sampling_rate`.

mod sweep_table;

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::recording::{Recording, RecordingSource, SweepSet};
use crate::session::{
    ConversionMetadata, SessionRecord, SessionRecordBuilder, COMMAND_UNIT, RESPONSE_UNIT,
    STARTING_TIME_SECS,
};
use crate::{Error, Result};
use sweep_table::SweepTable;

/// Container format version written by this crate.
pub const FORMAT_VERSION: &str = "1";

/// File extension of session containers and sweep tables.
pub const PARQUET_EXTENSION: &str = "parquet";

/// Default Parquet row group size (sweeps per group).
pub const DEFAULT_ROW_GROUP_SIZE: usize = 1024;

const KEY_FORMAT_VERSION: &str = "clampstore.format_version";
const KEY_SAMPLING_RATE: &str = "clampstore.sampling_rate";
const KEY_COMMAND_UNIT: &str = "clampstore.command_unit";
const KEY_RESPONSE_UNIT: &str = "clampstore.response_unit";
const KEY_STARTING_TIME: &str = "clampstore.starting_time";
const KEY_METADATA: &str = "clampstore.metadata";
const KEY_SESSION_DESCRIPTION: &str = "clampstore.session_description";
const KEY_EXPERIMENT_DESCRIPTION: &str = "clampstore.experiment_description";
const KEY_STIMULUS_DESCRIPTION: &str = "clampstore.stimulus_description";
const KEY_NOTES: &str = "clampstore.notes";
const KEY_DEVICE: &str = "clampstore.device";
const KEY_ELECTRODE: &str = "clampstore.electrode";
const KEY_EXPERIMENTER: &str = "clampstore.experimenter";
const KEY_LAB: &str = "clampstore.lab";
const KEY_INSTITUTION: &str = "clampstore.institution";

/// Destination for finished session records.
pub trait PersistenceSink {
    /// File extension (without the dot) of artifacts this sink writes.
    fn file_extension(&self) -> &str;

    /// Write `record` to `destination`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns error if the artifact cannot be encoded or written
    fn persist(&self, record: &SessionRecord, destination: &Path) -> Result<()>;
}

/// Parquet session container store.
#[derive(Debug, Clone, Copy)]
pub struct ParquetSessionStore {
    max_row_group_size: usize,
}

impl Default for ParquetSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParquetSessionStore {
    /// Create a store with the default row group size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    /// Set the maximum number of sweeps per Parquet row group.
    ///
    /// A size of zero is rejected by [`PersistenceSink::persist`].
    #[must_use]
    pub const fn with_row_group_size(mut self, sweeps: usize) -> Self {
        self.max_row_group_size = sweeps;
        self
    }

    /// Load a session container written by [`PersistenceSink::persist`].
    ///
    /// The sweeps and metadata are re-validated through
    /// [`SessionRecordBuilder`], so a loaded record satisfies the same
    /// invariants as a freshly built one.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, was written by an
    /// unsupported format version, or its contents fail validation
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SessionRecord> {
        let path = path.as_ref();
        let table = SweepTable::read(path)?;

        let version = table.metadata_value(KEY_FORMAT_VERSION)?;
        if version != FORMAT_VERSION {
            return Err(Error::StorageError(format!(
                "Unsupported session format version {version:?} (expected {FORMAT_VERSION})"
            )));
        }
        let metadata: ConversionMetadata =
            serde_json::from_str(table.metadata_value(KEY_METADATA)?)?;
        let sampling_rate = parse_sampling_rate(&table)?;

        let sweeps = table.into_sweep_set(sampling_rate)?;
        let record = SessionRecordBuilder::build(&sweeps, &metadata)?;
        debug!(path = %path.display(), cell_id = record.cell_id(), "loaded session");
        Ok(record)
    }

    fn container_metadata(record: &SessionRecord) -> Result<HashMap<String, String>> {
        let metadata = record.metadata();
        let session = metadata.session();
        let mut entries = HashMap::from([
            (KEY_FORMAT_VERSION.to_string(), FORMAT_VERSION.to_string()),
            (KEY_SAMPLING_RATE.to_string(), record.sampling_rate().to_string()),
            (KEY_COMMAND_UNIT.to_string(), COMMAND_UNIT.to_string()),
            (KEY_RESPONSE_UNIT.to_string(), RESPONSE_UNIT.to_string()),
            (KEY_STARTING_TIME.to_string(), STARTING_TIME_SECS.to_string()),
            (KEY_METADATA.to_string(), serde_json::to_string(metadata)?),
            (KEY_DEVICE.to_string(), session.device.clone()),
            (KEY_ELECTRODE.to_string(), session.electrode.clone()),
            (
                KEY_SESSION_DESCRIPTION.to_string(),
                metadata.session_description(),
            ),
            (
                KEY_EXPERIMENT_DESCRIPTION.to_string(),
                metadata.experiment_description(),
            ),
            (
                KEY_STIMULUS_DESCRIPTION.to_string(),
                metadata.stimulus_description(),
            ),
        ]);
        if let Some(notes) = metadata.notes() {
            entries.insert(KEY_NOTES.to_string(), notes);
        }
        for (key, value) in [
            (KEY_EXPERIMENTER, &session.experimenter),
            (KEY_LAB, &session.lab),
            (KEY_INSTITUTION, &session.institution),
        ] {
            if let Some(value) = value {
                entries.insert(key.to_string(), value.clone());
            }
        }
        Ok(entries)
    }
}

impl PersistenceSink for ParquetSessionStore {
    fn file_extension(&self) -> &str {
        PARQUET_EXTENSION
    }

    fn persist(&self, record: &SessionRecord, destination: &Path) -> Result<()> {
        let batch = sweep_table::encode(
            record.sweep_count(),
            record
                .command_matrix()
                .rows()
                .into_iter()
                .map(|row| row.into_iter().copied()),
            record
                .response_matrix()
                .rows()
                .into_iter()
                .map(|row| row.into_iter().copied()),
            Self::container_metadata(record)?,
        )?;
        sweep_table::write(destination, &batch, self.max_row_group_size)?;

        info!(
            path = %destination.display(),
            cell_id = record.cell_id(),
            sweeps = record.sweep_count(),
            samples = record.sample_count(),
            "persisted session"
        );
        Ok(())
    }
}

/// Opens Parquet sweep tables as recordings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetSweepSource;

impl RecordingSource for ParquetSweepSource {
    type Recording = SweepSet;

    fn open(&self, path: &Path) -> Result<SweepSet> {
        let table = SweepTable::read(path)?;
        let sampling_rate = parse_sampling_rate(&table)?;
        let sweeps = table.into_sweep_set(sampling_rate)?;
        debug!(
            path = %path.display(),
            sweeps = sweeps.sweeps().len(),
            sampling_rate,
            "opened sweep table"
        );
        Ok(sweeps)
    }
}

/// Write an in-memory recording as a sweep table readable by
/// [`ParquetSweepSource`].
///
/// # Errors
///
/// Returns error if the file cannot be written
pub fn write_sweep_table<P: AsRef<Path>>(path: P, sweeps: &SweepSet) -> Result<()> {
    let metadata = HashMap::from([(
        KEY_SAMPLING_RATE.to_string(),
        sweeps.sampling_rate().to_string(),
    )]);
    let batch = sweep_table::encode_sweep_set(sweeps, metadata)?;
    sweep_table::write(path.as_ref(), &batch, DEFAULT_ROW_GROUP_SIZE)
}

fn parse_sampling_rate(table: &SweepTable) -> Result<f64> {
    let raw = table.metadata_value(KEY_SAMPLING_RATE)?;
    raw.parse::<f64>()
        .map_err(|e| Error::StorageError(format!("Invalid sampling rate {raw:?}: {e}")))
}
