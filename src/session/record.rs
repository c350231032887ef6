//! Session Record - one recording's sweep matrices plus metadata

use ndarray::{Array2, ArrayView1};

use super::{ConversionMetadata, SessionMetadata};

/// Unit of the command (stimulus current) trace.
pub const COMMAND_UNIT: &str = "pA";

/// Unit of the response (membrane voltage) trace.
pub const RESPONSE_UNIT: &str = "mV";

/// Start of every sweep relative to its trigger, in seconds.
pub const STARTING_TIME_SECS: f64 = 0.0;

/// Session Record holds one fully converted recording.
///
/// Row `i` of both matrices is sweep `i` in acquisition order; column `j` is
/// sample `j`. Both matrices always have the same shape. Records are only
/// produced by [`SessionRecordBuilder`](super::SessionRecordBuilder) and
/// cannot be mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub(super) metadata: ConversionMetadata,
    pub(super) command: Array2<f64>,
    pub(super) response: Array2<f64>,
    pub(super) sampling_rate: f64,
}

impl SessionRecord {
    /// Get the cell identifier.
    #[must_use]
    pub fn cell_id(&self) -> &str {
        self.metadata.cell_id()
    }

    /// Command trace matrix, `(sweep_count, sample_count)`.
    #[must_use]
    pub const fn command_matrix(&self) -> &Array2<f64> {
        &self.command
    }

    /// Response trace matrix, `(sweep_count, sample_count)`.
    #[must_use]
    pub const fn response_matrix(&self) -> &Array2<f64> {
        &self.response
    }

    /// Command trace of one sweep.
    ///
    /// # Panics
    ///
    /// Panics if `sweep >= sweep_count()`
    #[must_use]
    pub fn command_row(&self, sweep: usize) -> ArrayView1<'_, f64> {
        self.command.row(sweep)
    }

    /// Response trace of one sweep.
    ///
    /// # Panics
    ///
    /// Panics if `sweep >= sweep_count()`
    #[must_use]
    pub fn response_row(&self, sweep: usize) -> ArrayView1<'_, f64> {
        self.response.row(sweep)
    }

    /// Sampling rate in Hz.
    #[must_use]
    pub const fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Number of sweeps (matrix rows).
    #[must_use]
    pub fn sweep_count(&self) -> usize {
        self.command.nrows()
    }

    /// Samples per sweep (matrix columns).
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.command.ncols()
    }

    /// `(sweep_count, sample_count)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.command.dim()
    }

    /// Length of one sweep in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sweep_duration_secs(&self) -> f64 {
        self.sample_count() as f64 / self.sampling_rate
    }

    /// Get the recording gain.
    #[must_use]
    pub const fn gain(&self) -> f64 {
        self.metadata.gain()
    }

    /// Get the DC level label.
    #[must_use]
    pub fn dc_offset(&self) -> &str {
        self.metadata.dc_offset()
    }

    /// Get the RMP offset, if given.
    #[must_use]
    pub fn rmp_offset(&self) -> Option<&str> {
        self.metadata.rmp_offset()
    }

    /// Get the descriptive session bundle.
    #[must_use]
    pub const fn session_metadata(&self) -> &SessionMetadata {
        self.metadata.session()
    }

    /// Get the full metadata the record was built from.
    #[must_use]
    pub const fn metadata(&self) -> &ConversionMetadata {
        &self.metadata
    }
}
