//! Recording sources
//!
//! A [`Recording`] is the read-only view the session builder consumes: an
//! ordered list of sweeps, each with a command (stimulus current) trace and
//! a response (membrane voltage) trace, plus one sampling rate shared by
//! every sweep.
//!
//! File-backed recordings are obtained through a [`RecordingSource`]. The
//! source owns the file handle only for the duration of
//! [`RecordingSource::open`]; the returned recording holds fully
//! materialized sweep data.
//!
//! ```rust
//! use clampstore::recording::{Recording, Sweep, SweepSet};
//!
//! let recording = SweepSet::new(
//!     100_000.0,
//!     vec![
//!         Sweep::new(vec![1.0, 1.0], vec![-70.0, -70.0]),
//!         Sweep::new(vec![2.0, 2.0], vec![-69.0, -69.0]),
//!     ],
//! );
//!
//! assert_eq!(recording.sweep_count(), 2);
//! assert_eq!(recording.command_samples(1), &[2.0, 2.0]);
//! ```

mod sweep_set;

pub use sweep_set::{Sweep, SweepSet};

use crate::Result;
use std::path::Path;

/// Read-only access to the sweeps of one recording.
///
/// Sweep indices run from `0` to `sweep_count() - 1` in acquisition order.
/// Implementations may panic on an out-of-range index, like slice indexing.
pub trait Recording {
    /// Number of sweeps in the recording.
    fn sweep_count(&self) -> usize;

    /// Number of samples reported for the given sweep.
    fn sample_count(&self, sweep: usize) -> usize;

    /// Sampling rate in Hz, shared by all sweeps.
    fn sampling_rate(&self) -> f64;

    /// Command (stimulus current) samples of the given sweep.
    fn command_samples(&self, sweep: usize) -> &[f64];

    /// Response (membrane voltage) samples of the given sweep.
    fn response_samples(&self, sweep: usize) -> &[f64];
}

/// Opens a recording stored at a path.
///
/// Implementations must release every file resource before `open` returns,
/// whether it succeeds or fails.
pub trait RecordingSource {
    /// Recording type produced by this source.
    type Recording: Recording;

    /// Open and materialize the recording at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or does not hold a recording
    fn open(&self, path: &Path) -> Result<Self::Recording>;
}
