//! Session record assembly from a recording

use ndarray::{Array2, ArrayView1};
use tracing::debug;

use super::{ConversionMetadata, SessionRecord};
use crate::recording::Recording;
use crate::{Error, Result};

/// Turns a [`Recording`] plus [`ConversionMetadata`] into a [`SessionRecord`].
///
/// ## Algorithm
///
/// 1. Validate the metadata (`MissingIdentifier`)
/// 2. Reject recordings without sweeps (`EmptyRecording`)
/// 3. Check every sweep against sweep 0's width (`IrregularSweepShape`)
/// 4. Allocate both matrices and copy sweep `i` into row `i`
///
/// All checks run before allocation, so a failed build never produces a
/// partial record.
///
/// ## Example
///
/// ```rust
/// use clampstore::recording::SweepSet;
/// use clampstore::session::{ConversionMetadata, SessionRecordBuilder};
///
/// let recording = SweepSet::from_rows(
///     100_000.0,
///     vec![vec![1.0; 5], vec![2.0; 5], vec![3.0; 5]],
///     vec![vec![-70.0; 5], vec![-69.0; 5], vec![-68.0; 5]],
/// )?;
/// let metadata = ConversionMetadata::builder("X1").build()?;
///
/// let record = SessionRecordBuilder::build(&recording, &metadata)?;
/// assert_eq!(record.shape(), (3, 5));
/// assert_eq!(record.command_row(2)[0], 3.0);
/// # Ok::<(), clampstore::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionRecordBuilder;

impl SessionRecordBuilder {
    /// Build a session record.
    ///
    /// # Errors
    ///
    /// - `MissingIdentifier` / `InvalidMetadata` if the metadata is invalid
    /// - `EmptyRecording` if the recording has no sweeps
    /// - `IrregularSweepShape` if any sweep's width differs from sweep 0's
    pub fn build<R: Recording + ?Sized>(
        recording: &R,
        metadata: &ConversionMetadata,
    ) -> Result<SessionRecord> {
        metadata.validate()?;

        let sweep_count = recording.sweep_count();
        if sweep_count == 0 {
            return Err(Error::EmptyRecording);
        }

        let sample_count = Self::uniform_sample_count(recording)?;
        debug!(
            cell_id = metadata.cell_id(),
            sweep_count, sample_count, "sweeps are rectangular"
        );

        let mut command = Array2::<f64>::zeros((sweep_count, sample_count));
        let mut response = Array2::<f64>::zeros((sweep_count, sample_count));
        for sweep in 0..sweep_count {
            command
                .row_mut(sweep)
                .assign(&ArrayView1::from(recording.command_samples(sweep)));
            response
                .row_mut(sweep)
                .assign(&ArrayView1::from(recording.response_samples(sweep)));
        }

        Ok(SessionRecord {
            metadata: metadata.clone(),
            command,
            response,
            sampling_rate: recording.sampling_rate(),
        })
    }

    /// Width of sweep 0, after checking every sweep (reported count, command
    /// length, response length) against it.
    fn uniform_sample_count<R: Recording + ?Sized>(recording: &R) -> Result<usize> {
        let expected = recording.sample_count(0);
        for sweep in 0..recording.sweep_count() {
            let lengths = [
                recording.sample_count(sweep),
                recording.command_samples(sweep).len(),
                recording.response_samples(sweep).len(),
            ];
            if let Some(&actual) = lengths.iter().find(|&&len| len != expected) {
                return Err(Error::IrregularSweepShape {
                    sweep,
                    expected,
                    actual,
                });
            }
        }
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Sweep, SweepSet};

    fn metadata(cell_id: &str) -> ConversionMetadata {
        ConversionMetadata::builder(cell_id).build().unwrap()
    }

    #[test]
    fn test_build_copies_rows_in_order() {
        let recording = SweepSet::from_rows(
            10_000.0,
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![-1.0, -2.0], vec![-3.0, -4.0]],
        )
        .unwrap();

        let record = SessionRecordBuilder::build(&recording, &metadata("c1")).unwrap();

        assert_eq!(record.command_row(0).to_vec(), vec![1.0, 2.0]);
        assert_eq!(record.command_row(1).to_vec(), vec![3.0, 4.0]);
        assert_eq!(record.response_row(1).to_vec(), vec![-3.0, -4.0]);
    }

    #[test]
    fn test_response_length_mismatch_within_sweep() {
        let recording = SweepSet::new(
            10_000.0,
            vec![
                Sweep::new(vec![0.0; 4], vec![0.0; 4]),
                Sweep::new(vec![0.0; 4], vec![0.0; 3]),
            ],
        );

        let err = SessionRecordBuilder::build(&recording, &metadata("c1")).unwrap_err();
        assert!(matches!(
            err,
            Error::IrregularSweepShape {
                sweep: 1,
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_zero_width_sweeps_are_rectangular() {
        let recording = SweepSet::from_rows(1_000.0, vec![vec![], vec![]], vec![vec![], vec![]])
            .unwrap();
        let record = SessionRecordBuilder::build(&recording, &metadata("c1")).unwrap();
        assert_eq!(record.shape(), (2, 0));
    }
}
