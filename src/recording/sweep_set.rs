//! In-memory recording

use serde::{Deserialize, Serialize};

use super::Recording;
use crate::{Error, Result};

/// One stimulus-response acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    command: Vec<f64>,
    response: Vec<f64>,
}

impl Sweep {
    /// Create a sweep from its command and response traces.
    #[must_use]
    pub const fn new(command: Vec<f64>, response: Vec<f64>) -> Self {
        Self { command, response }
    }

    /// Command (stimulus current) trace.
    #[must_use]
    pub fn command(&self) -> &[f64] {
        &self.command
    }

    /// Response (membrane voltage) trace.
    #[must_use]
    pub fn response(&self) -> &[f64] {
        &self.response
    }

    /// Sample count of the command trace.
    ///
    /// The response trace is expected to match; the session builder checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.command.len()
    }

    /// True if the sweep holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }
}

/// Recording held entirely in memory.
///
/// No shape checks happen here: irregular sweeps are accepted so that the
/// session builder can report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSet {
    sampling_rate: f64,
    sweeps: Vec<Sweep>,
}

impl SweepSet {
    /// Create a recording from sweeps in acquisition order.
    #[must_use]
    pub const fn new(sampling_rate: f64, sweeps: Vec<Sweep>) -> Self {
        Self {
            sampling_rate,
            sweeps,
        }
    }

    /// Create a recording from parallel per-sweep command and response rows.
    ///
    /// # Errors
    ///
    /// `SweepCountMismatch` if the two sides hold a different number of rows
    pub fn from_rows(
        sampling_rate: f64,
        command: Vec<Vec<f64>>,
        response: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if command.len() != response.len() {
            return Err(Error::SweepCountMismatch {
                command: command.len(),
                response: response.len(),
            });
        }
        let sweeps = command
            .into_iter()
            .zip(response)
            .map(|(command, response)| Sweep::new(command, response))
            .collect();
        Ok(Self::new(sampling_rate, sweeps))
    }

    /// All sweeps in acquisition order.
    #[must_use]
    pub fn sweeps(&self) -> &[Sweep] {
        &self.sweeps
    }

    /// Append a sweep.
    pub fn push(&mut self, sweep: Sweep) {
        self.sweeps.push(sweep);
    }
}

impl Recording for SweepSet {
    fn sweep_count(&self) -> usize {
        self.sweeps.len()
    }

    fn sample_count(&self, sweep: usize) -> usize {
        self.sweeps[sweep].len()
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn command_samples(&self, sweep: usize) -> &[f64] {
        self.sweeps[sweep].command()
    }

    fn response_samples(&self, sweep: usize) -> &[f64] {
        self.sweeps[sweep].response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_set_accessors() {
        let mut set = SweepSet::new(20_000.0, vec![]);
        assert_eq!(set.sweep_count(), 0);

        set.push(Sweep::new(vec![0.0, 1.0, 2.0], vec![-70.0, -69.5, -69.0]));
        assert_eq!(set.sweep_count(), 1);
        assert_eq!(set.sample_count(0), 3);
        assert_eq!(set.response_samples(0), &[-70.0, -69.5, -69.0]);
        assert!((set.sampling_rate() - 20_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_rows_keeps_order() {
        let set = SweepSet::from_rows(
            1_000.0,
            vec![vec![1.0], vec![2.0], vec![3.0]],
            vec![vec![-1.0], vec![-2.0], vec![-3.0]],
        )
        .unwrap();
        assert_eq!(set.sweep_count(), 3);
        assert_eq!(set.command_samples(2), &[3.0]);
        assert_eq!(set.response_samples(1), &[-2.0]);
    }

    #[test]
    fn test_irregular_sweeps_accepted() {
        let set = SweepSet::from_rows(
            1_000.0,
            vec![vec![1.0; 5], vec![1.0; 6]],
            vec![vec![0.0; 5], vec![0.0; 6]],
        )
        .unwrap();
        assert_eq!(set.sample_count(0), 5);
        assert_eq!(set.sample_count(1), 6);
    }

    #[test]
    fn test_from_rows_rejects_unpaired_rows() {
        let result = SweepSet::from_rows(
            1_000.0,
            vec![vec![1.0; 5], vec![2.0; 5], vec![3.0; 5]],
            vec![vec![0.0; 5], vec![0.0; 5]],
        );
        assert!(matches!(
            result,
            Err(Error::SweepCountMismatch {
                command: 3,
                response: 2
            })
        ));
    }
}
