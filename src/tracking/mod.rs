//! Tracking log - one row per completed conversion
//!
//! The log is append-only: rows are never rewritten or removed, and a row
//! is only appended after the session artifact was persisted.

mod csv_log;

pub use csv_log::{CsvTrackingLog, TRACKING_COLUMNS};

use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;
use crate::Result;

/// Tracking Row summarizes one converted session.
///
/// Mirrors a subset of the session metadata plus the conversion time.
/// Timestamps are kept at whole-second precision, which is what the log
/// stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRow {
    cell_id: String,
    recording_date: String,
    exp_condition: String,
    cell_type: String,
    gain: f64,
    dc: String,
    created_at: DateTime<Utc>,
}

impl TrackingRow {
    /// Summarize `record`, stamped with the current time.
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Self {
        let session = record.session_metadata();
        Self {
            cell_id: record.cell_id().to_string(),
            recording_date: session.recording_date.clone(),
            exp_condition: session.experimental_condition.clone(),
            cell_type: session.cell_type.clone(),
            gain: record.gain(),
            dc: record.dc_offset().to_string(),
            created_at: Utc::now().trunc_subsecs(0),
        }
    }

    /// Replace the creation timestamp (truncated to whole seconds).
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at.trunc_subsecs(0);
        self
    }

    /// Get the cell identifier.
    #[must_use]
    pub fn cell_id(&self) -> &str {
        &self.cell_id
    }

    /// Get the recording date.
    #[must_use]
    pub fn recording_date(&self) -> &str {
        &self.recording_date
    }

    /// Get the experimental condition.
    #[must_use]
    pub fn exp_condition(&self) -> &str {
        &self.exp_condition
    }

    /// Get the cell type.
    #[must_use]
    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }

    /// Get the recording gain.
    #[must_use]
    pub const fn gain(&self) -> f64 {
        self.gain
    }

    /// Get the DC level label.
    #[must_use]
    pub fn dc(&self) -> &str {
        &self.dc
    }

    /// Get the conversion timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append-only destination for tracking rows.
pub trait TrackingLog {
    /// Append one row to the log at `log_path`.
    ///
    /// # Errors
    ///
    /// Returns error if the log cannot be opened or written
    fn append_row(&self, row: &TrackingRow, log_path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::SweepSet;
    use crate::session::{ConversionMetadata, SessionRecordBuilder};
    use chrono::TimeZone;

    #[test]
    fn test_from_record_mirrors_metadata() {
        let metadata = ConversionMetadata::builder("18220020")
            .recording_date("Feb 20, 2018")
            .experimental_condition("Epilepsy")
            .cell_type("Hu L2/3")
            .gain(20.0)
            .dc_offset("100")
            .build()
            .unwrap();
        let set = SweepSet::from_rows(100_000.0, vec![vec![0.0]], vec![vec![0.0]]).unwrap();
        let record = SessionRecordBuilder::build(&set, &metadata).unwrap();

        let row = TrackingRow::from_record(&record);

        assert_eq!(row.cell_id(), "18220020");
        assert_eq!(row.recording_date(), "Feb 20, 2018");
        assert_eq!(row.exp_condition(), "Epilepsy");
        assert_eq!(row.cell_type(), "Hu L2/3");
        assert_eq!(row.dc(), "100");
        assert!((row.gain() - 20.0).abs() < f64::EPSILON);
        assert_eq!(row.created_at().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_with_created_at_truncates() {
        let metadata = ConversionMetadata::builder("c1").build().unwrap();
        let set = SweepSet::from_rows(1.0, vec![vec![0.0]], vec![vec![0.0]]).unwrap();
        let record = SessionRecordBuilder::build(&set, &metadata).unwrap();
        let ts = Utc.with_ymd_and_hms(2018, 10, 22, 14, 5, 9).unwrap()
            + chrono::Duration::milliseconds(750);

        let row = TrackingRow::from_record(&record).with_created_at(ts);

        assert_eq!(
            row.created_at(),
            Utc.with_ymd_and_hms(2018, 10, 22, 14, 5, 9).unwrap()
        );
    }
}
