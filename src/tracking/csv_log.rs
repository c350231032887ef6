//! CSV tracking log (Arrow CSV writer/reader)

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float64Array, StringArray};
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use super::{TrackingLog, TrackingRow};
use crate::{Error, Result};

/// Column order of the tracking log.
pub const TRACKING_COLUMNS: [&str; 7] = [
    "cell_id",
    "recording_date",
    "exp_condition",
    "cell_type",
    "gain",
    "dc",
    "created_at",
];

fn tracking_schema() -> Schema {
    Schema::new(vec![
        Field::new(TRACKING_COLUMNS[0], DataType::Utf8, false),
        Field::new(TRACKING_COLUMNS[1], DataType::Utf8, true),
        Field::new(TRACKING_COLUMNS[2], DataType::Utf8, true),
        Field::new(TRACKING_COLUMNS[3], DataType::Utf8, true),
        Field::new(TRACKING_COLUMNS[4], DataType::Float64, false),
        Field::new(TRACKING_COLUMNS[5], DataType::Utf8, true),
        Field::new(TRACKING_COLUMNS[6], DataType::Utf8, false),
    ])
}

/// Tracking log stored as a CSV file with a single header line.
///
/// Each append opens the file, writes one row (plus the header if the file
/// is new or empty) and closes it again. Appending to a file whose header
/// doesn't match [`TRACKING_COLUMNS`] fails without writing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTrackingLog;

impl CsvTrackingLog {
    /// Read every row of the log at `log_path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or a row cannot be decoded
    pub fn read_rows<P: AsRef<Path>>(log_path: P) -> Result<Vec<TrackingRow>> {
        let file = File::open(log_path.as_ref())?;
        let reader = ReaderBuilder::new(Arc::new(tracking_schema()))
            .with_header(true)
            .build(file)?;

        let mut rows = Vec::new();
        for batch in reader {
            let batch = batch?;
            rows.extend(decode_rows(&batch)?);
        }
        Ok(rows)
    }

    fn encode_row(row: &TrackingRow) -> Result<RecordBatch> {
        let created_at = row.created_at().to_rfc3339_opts(SecondsFormat::Secs, true);
        let batch = RecordBatch::try_new(
            Arc::new(tracking_schema()),
            vec![
                Arc::new(StringArray::from(vec![row.cell_id()])),
                Arc::new(StringArray::from(vec![row.recording_date()])),
                Arc::new(StringArray::from(vec![row.exp_condition()])),
                Arc::new(StringArray::from(vec![row.cell_type()])),
                Arc::new(Float64Array::from(vec![row.gain()])),
                Arc::new(StringArray::from(vec![row.dc()])),
                Arc::new(StringArray::from(vec![created_at.as_str()])),
            ],
        )?;
        Ok(batch)
    }

    fn check_header(log_path: &Path) -> Result<()> {
        let mut first_line = String::new();
        BufReader::new(File::open(log_path)?).read_line(&mut first_line)?;
        let expected = TRACKING_COLUMNS.join(",");
        if first_line.trim_end() != expected {
            return Err(Error::StorageError(format!(
                "Tracking log header {:?} does not match expected {expected:?}",
                first_line.trim_end()
            )));
        }
        Ok(())
    }
}

impl TrackingLog for CsvTrackingLog {
    fn append_row(&self, row: &TrackingRow, log_path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;
        let write_header = file.metadata()?.len() == 0;
        if !write_header {
            Self::check_header(log_path)?;
        }

        let batch = Self::encode_row(row)?;
        let mut buffer = Vec::new();
        {
            let mut writer = WriterBuilder::new()
                .with_header(write_header)
                .build(&mut buffer);
            writer.write(&batch)?;
        }
        file.write_all(&buffer)?;
        file.flush()?;

        info!(
            path = %log_path.display(),
            cell_id = row.cell_id(),
            "appended tracking row"
        );
        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, index: usize) -> Result<&'a StringArray> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            Error::StorageError(format!(
                "Tracking column {:?} is not a string column",
                TRACKING_COLUMNS[index]
            ))
        })
}

fn text(column: &StringArray, row: usize) -> String {
    if column.is_null(row) {
        String::new()
    } else {
        column.value(row).to_string()
    }
}

fn decode_rows(batch: &RecordBatch) -> Result<Vec<TrackingRow>> {
    let cell_id = string_column(batch, 0)?;
    let recording_date = string_column(batch, 1)?;
    let exp_condition = string_column(batch, 2)?;
    let cell_type = string_column(batch, 3)?;
    let gain = batch
        .column(4)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::StorageError("Tracking column \"gain\" is not Float64".to_string()))?;
    let dc = string_column(batch, 5)?;
    let created_at = string_column(batch, 6)?;

    (0..batch.num_rows())
        .map(|row| {
            let raw = text(created_at, row);
            let created_at = DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| {
                    Error::StorageError(format!("Invalid created_at {raw:?} in tracking log: {e}"))
                })?
                .with_timezone(&Utc);
            Ok(TrackingRow {
                cell_id: text(cell_id, row),
                recording_date: text(recording_date, row),
                exp_condition: text(exp_condition, row),
                cell_type: text(cell_type, row),
                gain: gain.value(row),
                dc: text(dc, row),
                created_at,
            })
        })
        .collect()
}
