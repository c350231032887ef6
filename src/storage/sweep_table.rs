//! Sweep table layout (Arrow schema + Parquet I/O)
//!
//! One row per sweep:
//!
//! | column     | type            |
//! |------------|-----------------|
//! | `sweep`    | `UInt32`        |
//! | `command`  | `List<Float64>` |
//! | `response` | `List<Float64>` |
//!
//! Everything else travels in the schema's key-value metadata.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float64Array, Float64Builder, ListArray, ListBuilder, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;

use crate::recording::{Sweep, SweepSet};
use crate::{Error, Result};

pub(crate) const SWEEP_COLUMN: &str = "sweep";
pub(crate) const COMMAND_COLUMN: &str = "command";
pub(crate) const RESPONSE_COLUMN: &str = "response";

fn trace_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
        false,
    )
}

/// Arrow schema of a sweep table carrying the given key-value metadata.
pub(crate) fn schema(metadata: HashMap<String, String>) -> Schema {
    Schema::new_with_metadata(
        vec![
            Field::new(SWEEP_COLUMN, DataType::UInt32, false),
            trace_field(COMMAND_COLUMN),
            trace_field(RESPONSE_COLUMN),
        ],
        metadata,
    )
}

fn list_array<I, R>(rows: I) -> ListArray
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = f64>,
{
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.values().extend(row.into_iter().map(Some));
        builder.append(true);
    }
    builder.finish()
}

/// Encode per-sweep rows into a single record batch.
pub(crate) fn encode<C, R, CI, RI>(
    sweep_count: usize,
    command: C,
    response: R,
    metadata: HashMap<String, String>,
) -> Result<RecordBatch>
where
    C: IntoIterator<Item = CI>,
    CI: IntoIterator<Item = f64>,
    R: IntoIterator<Item = RI>,
    RI: IntoIterator<Item = f64>,
{
    let sweep_ids = (0..sweep_count)
        .map(|sweep| {
            u32::try_from(sweep).map_err(|_| {
                Error::StorageError(format!("Sweep index {sweep} does not fit in UInt32"))
            })
        })
        .collect::<Result<Vec<u32>>>()?;

    let batch = RecordBatch::try_new(
        Arc::new(schema(metadata)),
        vec![
            Arc::new(UInt32Array::from(sweep_ids)),
            Arc::new(list_array(command)),
            Arc::new(list_array(response)),
        ],
    )?;
    Ok(batch)
}

/// Encode an in-memory recording; `sampling_rate` is the only metadata key.
pub(crate) fn encode_sweep_set(
    sweeps: &SweepSet,
    metadata: HashMap<String, String>,
) -> Result<RecordBatch> {
    encode(
        sweeps.sweeps().len(),
        sweeps.sweeps().iter().map(|s| s.command().iter().copied()),
        sweeps.sweeps().iter().map(|s| s.response().iter().copied()),
        metadata,
    )
}

/// Write a batch to `path`, mirroring its schema metadata into the Parquet
/// footer's key-value metadata.
pub(crate) fn write(path: &Path, batch: &RecordBatch, max_row_group_size: usize) -> Result<()> {
    if max_row_group_size == 0 {
        return Err(Error::StorageError(
            "Row group size must be at least one sweep".to_string(),
        ));
    }
    let key_values = batch
        .schema()
        .metadata()
        .iter()
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
        .collect::<Vec<_>>();
    let props = WriterProperties::builder()
        .set_max_row_group_size(max_row_group_size)
        .set_key_value_metadata(Some(key_values))
        .build();

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(|e| {
        Error::StorageError(format!("Failed to create Parquet writer: {e}"))
    })?;
    writer
        .write(batch)
        .map_err(|e| Error::StorageError(format!("Failed to write record batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::StorageError(format!("Failed to finalize Parquet file: {e}")))?;
    Ok(())
}

/// Contents of a sweep table file.
pub(crate) struct SweepTable {
    pub(crate) metadata: HashMap<String, String>,
    pub(crate) batches: Vec<RecordBatch>,
}

impl SweepTable {
    /// Read every batch of the file at `path`.
    ///
    /// The file handle lives inside this call only.
    pub(crate) fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;
        let metadata = builder.schema().metadata().clone();

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            batches.push(batch);
        }

        Ok(Self { metadata, batches })
    }

    /// Required metadata value.
    pub(crate) fn metadata_value(&self, key: &str) -> Result<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::StorageError(format!("Missing metadata key {key:?}")))
    }

    /// Decode the rows into sweeps ordered by the `sweep` column.
    ///
    /// Indices must form exactly `0..n`; duplicates and gaps are rejected.
    pub(crate) fn into_sweep_set(self, sampling_rate: f64) -> Result<SweepSet> {
        let mut indexed: Vec<(u32, Sweep)> = Vec::new();
        for batch in &self.batches {
            let sweep_ids = column::<UInt32Array>(batch, SWEEP_COLUMN)?;
            let command = column::<ListArray>(batch, COMMAND_COLUMN)?;
            let response = column::<ListArray>(batch, RESPONSE_COLUMN)?;

            for row in 0..batch.num_rows() {
                if sweep_ids.is_null(row) {
                    return Err(Error::StorageError(format!("Null sweep index at row {row}")));
                }
                indexed.push((
                    sweep_ids.value(row),
                    Sweep::new(trace(command, row)?, trace(response, row)?),
                ));
            }
        }

        indexed.sort_by_key(|(sweep, _)| *sweep);
        for (position, (sweep, _)) in indexed.iter().enumerate() {
            if usize::try_from(*sweep).ok() != Some(position) {
                return Err(Error::StorageError(format!(
                    "Sweep indices must run 0..{} without gaps or duplicates, found {sweep} at position {position}",
                    indexed.len()
                )));
            }
        }

        Ok(SweepSet::new(
            sampling_rate,
            indexed.into_iter().map(|(_, sweep)| sweep).collect(),
        ))
    }
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::StorageError(format!("Missing column {name:?}")))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::StorageError(format!("Column {name:?} has an unexpected type")))
}

fn trace(list: &ListArray, row: usize) -> Result<Vec<f64>> {
    if list.is_null(row) {
        return Err(Error::StorageError(format!("Null trace at row {row}")));
    }
    let values = list.value(row);
    let values = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::StorageError("Trace values must be Float64".to_string()))?;
    if values.null_count() > 0 {
        return Err(Error::StorageError(format!("Null samples in trace at row {row}")));
    }
    Ok(values.values().to_vec())
}
