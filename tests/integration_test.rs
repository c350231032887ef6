//! End-to-end conversion tests
//!
//! Tests the complete pipeline:
//! 1. Write a sweep table (recording source)
//! 2. Run a conversion job
//! 3. Load the session container back
//! 4. Read the tracking log

use std::fs;
use std::path::{Path, PathBuf};

use clampstore::recording::SweepSet;
use clampstore::session::{ConversionMetadata, SessionRecordBuilder};
use clampstore::storage::{
    write_sweep_table, ParquetSessionStore, ParquetSweepSource, PersistenceSink,
};
use clampstore::tracking::{CsvTrackingLog, TrackingLog, TrackingRow};
use clampstore::{ConversionJob, Converter, Error, Result};

/// Fresh scratch directory for one test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("clampstore_it_{}_{name}", std::process::id()));
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

fn recording() -> SweepSet {
    SweepSet::from_rows(
        100_000.0,
        vec![vec![1.0; 5], vec![2.0; 5], vec![3.0; 5]],
        vec![vec![-70.0; 5], vec![-69.0; 5], vec![-68.0; 5]],
    )
    .unwrap()
}

fn metadata(cell_id: &str) -> ConversionMetadata {
    ConversionMetadata::builder(cell_id)
        .recording_date("Oct 22, 2018")
        .cell_number("3")
        .cell_type("Hu L2/3")
        .species("Human")
        .experimental_condition("Tumor")
        .gain(40.0)
        .dc_offset("125")
        .rmp_offset("-20")
        .build()
        .unwrap()
}

fn job_in(dir: &Path, cell_id: &str) -> ConversionJob {
    ConversionJob::new(
        dir.join(format!("{cell_id}_sweeps.parquet")),
        dir.join("sessions"),
        dir.join("cells.csv"),
        metadata(cell_id),
    )
}

#[test]
fn test_convert_writes_container_and_tracking_row() {
    let dir = scratch_dir("convert");
    let job = job_in(&dir, "18o22025");
    fs::create_dir_all(&job.output_dir).unwrap();
    write_sweep_table(&job.recording_path, &recording()).unwrap();

    let converter: Converter = Converter::default();
    converter.run(&job).expect("conversion failed");

    let artifact = job.output_dir.join("18o22025.parquet");
    assert!(artifact.exists(), "session container not written");

    let record = ParquetSessionStore::load(&artifact).unwrap();
    assert_eq!(record.shape(), (3, 5));
    assert_eq!(record.command_row(2).to_vec(), vec![3.0; 5]);
    assert_eq!(record.response_row(0).to_vec(), vec![-70.0; 5]);
    assert!((record.sampling_rate() - 100_000.0).abs() < f64::EPSILON);
    assert_eq!(record.metadata(), &metadata("18o22025"));

    let rows = CsvTrackingLog::read_rows(&job.log_path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cell_id(), "18o22025");
    assert_eq!(rows[0].recording_date(), "Oct 22, 2018");
    assert_eq!(rows[0].dc(), "125");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_sequential_conversions_share_one_log() {
    let dir = scratch_dir("sequential");
    let converter: Converter = Converter::default();

    for cell_id in ["18329010", "18329011", "18329015"] {
        let job = job_in(&dir, cell_id);
        fs::create_dir_all(&job.output_dir).unwrap();
        write_sweep_table(&job.recording_path, &recording()).unwrap();
        converter.run(&job).unwrap();
    }

    let rows = CsvTrackingLog::read_rows(dir.join("cells.csv")).unwrap();
    let ids: Vec<&str> = rows.iter().map(TrackingRow::cell_id).collect();
    assert_eq!(ids, vec!["18329010", "18329011", "18329015"]);

    let contents = fs::read_to_string(dir.join("cells.csv")).unwrap();
    assert_eq!(contents.matches("cell_id,").count(), 1, "header repeated");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_recording_is_unavailable() {
    let dir = scratch_dir("missing");
    let job = job_in(&dir, "X1");

    let converter: Converter = Converter::default();
    let err = converter.run(&job).unwrap_err();

    assert!(matches!(err, Error::RecordingUnavailable { .. }));
    assert!(!job.log_path.exists(), "tracking log written for failed job");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_irregular_recording_writes_nothing() {
    let dir = scratch_dir("irregular");
    let job = job_in(&dir, "X1");
    fs::create_dir_all(&job.output_dir).unwrap();
    let irregular = SweepSet::from_rows(
        100_000.0,
        vec![vec![0.0; 5], vec![0.0; 6]],
        vec![vec![0.0; 5], vec![0.0; 6]],
    )
    .unwrap();
    write_sweep_table(&job.recording_path, &irregular).unwrap();

    let converter: Converter = Converter::default();
    let err = converter.run(&job).unwrap_err();

    assert!(matches!(err, Error::IrregularSweepShape { sweep: 1, .. }));
    assert!(!job.artifact_path("parquet").exists());
    assert!(!job.log_path.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_output_dir_is_persistence_failure() {
    let dir = scratch_dir("no_output_dir");
    let job = job_in(&dir, "X1");
    write_sweep_table(&job.recording_path, &recording()).unwrap();

    let converter: Converter = Converter::default();
    let err = converter.run(&job).unwrap_err();

    assert!(matches!(err, Error::PersistenceFailure { .. }));
    assert!(!job.log_path.exists(), "tracking row appended after failed persist");

    fs::remove_dir_all(&dir).ok();
}

/// Tracking log that always fails
struct BrokenLog;

impl TrackingLog for BrokenLog {
    fn append_row(&self, _row: &TrackingRow, _log_path: &Path) -> Result<()> {
        Err(Error::StorageError("log volume offline".to_string()))
    }
}

#[test]
fn test_log_failure_leaves_artifact() {
    let dir = scratch_dir("broken_log");
    let job = job_in(&dir, "X1");
    fs::create_dir_all(&job.output_dir).unwrap();
    write_sweep_table(&job.recording_path, &recording()).unwrap();

    let converter = Converter::new(ParquetSweepSource, ParquetSessionStore::new(), BrokenLog);
    let err = converter.run(&job).unwrap_err();

    assert!(matches!(err, Error::LogAppendFailure { .. }));
    assert!(format!("{err}").contains("log volume offline"));
    assert!(job.artifact_path("parquet").exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_session_store_round_trip_with_small_row_groups() {
    let dir = scratch_dir("row_groups");
    let path = dir.join("X1.parquet");
    let sweeps = SweepSet::from_rows(
        20_000.0,
        (0..10).map(|i| vec![f64::from(i); 7]).collect(),
        (0..10).map(|i| vec![-70.0 + f64::from(i); 7]).collect(),
    )
    .unwrap();
    let record = SessionRecordBuilder::build(&sweeps, &metadata("X1")).unwrap();

    ParquetSessionStore::new()
        .with_row_group_size(3)
        .persist(&record, &path)
        .unwrap();
    let loaded = ParquetSessionStore::load(&path).unwrap();

    assert_eq!(loaded, record);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_job_from_json_file() {
    let dir = scratch_dir("json_job");
    let job_path = dir.join("job.json");
    let json = serde_json::json!({
        "recording_path": dir.join("in.parquet"),
        "output_dir": dir.join("sessions"),
        "log_path": dir.join("cells.csv"),
        "metadata": {
            "cell_id": "18220020",
            "gain": 20.0,
            "dc_offset": "100",
            "rmp_offset": "-17.5",
            "session": {
                "recording_date": "Feb 20, 2018",
                "species": "Human",
                "experimental_condition": "Epilepsy",
                "cell_type": "Hu L2/3",
                "cell_number": "4"
            }
        }
    });
    fs::write(&job_path, json.to_string()).unwrap();

    let job = ConversionJob::from_json_file(&job_path).unwrap();
    assert_eq!(job.metadata.cell_id(), "18220020");
    assert_eq!(job.metadata.session_description(), "Cell #4");
    assert_eq!(job.metadata.notes().as_deref(), Some("RMP Offset: -17.5"));
    assert_eq!(job.artifact_path("parquet"), dir.join("sessions").join("18220020.parquet"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_tracking_row_appended_directly() {
    let dir = scratch_dir("direct_log");
    let log = dir.join("cells.csv");
    let record = SessionRecordBuilder::build(&recording(), &metadata("X1")).unwrap();

    CsvTrackingLog
        .append_row(&TrackingRow::from_record(&record), &log)
        .unwrap();

    let rows = CsvTrackingLog::read_rows(&log).unwrap();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].gain() - 40.0).abs() < f64::EPSILON);

    fs::remove_dir_all(&dir).ok();
}
