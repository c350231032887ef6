//! Conversion Example
//!
//! Writes a synthetic sweep table, converts it to a session container,
//! appends to a tracking log and reads both back.
//!
//! Run with: RUST_LOG=clampstore=debug cargo run --example convert_session
//! or pass a job file: cargo run --example convert_session -- job.json

use std::f64::consts::PI;

use clampstore::recording::SweepSet;
use clampstore::storage::{write_sweep_table, ParquetSessionStore};
use clampstore::tracking::CsvTrackingLog;
use clampstore::{ConversionJob, ConversionMetadata, Converter};
use tracing_subscriber::EnvFilter;

/// Ten 0.5 s sweeps at 20 kHz: a sine command and a leaky response
#[allow(clippy::cast_precision_loss)]
fn synthetic_recording() -> clampstore::Result<SweepSet> {
    let rate = 20_000.0;
    let samples = 10_000;
    let command = (0..10)
        .map(|sweep| {
            (0..samples)
                .map(|i| 50.0 * (sweep as f64 + 1.0) * (2.0 * PI * 5.0 * i as f64 / rate).sin())
                .collect()
        })
        .collect::<Vec<Vec<f64>>>();
    let response = command
        .iter()
        .map(|trace| trace.iter().map(|pa| -70.0 + 0.05 * pa).collect())
        .collect();
    SweepSet::from_rows(rate, command, response)
}

fn demo_job() -> anyhow::Result<ConversionJob> {
    let dir = std::env::temp_dir().join("clampstore_demo");
    std::fs::create_dir_all(dir.join("sessions"))?;

    let recording_path = dir.join("18o22025_sweeps.parquet");
    write_sweep_table(&recording_path, &synthetic_recording()?)?;

    let metadata = ConversionMetadata::builder("18o22025")
        .recording_date("Oct 22, 2018")
        .cell_number("3")
        .cell_type("Hu L2/3")
        .species("Human")
        .experimental_condition("Tumor")
        .gain(40.0)
        .dc_offset("125")
        .rmp_offset("-20")
        .build()?;

    Ok(ConversionJob::new(
        recording_path,
        dir.join("sessions"),
        dir.join("ResponseVariabilityCells.csv"),
        metadata,
    ))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let job = match std::env::args().nth(1) {
        Some(path) => ConversionJob::from_json_file(path)?,
        None => demo_job()?,
    };

    let converter: Converter = Converter::default();
    converter.run(&job)?;

    let artifact = job.artifact_path(clampstore::storage::PARQUET_EXTENSION);
    let record = ParquetSessionStore::load(&artifact)?;
    let (sweeps, samples) = record.shape();
    println!("Session {} ({})", record.cell_id(), artifact.display());
    println!("   {sweeps} sweeps x {samples} samples @ {} Hz", record.sampling_rate());
    println!("   {}", record.metadata().experiment_description());

    let rows = CsvTrackingLog::read_rows(&job.log_path)?;
    println!("Tracking log {} has {} row(s)", job.log_path.display(), rows.len());

    Ok(())
}
