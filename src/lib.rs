//! # clampstore: Patch-Clamp Sweeps to Columnar Session Containers
//!
//! clampstore converts current-clamp recordings, each an ordered list of
//! sweeps with a command (stimulus current) trace and a response (membrane
//! voltage) trace, into a session container holding two rectangular
//! matrices plus the acquisition metadata, and appends one row per
//! conversion to a tracking log.
//!
//! ## Design
//!
//! - **Rectangular or nothing**: sweeps of unequal length are rejected,
//!   never truncated or padded
//! - **Order preserving**: matrix row `i` is sweep `i` in acquisition order
//! - **Validated up front**: identifier and shape errors surface before any
//!   output is allocated or written
//! - **Collaborators behind traits**: [`recording::RecordingSource`],
//!   [`storage::PersistenceSink`] and [`tracking::TrackingLog`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use clampstore::{ConversionJob, Converter};
//!
//! let job = ConversionJob::from_json_file("jobs/18o22025.json")?;
//! let converter: Converter = Converter::default();
//! converter.run(&job)?;
//! # Ok::<(), clampstore::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod job;
pub mod recording;
pub mod session;
pub mod storage;
pub mod tracking;

pub use error::{Error, Result};
pub use job::{ConversionJob, Converter};
pub use session::{ConversionMetadata, SessionRecord, SessionRecordBuilder};
