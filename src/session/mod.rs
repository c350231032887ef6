//! Session records (sweep matrices + metadata)
//!
//! ## Model
//!
//! ```text
//! Recording (N sweeps × M samples) ──build──> SessionRecord
//!                                               ├── command_matrix  (N × M)
//!                                               ├── response_matrix (N × M)
//!                                               ├── sampling_rate
//!                                               └── ConversionMetadata
//!                                                     └── SessionMetadata
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use clampstore::recording::SweepSet;
//! use clampstore::session::{ConversionMetadata, SessionRecordBuilder};
//!
//! let metadata = ConversionMetadata::builder("18o22025")
//!     .recording_date("Oct 22, 2018")
//!     .cell_number("3")
//!     .cell_type("Hu L2/3")
//!     .species("Human")
//!     .experimental_condition("Tumor")
//!     .gain(40.0)
//!     .dc_offset("125")
//!     .rmp_offset("-20")
//!     .build()?;
//!
//! let recording = SweepSet::from_rows(100_000.0, vec![vec![0.0; 8]], vec![vec![-65.0; 8]])?;
//! let record = SessionRecordBuilder::build(&recording, &metadata)?;
//! assert_eq!(record.cell_id(), "18o22025");
//! # Ok::<(), clampstore::Error>(())
//! ```

mod builder;
mod metadata;
mod record;

pub use builder::SessionRecordBuilder;
pub use metadata::{
    ConversionMetadata, ConversionMetadataBuilder, SessionMetadata, DEFAULT_DC_OFFSET,
    DEFAULT_DEVICE, DEFAULT_ELECTRODE, DEFAULT_PROTOCOL,
};
pub use record::{SessionRecord, COMMAND_UNIT, RESPONSE_UNIT, STARTING_TIME_SECS};
