//! Conversion metadata - caller-supplied acquisition and session fields

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default DC level label when the acquisition notes don't give one.
pub const DEFAULT_DC_OFFSET: &str = "not_given";

/// Default free-text protocol label.
pub const DEFAULT_PROTOCOL: &str = "white noise";

/// Default acquisition device name.
pub const DEFAULT_DEVICE: &str = "Clampfit";

/// Default recording electrode name.
pub const DEFAULT_ELECTRODE: &str = "elec0";

fn default_dc_offset() -> String {
    DEFAULT_DC_OFFSET.to_string()
}

/// Descriptive bundle for one recording session.
///
/// All fields are free text and attached to the session record verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMetadata {
    /// Date the cell was recorded (kept as written, e.g. `"Oct 22, 2018"`).
    pub recording_date: String,
    /// Species the tissue came from.
    pub species: String,
    /// Experimental condition (e.g. `"Epilepsy"`, `"Tumor"`).
    pub experimental_condition: String,
    /// Cell type description (e.g. `"Hu L2/3"`).
    pub cell_type: String,
    /// Stimulus protocol label.
    pub protocol: String,
    /// Cell number within the day's recordings.
    pub cell_number: String,
    /// Acquisition device the recording came from.
    pub device: String,
    /// Electrode both traces were recorded through.
    pub electrode: String,
    /// Person who performed the recording.
    pub experimenter: Option<String>,
    /// Lab name.
    pub lab: Option<String>,
    /// Institution name.
    pub institution: Option<String>,
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self {
            recording_date: String::new(),
            species: String::new(),
            experimental_condition: String::new(),
            cell_type: String::new(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            cell_number: String::new(),
            device: DEFAULT_DEVICE.to_string(),
            electrode: DEFAULT_ELECTRODE.to_string(),
            experimenter: None,
            lab: None,
            institution: None,
        }
    }
}

/// Metadata bundle for converting one recording.
///
/// Nothing here is inferred from the recording; every value is supplied by
/// the caller. Construct through [`ConversionMetadata::builder`], which
/// validates the cell identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionMetadata {
    #[serde(default)]
    cell_id: String,
    #[serde(default)]
    gain: f64,
    #[serde(default = "default_dc_offset")]
    dc_offset: String,
    #[serde(default)]
    rmp_offset: Option<String>,
    #[serde(default)]
    session: SessionMetadata,
}

impl ConversionMetadata {
    /// Create a builder for the given cell identifier.
    #[must_use]
    pub fn builder(cell_id: impl Into<String>) -> ConversionMetadataBuilder {
        ConversionMetadataBuilder::new(cell_id)
    }

    /// Check the invariants a deserialized value may have skipped.
    ///
    /// The cell identifier doubles as the artifact file stem, so it must be
    /// non-blank and free of path separators.
    ///
    /// # Errors
    ///
    /// `MissingIdentifier` for a blank id, `InvalidMetadata` for an id that
    /// is not usable as a file stem.
    pub fn validate(&self) -> Result<()> {
        let id = self.cell_id.trim();
        if id.is_empty() {
            return Err(Error::MissingIdentifier);
        }
        if id != self.cell_id {
            return Err(Error::InvalidMetadata(format!(
                "cell_id {:?} has leading or trailing whitespace",
                self.cell_id
            )));
        }
        if id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(Error::InvalidMetadata(format!(
                "cell_id {id:?} cannot be used as a file stem"
            )));
        }
        Ok(())
    }

    /// Get the cell identifier.
    #[must_use]
    pub fn cell_id(&self) -> &str {
        &self.cell_id
    }

    /// Get the recording gain.
    #[must_use]
    pub const fn gain(&self) -> f64 {
        self.gain
    }

    /// Get the DC level label.
    #[must_use]
    pub fn dc_offset(&self) -> &str {
        &self.dc_offset
    }

    /// Get the resting membrane potential offset, if given.
    #[must_use]
    pub fn rmp_offset(&self) -> Option<&str> {
        self.rmp_offset.as_deref()
    }

    /// Get the descriptive session bundle.
    #[must_use]
    pub const fn session(&self) -> &SessionMetadata {
        &self.session
    }

    /// `"Cell #<n>"`
    #[must_use]
    pub fn session_description(&self) -> String {
        format!("Cell #{}", self.session.cell_number)
    }

    /// Species, condition and cell type joined by spaces (blank parts skipped).
    #[must_use]
    pub fn experiment_description(&self) -> String {
        [
            self.session.species.as_str(),
            self.session.experimental_condition.as_str(),
            self.session.cell_type.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Stimulus series description, `"DC<dc_offset>"`.
    #[must_use]
    pub fn stimulus_description(&self) -> String {
        format!("DC{}", self.dc_offset)
    }

    /// Free-text notes carrying the RMP offset, if one was given.
    #[must_use]
    pub fn notes(&self) -> Option<String> {
        self.rmp_offset
            .as_ref()
            .map(|offset| format!("RMP Offset: {offset}"))
    }
}

/// Builder for `ConversionMetadata`.
#[derive(Debug)]
pub struct ConversionMetadataBuilder {
    cell_id: String,
    gain: f64,
    dc_offset: String,
    rmp_offset: Option<String>,
    session: SessionMetadata,
}

impl ConversionMetadataBuilder {
    /// Create a new builder with the required cell identifier.
    #[must_use]
    pub fn new(cell_id: impl Into<String>) -> Self {
        Self {
            cell_id: cell_id.into(),
            gain: 0.0,
            dc_offset: default_dc_offset(),
            rmp_offset: None,
            session: SessionMetadata::default(),
        }
    }

    /// Set the recording gain.
    #[must_use]
    pub const fn gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    /// Set the DC level label.
    #[must_use]
    pub fn dc_offset(mut self, dc_offset: impl Into<String>) -> Self {
        self.dc_offset = dc_offset.into();
        self
    }

    /// Set the resting membrane potential offset.
    #[must_use]
    pub fn rmp_offset(mut self, rmp_offset: impl Into<String>) -> Self {
        self.rmp_offset = Some(rmp_offset.into());
        self
    }

    /// Replace the whole session bundle.
    #[must_use]
    pub fn session(mut self, session: SessionMetadata) -> Self {
        self.session = session;
        self
    }

    /// Set the recording date.
    #[must_use]
    pub fn recording_date(mut self, date: impl Into<String>) -> Self {
        self.session.recording_date = date.into();
        self
    }

    /// Set the species.
    #[must_use]
    pub fn species(mut self, species: impl Into<String>) -> Self {
        self.session.species = species.into();
        self
    }

    /// Set the experimental condition.
    #[must_use]
    pub fn experimental_condition(mut self, condition: impl Into<String>) -> Self {
        self.session.experimental_condition = condition.into();
        self
    }

    /// Set the cell type.
    #[must_use]
    pub fn cell_type(mut self, cell_type: impl Into<String>) -> Self {
        self.session.cell_type = cell_type.into();
        self
    }

    /// Set the protocol label.
    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.session.protocol = protocol.into();
        self
    }

    /// Set the cell number.
    #[must_use]
    pub fn cell_number(mut self, cell_number: impl Into<String>) -> Self {
        self.session.cell_number = cell_number.into();
        self
    }

    /// Set the acquisition device.
    #[must_use]
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.session.device = device.into();
        self
    }

    /// Set the electrode.
    #[must_use]
    pub fn electrode(mut self, electrode: impl Into<String>) -> Self {
        self.session.electrode = electrode.into();
        self
    }

    /// Set the experimenter.
    #[must_use]
    pub fn experimenter(mut self, experimenter: impl Into<String>) -> Self {
        self.session.experimenter = Some(experimenter.into());
        self
    }

    /// Set the lab.
    #[must_use]
    pub fn lab(mut self, lab: impl Into<String>) -> Self {
        self.session.lab = Some(lab.into());
        self
    }

    /// Set the institution.
    #[must_use]
    pub fn institution(mut self, institution: impl Into<String>) -> Self {
        self.session.institution = Some(institution.into());
        self
    }

    /// Build and validate the `ConversionMetadata`.
    ///
    /// # Errors
    ///
    /// See [`ConversionMetadata::validate`].
    pub fn build(self) -> Result<ConversionMetadata> {
        let metadata = ConversionMetadata {
            cell_id: self.cell_id,
            gain: self.gain,
            dc_offset: self.dc_offset,
            rmp_offset: self.rmp_offset,
            session: self.session,
        };
        metadata.validate()?;
        Ok(metadata)
    }
}
