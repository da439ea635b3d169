//! Emulator error types

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`EmulatorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input, raised before any model I/O.
    Input,
    /// A model artifact or lookup table is missing at the configured location.
    ArtifactNotFound,
    /// An artifact exists but cannot be read or parsed.
    Artifact,
    /// A model failed while producing a trajectory.
    ModelInvocation,
    /// Pipeline outputs did not cover the batch.
    Internal,
}

/// Errors that can occur while building scenarios or running the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// No net-type usage was supplied to the aggregator
    #[error("You must supply at least one net type usage")]
    EmptyNetUsage,

    /// A net-type key is outside the canonical set
    #[error("Unknown net type '{name}': expected one of {expected}")]
    UnknownNetType { name: String, expected: String },

    /// Net usages sum to more than the whole population
    #[error("Net usage fractions sum to {total:.6}, which exceeds 1")]
    NetUsageExceedsOne { total: f64 },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A scenario field lies outside its physically valid range
    #[error("Field '{field}' = {value} is outside the valid range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A sequence-valued field cannot be broadcast to the batch length
    #[error("Field '{field}' has length {len}, expected 1 or {expected}")]
    ShapeMismatch {
        field: String,
        len: usize,
        expected: usize,
    },

    /// Building produced no scenarios
    #[error("Scenario batch is empty")]
    EmptyBatch,

    /// Scenario tags must be unique within a batch
    #[error("Duplicate scenario tag '{tag}' at rows {first} and {second}")]
    DuplicateScenarioTag {
        tag: String,
        first: usize,
        second: usize,
    },

    /// Prediction horizon must be positive
    #[error("time_steps must be a positive integer, got {0}")]
    InvalidTimeSteps(usize),

    /// Predictor name not recognised
    #[error("Unknown predictor '{0}': expected one of prevalence, cases")]
    UnknownPredictor(String),

    /// Model architecture tag not recognised
    #[error("Unknown model type '{0}': expected one of LSTM, GRU")]
    UnknownModelType(String),

    /// An input error attributed to one scenario row
    #[error("Scenario row {row}: {source}")]
    InRow {
        row: usize,
        #[source]
        source: Box<EmulatorError>,
    },

    /// Artifact missing at the configured location
    #[error("{what} not found at '{}'. {hint}", path.display())]
    ArtifactNotFound {
        what: String,
        path: PathBuf,
        hint: String,
    },

    /// Artifact present but malformed
    #[error("Invalid artifact '{}': {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    /// Artifact could not be read
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The underlying predictor failed during execution
    #[error("Model {model} failed on scenario '{scenario_tag}': {reason}")]
    ModelInvocation {
        model: String,
        scenario_tag: String,
        reason: String,
    },

    /// Aggregation found outputs that do not cover the batch
    #[error("Incomplete results for {predictor}: {reason}")]
    IncompleteResults { predictor: String, reason: String },
}

impl EmulatorError {
    /// Convenience constructor for [`EmulatorError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Attribute this error to scenario row `row`.
    pub fn in_row(self, row: usize) -> Self {
        match self {
            already @ Self::InRow { .. } => already,
            other => Self::InRow {
                row,
                source: Box::new(other),
            },
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InRow { source, .. } => source.kind(),
            Self::ArtifactNotFound { .. } => ErrorKind::ArtifactNotFound,
            Self::InvalidArtifact { .. } | Self::Io { .. } => ErrorKind::Artifact,
            Self::ModelInvocation { .. } => ErrorKind::ModelInvocation,
            Self::IncompleteResults { .. } => ErrorKind::Internal,
            _ => ErrorKind::Input,
        }
    }

    pub fn is_input_error(&self) -> bool {
        self.kind() == ErrorKind::Input
    }
}
