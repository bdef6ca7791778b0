//! Error types for sample generation.

use cf_common::CfError;
use thiserror::Error;

/// Result type alias using SampleError.
pub type SampleResult<T> = Result<T, SampleError>;

/// Errors that can occur while generating a sample dataset.
#[derive(Error, Debug)]
pub enum SampleError {
    /// Coordinate or dataset construction failed.
    #[error(transparent)]
    Cf(#[from] CfError),

    /// A void timestamp index does not exist on the time axis.
    #[error("void timestamp index {index} is out of range for {ntimes} time steps")]
    VoidIndexOutOfRange { index: usize, ntimes: usize },

    /// A mask entry names a variable the dataset does not have.
    #[error("cannot mask missing variable: {0}")]
    MaskVariableMissing(String),

    /// A masked variable has no time dimension.
    #[error("variable '{0}' has no time dimension")]
    NoTimeDimension(String),

    /// The fill value cannot be represented in the variable's type.
    #[error("fill value {fill} does not fit variable '{variable}' of type {kind}")]
    FillTypeMismatch {
        variable: String,
        fill: f64,
        kind: String,
    },

    /// The time axis has no steps.
    #[error("time axis has no steps")]
    NoTimeSteps,

    /// Invalid run configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// No run preset with this name.
    #[error("unknown run: {0}")]
    UnknownRun(String),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error while reading a config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SampleError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
