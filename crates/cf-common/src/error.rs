//! Error types for the CF data model and coordinate construction.

use thiserror::Error;

/// Result type alias using CfError.
pub type CfResult<T> = Result<T, CfError>;

/// Errors raised while building coordinates or assembling datasets.
#[derive(Debug, Error)]
pub enum CfError {
    // === Unsupported configuration ===
    #[error("Unsupported bounds alignment: {0}")]
    UnsupportedAlignment(String),

    #[error("Unsupported time frequency: {0}")]
    UnsupportedFrequency(String),

    #[error("Unsupported quantization mode: {0}")]
    UnsupportedQuantizeMode(String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid time units '{units}': {message}")]
    InvalidTimeUnits { units: String, message: String },

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    // === Grid construction ===
    #[error("Axis '{axis}' is empty: {message}")]
    EmptyAxis { axis: String, message: String },

    // === Dataset assembly ===
    #[error("Variable '{variable}' has {data_dims} data dimensions but {named} dimension names")]
    DimensionCountMismatch {
        variable: String,
        data_dims: usize,
        named: usize,
    },

    #[error("Dimension '{dim}' has conflicting sizes {first} and {second}")]
    ConflictingDimension {
        dim: String,
        first: usize,
        second: usize,
    },
}

impl CfError {
    /// Create an EmptyAxis error.
    pub fn empty_axis(axis: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmptyAxis {
            axis: axis.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidTimeUnits error.
    pub fn invalid_time_units(units: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTimeUnits {
            units: units.into(),
            message: message.into(),
        }
    }

    /// Whether this error stems from an unrecognized configuration key.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            CfError::UnsupportedAlignment(_)
                | CfError::UnsupportedFrequency(_)
                | CfError::UnsupportedQuantizeMode(_)
                | CfError::UnsupportedCrs(_)
        )
    }
}
