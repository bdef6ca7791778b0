//! Error types for netCDF reading, writing and verification.

use cf_common::CfError;
use thiserror::Error;

use crate::compare::CompareError;

/// Result type for netCDF operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for netCDF I/O.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reported by libnetcdf
    #[error("netCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    /// Invalid tree or dataset construction
    #[error(transparent)]
    Cf(#[from] CfError),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// A variable type that has no in-memory counterpart
    #[error("Variable '{variable}': unsupported type {found}")]
    UnsupportedType { variable: String, found: String },

    /// A value that cannot be stored in the requested on-disk type
    #[error("Variable '{variable}': value {value} cannot be stored as {dtype}")]
    ValueOutOfRange {
        variable: String,
        value: f64,
        dtype: String,
    },

    /// Name clash while flattening groups
    #[error("Flattened name '{0}' is used twice")]
    NameCollision(String),

    /// Generated and reference files differ
    #[error(transparent)]
    Mismatch(#[from] CompareError),

    /// External program could not be run
    #[error("Command execution failed: {0}")]
    CommandError(String),
}
