//! netCDF-4 I/O for CF sample trees.
//!
//! - [`writer`]: serialize a [`cf_common::DataTree`] with an encoding table
//! - [`reader`]: load a file back, decoding time and fill values
//! - [`flatten`]: rewrite groups into one namespace
//! - [`compare`]: data and attribute comparison against a reference
//! - [`checker`]: run `cfchecks` as a subprocess
//!
//! # Example
//!
//! ```ignore
//! use netcdf_io::{read_tree, write_tree};
//!
//! write_tree(&sample.tree, &sample.encoding, "out.nc")?;
//! let loaded = read_tree("out.nc")?;
//! ```

pub mod checker;
pub mod compare;
pub mod error;
pub mod flatten;
mod native;
pub mod quantize;
pub mod reader;
pub mod verify;
pub mod writer;

pub use checker::{run_checker, CheckOutcome, DEFAULT_CHECKER};
pub use compare::{assert_trees_match, compare_trees, CompareError, Tolerance};
pub use error::{NetCdfError, NetCdfResult};
pub use flatten::{
    flatten_encoding, flatten_tree, has_flattener_attrs, strip_flattener_attrs,
    FLATTENER_ATTR_PREFIX,
};
pub use native::silence_hdf5_errors;
pub use reader::{read_tree, LoadedTree};
pub use verify::{check_file, compare_files, default_flat_path, flatten_file};
pub use writer::write_tree;
