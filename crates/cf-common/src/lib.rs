//! Common types shared by the GERDA sample generator and its verifier.
//!
//! - [`attrs`]: netCDF attribute values and ordered attribute maps
//! - [`dataset`]: in-memory variables, datasets and group trees
//! - [`grid`]: coordinate axes and cell bounds
//! - [`time`]: repetition rules and CF time units
//! - [`crs`]: CF grid mapping for the regular lat/lon grid
//! - [`encoding`]: on-disk representation of each variable

pub mod attrs;
pub mod crs;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod grid;
pub mod time;

pub use attrs::{AttrValue, Attributes};
pub use crs::{CrsCode, GRID_MAPPING_VARIABLE};
pub use dataset::{DataKind, DataTree, Dataset, VarData, Variable, ROOT_GROUP};
pub use encoding::{DType, EncodingTable, FillValue, QuantizeMode, Quantization, VarEncoding};
pub use error::{CfError, CfResult};
pub use grid::{Alignment, Coordinates, GridSpec, TimeSpec};
pub use time::{Frequency, TimeUnit, TimeUnits};
