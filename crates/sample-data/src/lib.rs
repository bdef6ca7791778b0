//! Synthetic CM SAF/GERDA sample datasets.
//!
//! Builds deterministic cloud and radiation fields on a regular lat/lon
//! grid, masks void timestamps, attaches CF/ACDD metadata and assembles
//! everything into a [`cf_common::DataTree`] ready to be written.
//!
//! ```ignore
//! use sample_data::RunConfig;
//!
//! let sample = RunConfig::instantaneous()?.build(chrono::Utc::now())?;
//! assert_eq!(sample.tree.group_names().count(), 2);
//! ```

pub mod aggregation;
pub mod config;
pub mod encoding;
pub mod error;
pub mod fields;
pub mod legacy;
pub mod mask;
pub mod metadata;
pub mod tree;

pub use aggregation::Aggregation;
pub use config::{builtin_runs, RunConfig, RunsFile, Sample, BUILTIN_RUNS, DEFAULT_RUNS};
pub use error::{SampleError, SampleResult};
pub use fields::{FieldGenerator, Product};
pub use legacy::LegacyDatasetMaker;
pub use mask::Mask;
pub use metadata::Profile;
pub use tree::DataTreeMaker;
