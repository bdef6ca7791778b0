//! Run presets: what to generate and where to write it.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use cf_common::time::time_range;
use cf_common::{DataTree, EncodingTable, Frequency, GridSpec, TimeSpec};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregation::Aggregation;
use crate::encoding::{cdop3_encoding, gerda_encoding};
use crate::error::{SampleError, SampleResult};
use crate::fields::Product;
use crate::legacy::LegacyDatasetMaker;
use crate::metadata::Profile;
use crate::tree::DataTreeMaker;

/// Names of the built-in runs, in the order they are listed.
pub const BUILTIN_RUNS: [&str; 3] = ["daily-mean", "instantaneous", "cdop3"];

/// Runs executed when none are requested.
pub const DEFAULT_RUNS: [&str; 2] = ["daily-mean", "instantaneous"];

fn default_products() -> Vec<Product> {
    vec![Product::Clouds, Product::Radiation]
}

/// One sample file to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub file_name: String,
    #[serde(default)]
    pub profile: Profile,
    pub time: TimeSpec,
    #[serde(default = "GridSpec::global_one_degree")]
    pub grid: GridSpec,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default = "default_products")]
    pub products: Vec<Product>,
    #[serde(default)]
    pub void_timestamps: Vec<usize>,
}

/// A generated tree with the encoding and file name it should be written with.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub file_name: String,
    pub tree: DataTree,
    pub encoding: EncodingTable,
}

fn utc(y: i32, m: u32, d: u32, h: u32) -> SampleResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .ok_or_else(|| SampleError::config(format!("invalid date {}-{}-{} {}h", y, m, d, h)))
}

impl RunConfig {
    /// One daily mean on the global 1° grid, no void timestamps.
    pub fn daily_mean() -> SampleResult<Self> {
        let day = utc(2020, 1, 1, 0)?;
        Ok(Self {
            name: "daily-mean".to_string(),
            file_name: "TSTdm20200101000000120IMPGS01GL.nc".to_string(),
            profile: Profile::Gerda,
            time: TimeSpec {
                start: day,
                end: day,
                frequency: Frequency::Daily,
            },
            grid: GridSpec::global_one_degree(),
            aggregation: Aggregation::Daily,
            products: default_products(),
            void_timestamps: Vec::new(),
        })
    }

    /// One day of hourly snapshots with two void hours.
    pub fn instantaneous() -> SampleResult<Self> {
        Ok(Self {
            name: "instantaneous".to_string(),
            file_name: "TSTin20200101000000120IMPGS01GL.nc".to_string(),
            profile: Profile::Gerda,
            time: TimeSpec {
                start: utc(2020, 1, 1, 0)?,
                end: utc(2020, 1, 1, 23)?,
                frequency: Frequency::Hourly,
            },
            grid: GridSpec::global_one_degree(),
            aggregation: Aggregation::Instantaneous,
            products: default_products(),
            void_timestamps: vec![4, 20],
        })
    }

    /// January 1980 of daily means in the flat CDOP-3 layout.
    pub fn cdop3() -> SampleResult<Self> {
        Ok(Self {
            name: "cdop3".to_string(),
            file_name: "test.nc".to_string(),
            profile: Profile::Cdop3,
            time: TimeSpec {
                start: utc(1980, 1, 1, 0)?,
                end: utc(1980, 1, 31, 0)?,
                frequency: Frequency::Daily,
            },
            grid: GridSpec::global_one_degree(),
            aggregation: Aggregation::Daily,
            products: vec![Product::Clouds],
            void_timestamps: vec![4, 20],
        })
    }

    /// Look up a built-in run by name.
    pub fn builtin(name: &str) -> SampleResult<Self> {
        match name {
            "daily-mean" => Self::daily_mean(),
            "instantaneous" => Self::instantaneous(),
            "cdop3" => Self::cdop3(),
            _ => Err(SampleError::UnknownRun(name.to_string())),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SampleResult<()> {
        if self.name.trim().is_empty() {
            return Err(SampleError::config("run name must not be empty"));
        }
        if self.file_name.trim().is_empty() {
            return Err(SampleError::config(format!(
                "run '{}': file_name must not be empty",
                self.name
            )));
        }
        if !(self.grid.resolution > 0.0) {
            return Err(SampleError::config(format!(
                "run '{}': resolution must be > 0",
                self.name
            )));
        }
        if self.products.is_empty() {
            return Err(SampleError::config(format!(
                "run '{}': at least one product is required",
                self.name
            )));
        }
        let unique: HashSet<_> = self.products.iter().collect();
        if unique.len() != self.products.len() {
            return Err(SampleError::config(format!(
                "run '{}': products must not repeat",
                self.name
            )));
        }
        if self.profile == Profile::Cdop3 && self.products != [Product::Clouds] {
            return Err(SampleError::config(format!(
                "run '{}': the cdop3 profile only carries clouds",
                self.name
            )));
        }

        let ntimes = time_range(self.time.start, self.time.end, self.time.frequency)?.len();
        if ntimes == 0 {
            return Err(SampleError::NoTimeSteps);
        }
        if let Some(&index) = self.void_timestamps.iter().find(|&&i| i >= ntimes) {
            return Err(SampleError::VoidIndexOutOfRange { index, ntimes });
        }
        Ok(())
    }

    /// Generate the tree and pick the encoding for this run.
    pub fn build(&self, created: DateTime<Utc>) -> SampleResult<Sample> {
        self.validate()?;
        let (tree, encoding) = match self.profile {
            Profile::Gerda => {
                let maker = DataTreeMaker::new(
                    &self.time,
                    &self.grid,
                    &self.products,
                    self.aggregation,
                    &self.void_timestamps,
                )?;
                (maker.data_tree(created)?, gerda_encoding(&self.products))
            }
            Profile::Cdop3 => {
                let maker = LegacyDatasetMaker::new(&self.time, &self.grid, &self.void_timestamps)?;
                (maker.data_tree(created)?, cdop3_encoding())
            }
        };
        info!(run = %self.name, profile = %self.profile, file = %self.file_name, "Built sample");
        Ok(Sample {
            name: self.name.clone(),
            file_name: self.file_name.clone(),
            tree,
            encoding,
        })
    }
}

/// A YAML file listing runs.
///
/// ```yaml
/// runs:
///   - name: tiny
///     file_name: tiny.nc
///     time: { start: 2020-01-01, end: 2020-01-01, frequency: hourly }
///     grid: { lon_min: -1, lon_max: 1, lat_min: -1, lat_max: 1, resolution: 2 }
///     aggregation: instantaneous
///     void_timestamps: [0]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunsFile {
    pub runs: Vec<RunConfig>,
}

impl RunsFile {
    pub fn from_yaml_str(content: &str) -> SampleResult<Self> {
        let file: RunsFile = serde_yaml::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    /// Load and validate a runs file.
    pub fn load(path: impl AsRef<Path>) -> SampleResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> SampleResult<()> {
        let mut names = HashSet::new();
        for run in &self.runs {
            run.validate()?;
            if !names.insert(run.name.as_str()) {
                return Err(SampleError::config(format!("duplicate run name '{}'", run.name)));
            }
        }
        Ok(())
    }

    /// Select runs by name; an empty selection means every run.
    pub fn select(&self, names: &[String]) -> SampleResult<Vec<RunConfig>> {
        if names.is_empty() {
            return Ok(self.runs.clone());
        }
        names
            .iter()
            .map(|name| {
                self.runs
                    .iter()
                    .find(|r| &r.name == name)
                    .cloned()
                    .ok_or_else(|| SampleError::UnknownRun(name.clone()))
            })
            .collect()
    }
}

/// Built-in runs by name; an empty selection means the default runs.
pub fn builtin_runs(names: &[String]) -> SampleResult<Vec<RunConfig>> {
    if names.is_empty() {
        return DEFAULT_RUNS.iter().map(|n| RunConfig::builtin(n)).collect();
    }
    names.iter().map(|n| RunConfig::builtin(n)).collect()
}
