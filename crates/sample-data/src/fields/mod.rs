//! Synthetic field generators.
//!
//! Every field is a deterministic function of the coordinate grid and the
//! integer time index, with shape `(time, lat, lon)`.

mod clouds;
mod radiation;

pub use clouds::{cloud_fraction, observation_count, quality_flag, Clouds};
pub use radiation::{heart_indicator, rotate_indicator, shortwave_radiation, Radiation};

use std::fmt;

use cf_common::{Coordinates, Dataset};
use serde::{Deserialize, Serialize};

use crate::aggregation::Aggregation;
use crate::error::SampleResult;
use crate::mask::Mask;

/// Dimension names of every field variable.
pub const FIELD_DIMS: [&str; 3] = ["time", "lat", "lon"];

/// A product group of a sample file.
pub trait FieldGenerator {
    /// Group name, e.g. `"clouds"`.
    fn name(&self) -> &'static str;

    /// Product variables with the mask applied, plus the group `title`.
    fn dataset(&self, coords: &Coordinates, mask: &Mask) -> SampleResult<Dataset>;
}

/// Products a sample file can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Clouds,
    Radiation,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Clouds => "clouds",
            Product::Radiation => "radiation",
        }
    }

    /// Generator of this product with the given aggregation's attributes.
    pub fn generator(&self, aggregation: Aggregation) -> Box<dyn FieldGenerator> {
        match self {
            Product::Clouds => Box::new(Clouds::new(aggregation)),
            Product::Radiation => Box::new(Radiation::new(aggregation)),
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
