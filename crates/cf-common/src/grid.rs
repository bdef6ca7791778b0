//! Coordinate axes and cell bounds for regular lat/lon grids.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CfError, CfResult};
use crate::time::{self, Frequency};

/// Position of a coordinate value inside its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Value is the lower cell edge.
    Left,
    /// Value is the cell midpoint.
    Center,
}

impl FromStr for Alignment {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            _ => Err(CfError::UnsupportedAlignment(s.to_string())),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::Left => write!(f, "left"),
            Alignment::Center => write!(f, "center"),
        }
    }
}

/// Values of `arange(min, max + step, step)` rounded to one decimal.
///
/// The end point is included when it lies on the step. Rounding uses
/// round-half-to-even.
pub fn axis_values(axis: &str, min: f64, max: f64, step: f64) -> CfResult<Vec<f64>> {
    if !(step.is_finite() && step > 0.0) {
        return Err(CfError::empty_axis(axis, format!("invalid step {}", step)));
    }
    if !(min.is_finite() && max.is_finite()) || max < min {
        return Err(CfError::empty_axis(
            axis,
            format!("max {} is below min {}", max, min),
        ));
    }

    let stop = max + step;
    let n = ((stop - min) / step).ceil() as usize;
    Ok((0..n)
        .map(|i| round_one_decimal(min + i as f64 * step))
        .collect())
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round_ties_even() / 10.0
}

/// Cell bounds `[lower, upper]` of each value of a numeric axis.
pub fn bounds(values: &[f64], step: f64, align: Alignment) -> Vec<[f64; 2]> {
    values
        .iter()
        .map(|&v| match align {
            Alignment::Left => [v, v + step],
            Alignment::Center => [v - 0.5 * step, v + 0.5 * step],
        })
        .collect()
}

/// Cell bounds of each timestamp of a time axis.
pub fn time_bounds(
    values: &[DateTime<Utc>],
    step: Duration,
    align: Alignment,
) -> Vec<[DateTime<Utc>; 2]> {
    let half = step / 2;
    values
        .iter()
        .map(|&t| match align {
            Alignment::Left => [t, t + step],
            Alignment::Center => [t - half, t + step - half],
        })
        .collect()
}

/// Time axis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSpec {
    #[serde(with = "time::timestamp")]
    pub start: DateTime<Utc>,
    #[serde(with = "time::timestamp")]
    pub end: DateTime<Utc>,
    pub frequency: Frequency,
}

/// Spatial extent and resolution of a regular lat/lon grid, in degrees.
///
/// `min`/`max` are the first and last cell centres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub resolution: f64,
}

impl GridSpec {
    /// Global grid with cell centres on half degrees at 1° resolution.
    pub fn global_one_degree() -> Self {
        Self {
            lon_min: -179.5,
            lon_max: 179.5,
            lat_min: -89.5,
            lat_max: 89.5,
            resolution: 1.0,
        }
    }
}

/// The shared coordinate set of a sample file.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub time: Vec<DateTime<Utc>>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub time_bounds: Vec<[DateTime<Utc>; 2]>,
    pub lon_bounds: Vec<[f64; 2]>,
    pub lat_bounds: Vec<[f64; 2]>,
    pub frequency: Frequency,
    pub resolution: f64,
}

impl Coordinates {
    /// Build time, lon and lat axes plus their bounds.
    ///
    /// Time bounds are left-aligned (a value opens its period); lon/lat
    /// bounds are centred on the value.
    pub fn build(time: &TimeSpec, grid: &GridSpec) -> CfResult<Self> {
        let times = time::time_range(time.start, time.end, time.frequency)?;
        let lon = axis_values("lon", grid.lon_min, grid.lon_max, grid.resolution)?;
        let lat = axis_values("lat", grid.lat_min, grid.lat_max, grid.resolution)?;
        debug!(
            ntime = times.len(),
            nlon = lon.len(),
            nlat = lat.len(),
            frequency = %time.frequency,
            "Built coordinate axes"
        );

        Ok(Self {
            time_bounds: time_bounds(&times, time.frequency.step(), Alignment::Left),
            lon_bounds: bounds(&lon, grid.resolution, Alignment::Center),
            lat_bounds: bounds(&lat, grid.resolution, Alignment::Center),
            time: times,
            lon,
            lat,
            frequency: time.frequency,
            resolution: grid.resolution,
        })
    }

    pub fn ntimes(&self) -> usize {
        self.time.len()
    }

    /// Field shape `(time, lat, lon)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.time.len(), self.lat.len(), self.lon.len())
    }

    pub fn lon_extent(&self) -> (f64, f64) {
        extent(self.lon_bounds.iter().flatten().copied())
    }

    pub fn lat_extent(&self) -> (f64, f64) {
        extent(self.lat_bounds.iter().flatten().copied())
    }

    /// Earliest and latest time bound.
    pub fn time_coverage(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let all = self.time_bounds.iter().flatten();
        let start = all.clone().min()?;
        let end = all.max()?;
        Some((*start, *end))
    }
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
