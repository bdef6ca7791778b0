//! Cloud fraction, observation count and quality flag.

use cf_common::{Attributes, Coordinates, Dataset, VarData, Variable};
use ndarray::Array3;
use tracing::debug;

use super::{FieldGenerator, FIELD_DIMS};
use crate::aggregation::Aggregation;
use crate::error::{SampleError, SampleResult};
use crate::mask::Mask;
use crate::metadata::{self, Profile};

/// Cloud fraction values inside this band (percent) are dropped.
const CFC_GAP: (f64, f64) = (10.0, 20.0);

/// The `/clouds` group: `cfc`, `nobs` and `quality`.
#[derive(Debug, Clone, Copy)]
pub struct Clouds {
    aggregation: Aggregation,
}

impl Clouds {
    pub fn new(aggregation: Aggregation) -> Self {
        Self { aggregation }
    }
}

impl FieldGenerator for Clouds {
    fn name(&self) -> &'static str {
        "clouds"
    }

    fn dataset(&self, coords: &Coordinates, mask: &Mask) -> SampleResult<Dataset> {
        let mut ds = Dataset::with_attrs(Attributes::new().with("title", "Clouds"));

        let cfc = VarData::Float64(cloud_fraction(coords).into_dyn());
        ds.insert(
            "cfc",
            Variable::new(&FIELD_DIMS, cfc)?.with_attrs(metadata::cfc_attrs(self.aggregation)),
        )?;

        let nobs = VarData::UInt8(observation_count(coords)?.into_dyn());
        ds.insert(
            "nobs",
            Variable::new(&FIELD_DIMS, nobs)?.with_attrs(metadata::nobs_attrs(self.aggregation)),
        )?;

        let quality = VarData::UInt8(quality_flag(coords).into_dyn());
        ds.insert(
            "quality",
            Variable::new(&FIELD_DIMS, quality)?.with_attrs(metadata::quality_attrs(Profile::Gerda)),
        )?;

        mask.apply(&mut ds, &[("cfc", f64::NAN), ("nobs", 0.0)])?;
        debug!(aggregation = %self.aggregation, "Generated clouds group");
        Ok(ds)
    }
}

/// Cloud fraction in percent: `100 sin²(t/5 · lon) cos²(t/10 · lat)`.
///
/// Values in the gap band become NaN; only values below 10 or above 20 are
/// kept, so both band edges are dropped too.
pub fn cloud_fraction(coords: &Coordinates) -> Array3<f64> {
    Array3::from_shape_fn(coords.shape(), |(t, j, i)| {
        let t = t as f64;
        let lon_term = (t / 5.0 * coords.lon[i].to_radians()).sin().powi(2);
        let lat_term = (t / 10.0 * coords.lat[j].to_radians()).cos().powi(2);
        let v = 100.0 * lon_term * lat_term;
        if v < CFC_GAP.0 || v > CFC_GAP.1 {
            v
        } else {
            f64::NAN
        }
    })
}

/// Observation count: `96 sin²(t/5 · (lon + drift) · lat)` truncated to u8.
///
/// The longitude drift grows linearly from zero at the first time step to
/// half the longitude span at the last. A single time step has no drift.
pub fn observation_count(coords: &Coordinates) -> SampleResult<Array3<u8>> {
    let ntimes = coords.ntimes();
    if ntimes == 0 {
        return Err(SampleError::NoTimeSteps);
    }

    let (lon_min, lon_max) = coords
        .lon
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let half_span = (lon_max - lon_min) / 2.0;
    let tmax = (ntimes - 1) as f64;

    Ok(Array3::from_shape_fn(coords.shape(), |(t, j, i)| {
        let t = t as f64;
        let drift = if ntimes > 1 { half_span * t / tmax } else { 0.0 };
        let arg = t / 5.0 * (coords.lon[i] + drift).to_radians() * coords.lat[j].to_radians();
        (96.0 * arg.sin().powi(2)) as u8
    }))
}

/// Quality class of a latitude: 0 (good) below 30°, 1 (medium) between 30°
/// and 65°, 2 (bad) above 65°. Exactly 30° or 65° stays 0.
fn quality_class(lat: f64) -> u8 {
    let lat = lat.abs();
    if lat < 30.0 {
        0
    } else if lat > 30.0 && lat < 65.0 {
        1
    } else if lat > 65.0 {
        2
    } else {
        0
    }
}

/// Latitude-dependent quality flag, constant over time and longitude.
pub fn quality_flag(coords: &Coordinates) -> Array3<u8> {
    Array3::from_shape_fn(coords.shape(), |(_, j, _)| quality_class(coords.lat[j]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_common::{Frequency, GridSpec, TimeSpec};
    use chrono::{TimeZone, Utc};

    fn coords(hours: u32, grid: GridSpec) -> Coordinates {
        let time = TimeSpec {
            start: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2020, 1, 1, hours - 1, 0, 0).unwrap(),
            frequency: Frequency::Hourly,
        };
        Coordinates::build(&time, &grid).unwrap()
    }

    fn coarse_grid() -> GridSpec {
        GridSpec {
            lon_min: -175.0,
            lon_max: 175.0,
            lat_min: -85.0,
            lat_max: 85.0,
            resolution: 10.0,
        }
    }

    #[test]
    fn test_cloud_fraction_gap() {
        let cfc = cloud_fraction(&coords(24, coarse_grid()));
        assert_eq!(cfc.dim(), (24, 18, 36));
        for &v in cfc.iter() {
            if !v.is_nan() {
                assert!(v < 10.0 || v > 20.0, "value {} inside gap", v);
                assert!((0.0..=100.0).contains(&v));
            }
        }
        assert!(cfc.iter().any(|v| v.is_nan()));
    }

    #[test]
    fn test_first_step_is_cloud_free_and_unobserved() {
        let c = coords(3, coarse_grid());
        let cfc = cloud_fraction(&c);
        let nobs = observation_count(&c).unwrap();
        assert!(cfc.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 0.0));
        assert!(nobs.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_observation_count_single_step() {
        let nobs = observation_count(&coords(1, coarse_grid())).unwrap();
        assert_eq!(nobs.dim(), (1, 18, 36));
        assert!(nobs.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_observation_count_bounded() {
        let nobs = observation_count(&coords(24, coarse_grid())).unwrap();
        assert!(nobs.iter().all(|&v| v <= 96));
        assert!(nobs.iter().any(|&v| v > 0));
    }

    #[test]
    fn test_quality_partition_with_boundaries() {
        let grid = GridSpec {
            lon_min: 0.0,
            lon_max: 5.0,
            lat_min: -70.0,
            lat_max: 70.0,
            resolution: 5.0,
        };
        let c = coords(2, grid);
        let q = quality_flag(&c);
        for (j, &lat) in c.lat.iter().enumerate() {
            let expected = match lat.abs() {
                a if a == 30.0 || a == 65.0 => 0,
                a if a < 30.0 => 0,
                a if a < 65.0 => 1,
                _ => 2,
            };
            assert!(q.slice(ndarray::s![.., j, ..]).iter().all(|&v| v == expected));
        }
        assert_eq!(quality_class(30.0), 0);
        assert_eq!(quality_class(-65.0), 0);
        assert_eq!(quality_class(31.0), 1);
        assert_eq!(quality_class(-66.0), 2);
    }
}
