//! Legacy CDOP-3 sample: a flat file with daily cloud fraction only.

use chrono::{DateTime, Utc};
use cf_common::{Attributes, Coordinates, DataTree, Dataset, GridSpec, TimeSpec, VarData, Variable};
use tracing::info;

use crate::error::{SampleError, SampleResult};
use crate::fields::{cloud_fraction, observation_count, quality_flag, FIELD_DIMS};
use crate::mask::Mask;
use crate::metadata::{self, Profile};
use crate::tree::coordinate_dataset;

/// Name of the cloud fraction variable in CDOP-3 files.
pub const LEGACY_CFC: &str = "cfc_dm";

fn round_two_decimals(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

fn cfc_attrs() -> Attributes {
    Attributes::new()
        .with("ancillary_variables", "nobs quality")
        .with(
            "cell_methods",
            "time: area: mean (interval: 15 minutes interval: 3 km)",
        )
        .with("long_name", "Daily Mean Cloud Fraction")
        .with("standard_name", "cloud_area_fraction")
        .with("units", "%")
}

fn nobs_attrs() -> Attributes {
    Attributes::new()
        .with(
            "cell_methods",
            "time: area: sum (interval: 15 minutes interval: 3 km)",
        )
        .with("long_name", "Number of Observations")
        .with("standard_name", "cloud_area_fraction number_of_observations")
        .with("units", "1")
}

/// Builds the flat CDOP-3 layout: every variable and the global attributes
/// live in the root group.
#[derive(Debug, Clone)]
pub struct LegacyDatasetMaker {
    coords: Coordinates,
    mask: Mask,
}

impl LegacyDatasetMaker {
    pub fn new(time: &TimeSpec, grid: &GridSpec, void_timestamps: &[usize]) -> SampleResult<Self> {
        let coords = Coordinates::build(time, grid)?;
        if coords.ntimes() == 0 {
            return Err(SampleError::NoTimeSteps);
        }
        let mask = Mask::new(void_timestamps);
        mask.validate(coords.ntimes())?;
        Ok(Self { coords, mask })
    }

    pub fn dataset(&self, created: DateTime<Utc>) -> SampleResult<Dataset> {
        let mut ds = coordinate_dataset(&self.coords, Profile::Cdop3)?;
        ds.attrs = metadata::cdop3_global_attrs(&self.coords, created);

        let cfc = cloud_fraction(&self.coords).mapv(round_two_decimals);
        ds.insert(
            LEGACY_CFC,
            Variable::new(&FIELD_DIMS, VarData::Float64(cfc.into_dyn()))?.with_attrs(cfc_attrs()),
        )?;
        let nobs = observation_count(&self.coords)?;
        ds.insert(
            "nobs",
            Variable::new(&FIELD_DIMS, VarData::UInt8(nobs.into_dyn()))?.with_attrs(nobs_attrs()),
        )?;
        let quality = quality_flag(&self.coords);
        ds.insert(
            "quality",
            Variable::new(&FIELD_DIMS, VarData::UInt8(quality.into_dyn()))?
                .with_attrs(metadata::quality_attrs(Profile::Cdop3)),
        )?;

        self.mask
            .apply(&mut ds, &[(LEGACY_CFC, f64::NAN), ("nobs", 0.0)])?;
        ds.insert(
            "record_status",
            self.mask
                .record_status_variable(self.coords.ntimes(), Profile::Cdop3.record_scope())?,
        )?;

        info!(
            ntime = self.coords.ntimes(),
            void = ?self.mask.void_timestamps(),
            "Built legacy dataset"
        );
        Ok(ds)
    }

    /// The flat dataset wrapped as a tree without child groups.
    pub fn data_tree(&self, created: DateTime<Utc>) -> SampleResult<DataTree> {
        Ok(DataTree::new(self.dataset(created)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_common::Frequency;
    use chrono::TimeZone;

    fn maker() -> LegacyDatasetMaker {
        let time = TimeSpec {
            start: Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(1980, 1, 31, 0, 0, 0).unwrap(),
            frequency: Frequency::Daily,
        };
        let grid = GridSpec {
            lon_min: -170.0,
            lon_max: 170.0,
            lat_min: -80.0,
            lat_max: 80.0,
            resolution: 20.0,
        };
        LegacyDatasetMaker::new(&time, &grid, &[4, 20]).unwrap()
    }

    #[test]
    fn test_legacy_layout_is_flat() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let tree = maker().data_tree(created).unwrap();
        assert_eq!(tree.groups().count(), 0);
        assert!(tree.root.contains(LEGACY_CFC));
        assert!(tree.root.contains("record_status"));
        assert_eq!(tree.root.attrs.get_str("variable_id"), Some("cfc_dm"));
    }

    #[test]
    fn test_legacy_cfc_rounded_and_masked() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ds = maker().dataset(created).unwrap();
        let cfc = ds.get(LEGACY_CFC).unwrap().data.as_f64().unwrap();
        for (idx, &v) in cfc.indexed_iter() {
            let t = idx[0];
            if t == 4 || t == 20 {
                assert!(v.is_nan());
            } else if !v.is_nan() {
                assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-6);
            }
        }
        let status: Vec<u8> = ds
            .get("record_status")
            .unwrap()
            .data
            .as_u8()
            .unwrap()
            .iter()
            .copied()
            .collect();
        assert_eq!(status[4], 1);
        assert_eq!(status[5], 0);
    }

    #[test]
    fn test_round_two_decimals() {
        assert_eq!(round_two_decimals(12.345678), 12.35);
        assert!(round_two_decimals(f64::NAN).is_nan());
    }
}
