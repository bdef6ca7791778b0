//! Assembly of coordinate bundles and grouped dataset trees.

use chrono::{DateTime, Utc};
use cf_common::{
    Coordinates, DataTree, Dataset, GridSpec, TimeSpec, VarData, Variable, GRID_MAPPING_VARIABLE,
};
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use tracing::{debug, info};

use crate::aggregation::Aggregation;
use crate::error::{SampleError, SampleResult};
use crate::fields::Product;
use crate::mask::Mask;
use crate::metadata::{self, Profile};

/// `time`, `lon`, `lat` and their bounds with the profile's attributes.
pub fn coordinate_dataset(coords: &Coordinates, profile: Profile) -> SampleResult<Dataset> {
    let mut ds = Dataset::new();

    let time = Array1::from(coords.time.clone()).into_dyn();
    ds.insert(
        "time",
        Variable::new(&["time"], VarData::Time(time))?.with_attrs(metadata::time_attrs(profile)),
    )?;
    let lon = Array1::from(coords.lon.clone()).into_dyn();
    ds.insert(
        "lon",
        Variable::new(&["lon"], VarData::Float64(lon))?.with_attrs(metadata::lon_attrs(profile)),
    )?;
    let lat = Array1::from(coords.lat.clone()).into_dyn();
    ds.insert(
        "lat",
        Variable::new(&["lat"], VarData::Float64(lat))?.with_attrs(metadata::lat_attrs(profile)),
    )?;

    let time_bounds = Array2::from(coords.time_bounds.clone()).into_dyn();
    ds.insert(
        "time_bounds",
        Variable::new(&["time", "bounds"], VarData::Time(time_bounds))?
            .with_attrs(metadata::bounds_attrs(profile, "Time")),
    )?;
    let lon_bounds = Array2::from(coords.lon_bounds.clone()).into_dyn();
    ds.insert(
        "lon_bounds",
        Variable::new(&["lon", "bounds"], VarData::Float64(lon_bounds))?
            .with_attrs(metadata::bounds_attrs(profile, "Longitude")),
    )?;
    let lat_bounds = Array2::from(coords.lat_bounds.clone()).into_dyn();
    ds.insert(
        "lat_bounds",
        Variable::new(&["lat", "bounds"], VarData::Float64(lat_bounds))?
            .with_attrs(metadata::bounds_attrs(profile, "Latitude")),
    )?;

    Ok(ds)
}

/// Scalar grid-mapping container; only its attributes carry information.
/// The value is a float64 NaN, stored with the default NaN fill.
pub fn grid_mapping_variable() -> SampleResult<Variable> {
    let data = VarData::Float64(ArrayD::from_elem(IxDyn(&[]), f64::NAN));
    Ok(Variable::new(&[], data)?.with_attrs(metadata::grid_mapping_attrs()))
}

/// Builds the grouped GERDA tree: one child group per product, each
/// repeating the full coordinate bundle, under a root holding only global
/// attributes.
#[derive(Debug, Clone)]
pub struct DataTreeMaker {
    coords: Coordinates,
    mask: Mask,
    aggregation: Aggregation,
    products: Vec<Product>,
}

impl DataTreeMaker {
    pub fn new(
        time: &TimeSpec,
        grid: &GridSpec,
        products: &[Product],
        aggregation: Aggregation,
        void_timestamps: &[usize],
    ) -> SampleResult<Self> {
        let coords = Coordinates::build(time, grid)?;
        if coords.ntimes() == 0 {
            return Err(SampleError::NoTimeSteps);
        }
        let mask = Mask::new(void_timestamps);
        mask.validate(coords.ntimes())?;

        Ok(Self {
            coords,
            mask,
            aggregation,
            products: products.to_vec(),
        })
    }

    /// Coordinates, bounds, record status and grid mapping shared by every group.
    pub fn coordinate_bundle(&self) -> SampleResult<Dataset> {
        let mut ds = coordinate_dataset(&self.coords, Profile::Gerda)?;
        ds.insert(
            "record_status",
            self.mask
                .record_status_variable(self.coords.ntimes(), Profile::Gerda.record_scope())?,
        )?;
        ds.insert(GRID_MAPPING_VARIABLE, grid_mapping_variable()?)?;
        Ok(ds)
    }

    /// The full tree; `created` becomes the `date_created` attribute.
    pub fn data_tree(&self, created: DateTime<Utc>) -> SampleResult<DataTree> {
        let bundle = self.coordinate_bundle()?;
        let root = Dataset::with_attrs(metadata::gerda_global_attrs(&self.coords, created));
        let mut tree = DataTree::new(root);

        for product in &self.products {
            let generator = product.generator(self.aggregation);
            let group = generator.dataset(&self.coords, &self.mask)?.merge(&bundle)?;
            debug!(group = generator.name(), variables = group.len(), "Assembled group");
            tree.insert_group(generator.name(), group);
        }

        let (ntime, nlat, nlon) = self.coords.shape();
        info!(
            groups = self.products.len(),
            ntime,
            nlat,
            nlon,
            void = ?self.mask.void_timestamps(),
            aggregation = %self.aggregation,
            "Built data tree"
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_common::Frequency;
    use chrono::TimeZone;

    fn small_maker(void: &[usize]) -> SampleResult<DataTreeMaker> {
        let time = TimeSpec {
            start: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2020, 1, 1, 3, 0, 0).unwrap(),
            frequency: Frequency::Hourly,
        };
        let grid = GridSpec {
            lon_min: -10.0,
            lon_max: 10.0,
            lat_min: -40.0,
            lat_max: 40.0,
            resolution: 10.0,
        };
        DataTreeMaker::new(
            &time,
            &grid,
            &[Product::Clouds, Product::Radiation],
            Aggregation::Instantaneous,
            void,
        )
    }

    #[test]
    fn test_groups_repeat_coordinates() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let tree = small_maker(&[1]).unwrap().data_tree(created).unwrap();

        assert!(tree.root.is_empty());
        assert_eq!(tree.root.attrs.get_str("date_created"), Some("2025-01-01T00:00:00Z"));
        assert_eq!(tree.group_names().collect::<Vec<_>>(), vec!["clouds", "radiation"]);

        for (_, group) in tree.groups() {
            for name in ["time", "lon", "lat", "time_bounds", "lon_bounds", "lat_bounds"] {
                assert!(group.contains(name), "missing {}", name);
            }
            assert!(group.contains("record_status"));
            let grid_mapping = &group.get(GRID_MAPPING_VARIABLE).unwrap().data;
            assert_eq!(grid_mapping.ndim(), 0);
            assert!(grid_mapping.as_f64().unwrap().iter().all(|v| v.is_nan()));
        }
        let clouds = tree.group("clouds").unwrap();
        assert_eq!(clouds.attrs.get_str("title"), Some("Clouds"));
        assert_eq!(clouds.get("cfc").unwrap().shape(), &[4, 9, 3]);
    }

    #[test]
    fn test_void_index_beyond_axis() {
        let err = small_maker(&[4]).unwrap_err();
        assert!(matches!(
            err,
            SampleError::VoidIndexOutOfRange { index: 4, ntimes: 4 }
        ));
    }
}
