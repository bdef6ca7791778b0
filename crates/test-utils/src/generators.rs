//! Synthetic datasets with predictable values.
//!
//! These trees exercise every variable kind the writer supports without
//! depending on the sample generator itself.

use cf_common::{AttrValue, Attributes, DataTree, Dataset, VarData, Variable};
use chrono::{Duration, TimeZone, Utc};
use ndarray::{Array1, Array2, ArrayD, IxDyn};

/// Creates a `(time, lat)` field whose values encode their own indices.
///
/// Each value is `t * 100 + j + 0.25`, except that `(0, 0)` is NaN so
/// missing-value handling is exercised too.
pub fn ramp_field(ntime: usize, nlat: usize) -> Array2<f64> {
    Array2::from_shape_fn((ntime, nlat), |(t, j)| {
        if t == 0 && j == 0 {
            f64::NAN
        } else {
            (t * 100 + j) as f64 + 0.25
        }
    })
}

/// A self-contained group: time and lat coordinates with bounds, a float
/// field, a u8 flag field and a scalar grid mapping.
pub fn sample_group(title: &str, ntime: usize, nlat: usize) -> Dataset {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let times: Vec<_> = (0..ntime).map(|i| t0 + Duration::hours(i as i64)).collect();
    let time_bounds: Vec<_> = times.iter().map(|&t| [t, t + Duration::hours(1)]).collect();
    let lat: Vec<f64> = (0..nlat).map(|j| j as f64 * 10.0 - 5.0).collect();
    let lat_bounds: Vec<[f64; 2]> = lat.iter().map(|&v| [v - 5.0, v + 5.0]).collect();

    let mut ds = Dataset::with_attrs(Attributes::new().with("title", title));
    let insert = |ds: &mut Dataset, name: &str, var: Variable| {
        ds.insert(name, var).unwrap();
    };

    insert(
        &mut ds,
        "time",
        Variable::new(&["time"], VarData::Time(Array1::from(times).into_dyn()))
            .unwrap()
            .with_attrs(
                Attributes::new()
                    .with("bounds", "time_bounds")
                    .with("standard_name", "time"),
            ),
    );
    insert(
        &mut ds,
        "time_bounds",
        Variable::new(
            &["time", "bounds"],
            VarData::Time(Array2::from(time_bounds).into_dyn()),
        )
        .unwrap(),
    );
    insert(
        &mut ds,
        "lat",
        Variable::new(&["lat"], VarData::Float64(Array1::from(lat).into_dyn()))
            .unwrap()
            .with_attrs(
                Attributes::new()
                    .with("bounds", "lat_bounds")
                    .with("units", "degrees_north"),
            ),
    );
    insert(
        &mut ds,
        "lat_bounds",
        Variable::new(
            &["lat", "bounds"],
            VarData::Float64(Array2::from(lat_bounds).into_dyn()),
        )
        .unwrap(),
    );
    insert(
        &mut ds,
        "value",
        Variable::new(
            &["time", "lat"],
            VarData::Float64(ramp_field(ntime, nlat).into_dyn()),
        )
        .unwrap()
        .with_attrs(
            Attributes::new()
                .with("long_name", "Ramp")
                .with("ancillary_variables", "flag")
                .with("grid_mapping", "crs"),
        ),
    );
    insert(
        &mut ds,
        "flag",
        Variable::new(
            &["time", "lat"],
            VarData::UInt8(ArrayD::from_shape_fn(IxDyn(&[ntime, nlat]), |idx| {
                (idx[1] % 3) as u8
            })),
        )
        .unwrap()
        .with_attrs(
            Attributes::new()
                .with("flag_values", AttrValue::UBytes(vec![0, 1, 2]))
                .with("flag_meanings", "good medium bad"),
        ),
    );
    insert(
        &mut ds,
        "crs",
        Variable::new(&[], VarData::Int32(ArrayD::from_elem(IxDyn(&[]), 0)))
            .unwrap()
            .with_attrs(Attributes::new().with("grid_mapping_name", "latitude_longitude")),
    );
    ds
}

/// A tree with two groups, `/alpha` and `/beta`, under a root holding only
/// global attributes.
pub fn two_group_tree() -> DataTree {
    let root = Dataset::with_attrs(
        Attributes::new()
            .with("title", "Two group test tree")
            .with("date_created", "2025-01-15T12:00:00Z")
            .with("geospatial_lat_min", -10.0),
    );
    let mut tree = DataTree::new(root);
    tree.insert_group("alpha", sample_group("Alpha", 3, 4));
    tree.insert_group("beta", sample_group("Beta", 3, 4));
    tree
}
