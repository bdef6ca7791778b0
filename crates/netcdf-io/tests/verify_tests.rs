//! Flattening of written files and the external checker.

use cf_common::AttrValue;
use netcdf_io::{
    check_file, flatten_file, has_flattener_attrs, read_tree, write_tree, FLATTENER_ATTR_PREFIX,
};
use sample_data::RunConfig;
use test_utils::{coarse_global_grid, fixed_created, require_program, temp_test_dir, two_group_tree};

#[test]
fn test_flattened_file_has_prefixed_names_only() {
    let dir = temp_test_dir();
    let grouped = dir.path().join("grouped.nc");
    let flat = dir.path().join("flat.nc");
    write_tree(&two_group_tree(), &Default::default(), &grouped).unwrap();

    flatten_file(&grouped, &flat).unwrap();
    let tree = read_tree(&flat).unwrap().tree;

    assert_eq!(tree.groups().count(), 0);
    for prefix in ["alpha__", "beta__"] {
        assert!(tree.root.names().any(|n| n.starts_with(prefix)));
    }
    assert!(!has_flattener_attrs(&tree));
    assert!(tree
        .root
        .attrs
        .names()
        .all(|n| !n.starts_with(FLATTENER_ATTR_PREFIX)));
}

#[test]
fn test_flattened_sample_keeps_references_and_time() {
    let dir = temp_test_dir();
    let grouped = dir.path().join("sample.nc");
    let flat = dir.path().join("sample.flat.nc");

    let mut run = RunConfig::instantaneous().unwrap();
    run.grid = coarse_global_grid();
    let sample = run.build(fixed_created()).unwrap();
    write_tree(&sample.tree, &sample.encoding, &grouped).unwrap();
    flatten_file(&grouped, &flat).unwrap();

    let loaded = read_tree(&flat).unwrap();
    let root = &loaded.tree.root;
    let sis = root.get("radiation__sis").unwrap();
    assert_eq!(
        sis.attrs.get("_QuantizeBitGroomNumberOfSignificantDigits"),
        Some(&AttrValue::Int(2))
    );
    assert_eq!(sis.attrs.get_str("grid_mapping"), Some("radiation__latlon_grid"));
    assert_eq!(
        root.get("clouds__cfc").unwrap().attrs.get_str("ancillary_variables"),
        Some("clouds__nobs clouds__quality")
    );
    assert_eq!(
        loaded
            .encoding
            .get("/", "clouds__time")
            .and_then(|e| e.units.as_deref()),
        Some("days since 2000-01-01T00:00:00Z")
    );
    assert!(root.get("clouds__time_bounds").unwrap().data.as_time().is_some());
    assert_eq!(root.attrs.get_str("clouds__title"), Some("Clouds"));
}

#[test]
fn test_cfchecks_accepts_flattened_sample() {
    let cfchecks = require_program!("cfchecks");
    let dir = temp_test_dir();
    let grouped = dir.path().join("TSTin.nc");
    let flat = dir.path().join("TSTin.flat.nc");

    let mut run = RunConfig::instantaneous().unwrap();
    run.grid = coarse_global_grid();
    let sample = run.build(fixed_created()).unwrap();
    write_tree(&sample.tree, &sample.encoding, &grouped).unwrap();

    let outcome = check_file(&grouped, &flat, &cfchecks.to_string_lossy()).unwrap();
    assert!(outcome.success(), "{}\n{}", outcome.stdout, outcome.stderr);
}
