//! Helpers around the `netcdf` crate: HDF5 error silencing and attribute
//! conversion between [`cf_common::AttrValue`] and [`netcdf::AttributeValue`].

use std::sync::Once;

use cf_common::AttrValue;
use netcdf::AttributeValue;
use tracing::debug;

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// It only needs to be called once per process, but is safe to call multiple
/// times. Call it before the first file is opened.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
pub(crate) fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute as f64.
pub(crate) fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

pub(crate) fn to_nc_attr(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::Str(s) => AttributeValue::Str(s.clone()),
        AttrValue::Strs(v) => AttributeValue::Strs(v.clone()),
        AttrValue::Double(v) => AttributeValue::Double(*v),
        AttrValue::Doubles(v) => AttributeValue::Doubles(v.clone()),
        AttrValue::Float(v) => AttributeValue::Float(*v),
        AttrValue::Floats(v) => AttributeValue::Floats(v.clone()),
        AttrValue::Int(v) => AttributeValue::Int(*v),
        AttrValue::Ints(v) => AttributeValue::Ints(v.clone()),
        AttrValue::UBytes(v) => AttributeValue::Uchars(v.clone()),
    }
}

/// Convert a stored attribute. Single-element arrays come back from
/// libnetcdf as scalars; `u8` scalars are widened to a one-element array
/// since `flag_values` of byte variables is the only place they occur.
pub(crate) fn from_nc_attr(name: &str, value: AttributeValue) -> Option<AttrValue> {
    let converted = match value {
        AttributeValue::Str(s) => AttrValue::Str(s),
        AttributeValue::Strs(v) => AttrValue::Strs(v),
        AttributeValue::Double(v) => AttrValue::Double(v),
        AttributeValue::Doubles(v) => AttrValue::Doubles(v),
        AttributeValue::Float(v) => AttrValue::Float(v),
        AttributeValue::Floats(v) => AttrValue::Floats(v),
        AttributeValue::Int(v) => AttrValue::Int(v),
        AttributeValue::Ints(v) => AttrValue::Ints(v),
        AttributeValue::Uchar(v) => AttrValue::UBytes(vec![v]),
        AttributeValue::Uchars(v) => AttrValue::UBytes(v),
        AttributeValue::Short(v) => AttrValue::Int(i32::from(v)),
        AttributeValue::Shorts(v) => AttrValue::Ints(v.into_iter().map(i32::from).collect()),
        other => {
            debug!(attribute = name, value = ?other, "Skipping attribute of unsupported type");
            return None;
        }
    };
    Some(converted)
}
