//! Serialize a [`DataTree`] to a netCDF-4 file.
//!
//! Each group gets its own dimensions. Per-variable encodings decide the
//! on-disk type, fill value, compression, quantization and time units; a
//! variable without an entry is written in its native type with default fill.

use std::path::Path;

use cf_common::time::TimeUnits;
use cf_common::{
    Attributes, DType, DataKind, DataTree, Dataset, EncodingTable, Quantization,
    VarData, VarEncoding, Variable,
};
use cf_common::encoding::DEFAULT_DEFLATE_LEVEL;
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{silence_hdf5_errors, to_nc_attr};
use crate::quantize;

/// Time units used when a time variable has no encoding.
pub const FALLBACK_TIME_UNITS: &str = "days since 1970-01-01T00:00:00Z";
/// Calendar written when an encoding names units but no calendar.
pub const DEFAULT_CALENDAR: &str = "standard";

/// Values converted to their on-disk element type.
enum Encoded {
    F64(Vec<f64>),
    F32(Vec<f32>),
    U8(Vec<u8>),
    I32(Vec<i32>),
}

/// Everything needed to define and fill one variable.
struct Prepared {
    dims: Vec<String>,
    values: Encoded,
    fill: Option<f64>,
    zlib: bool,
    attrs: Attributes,
}

/// Write `tree` to `path`, replacing an existing file.
pub fn write_tree(
    tree: &DataTree,
    encoding: &EncodingTable,
    path: impl AsRef<Path>,
) -> NetCdfResult<()> {
    let path = path.as_ref();
    silence_hdf5_errors();

    if path.exists() {
        debug!(path = %path.display(), "Replacing existing file");
        std::fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = netcdf::create(path)?;
    {
        let mut root = file
            .root_mut()
            .ok_or_else(|| NetCdfError::InvalidFormat("file has no root group".to_string()))?;
        write_group(&mut root, "/", &tree.root, encoding)?;
    }
    for (name, ds) in tree.groups() {
        let mut group = file.add_group(name)?;
        write_group(&mut group, &format!("/{}", name), ds, encoding)?;
    }

    info!(
        path = %path.display(),
        groups = tree.groups().count(),
        "Wrote netCDF file"
    );
    Ok(())
}

fn write_group(
    group: &mut netcdf::GroupMut<'_>,
    path: &str,
    ds: &Dataset,
    encoding: &EncodingTable,
) -> NetCdfResult<()> {
    for (dim, size) in ds.dims() {
        group.add_dimension(&dim, size)?;
    }

    for (name, var) in ds.iter() {
        let prepared = prepare(path, name, var, ds, encoding)?;
        define_and_put(group, name, prepared)?;
    }

    for (name, value) in ds.attrs.iter() {
        group.add_attribute(name, to_nc_attr(value))?;
    }
    debug!(group = path, variables = ds.len(), "Wrote group");
    Ok(())
}

fn define_and_put(
    group: &mut netcdf::GroupMut<'_>,
    name: &str,
    prepared: Prepared,
) -> NetCdfResult<()> {
    let dims: Vec<&str> = prepared.dims.iter().map(String::as_str).collect();
    let compress = prepared.zlib && !dims.is_empty();

    let mut var = match &prepared.values {
        Encoded::F64(_) => group.add_variable::<f64>(name, &dims)?,
        Encoded::F32(_) => group.add_variable::<f32>(name, &dims)?,
        Encoded::U8(_) => group.add_variable::<u8>(name, &dims)?,
        Encoded::I32(_) => group.add_variable::<i32>(name, &dims)?,
    };
    if compress {
        var.set_compression(DEFAULT_DEFLATE_LEVEL, true)?;
    }
    if let Some(fill) = prepared.fill {
        match &prepared.values {
            Encoded::F64(_) => var.set_fill_value(fill)?,
            Encoded::F32(_) => var.set_fill_value(fill as f32)?,
            Encoded::U8(_) => var.set_fill_value(cast_fill::<u8>(name, fill, "uint8")?)?,
            Encoded::I32(_) => var.set_fill_value(cast_fill::<i32>(name, fill, "int32")?)?,
        }
    }
    for (attr, value) in prepared.attrs.iter() {
        var.put_attribute(attr, to_nc_attr(value))?;
    }
    match &prepared.values {
        Encoded::F64(v) => var.put_values(v, ..)?,
        Encoded::F32(v) => var.put_values(v, ..)?,
        Encoded::U8(v) => var.put_values(v, ..)?,
        Encoded::I32(v) => var.put_values(v, ..)?,
    }
    Ok(())
}

fn cast_fill<T: num_traits::NumCast>(variable: &str, fill: f64, dtype: &str) -> NetCdfResult<T> {
    num_traits::cast(fill).ok_or_else(|| NetCdfError::ValueOutOfRange {
        variable: variable.to_string(),
        value: fill,
        dtype: dtype.to_string(),
    })
}

/// Time units of a bounds variable: those of the variable whose `bounds`
/// attribute names it.
fn inherited_units(
    path: &str,
    name: &str,
    ds: &Dataset,
    encoding: &EncodingTable,
) -> Option<String> {
    ds.iter()
        .filter(|(_, parent)| parent.attrs.get_str("bounds") == Some(name))
        .find_map(|(parent, _)| encoding.get(path, parent)?.units.clone())
}

fn prepare(
    path: &str,
    name: &str,
    var: &Variable,
    ds: &Dataset,
    encoding: &EncodingTable,
) -> NetCdfResult<Prepared> {
    let enc = encoding.get(path, name).cloned().unwrap_or_else(VarEncoding::default);
    let dtype = enc.dtype.unwrap_or_else(|| DType::native(var.data.kind()));
    let fill = enc.fill.resolve(dtype);

    let mut attrs = var.attrs.clone();
    attrs.remove("_FillValue");

    let mut values: Vec<f64> = match &var.data {
        VarData::Time(times) => {
            let units = match enc.units.clone() {
                Some(units) => {
                    let calendar = enc
                        .calendar
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CALENDAR.to_string());
                    attrs.insert("units", units.as_str());
                    attrs.insert("calendar", calendar);
                    units
                }
                None => match inherited_units(path, name, ds, encoding) {
                    Some(units) => units,
                    None => {
                        attrs.insert("units", FALLBACK_TIME_UNITS);
                        attrs.insert("calendar", DEFAULT_CALENDAR);
                        FALLBACK_TIME_UNITS.to_string()
                    }
                },
            };
            let units = TimeUnits::parse(&units)?;
            times.iter().map(|t| units.encode(t)).collect()
        }
        VarData::Float64(a) => a.iter().copied().collect(),
        VarData::Float32(a) => a.iter().map(|&v| f64::from(v)).collect(),
        VarData::UInt8(a) => a.iter().map(|&v| f64::from(v)).collect(),
        VarData::Int32(a) => a.iter().map(|&v| f64::from(v)).collect(),
    };

    let mut bitgroom = None;
    if let Some(q) = enc.quantization {
        if !dtype.is_float() || var.data.kind() == DataKind::Time {
            return Err(NetCdfError::UnsupportedType {
                variable: name.to_string(),
                found: format!("quantization of {} data stored as {}", kind_name(var), dtype),
            });
        }
        match q {
            Quantization::LeastSignificantDigit(digits) => {
                quantize::least_significant_digit(&mut values, digits);
                attrs.insert("least_significant_digit", i32::from(digits));
            }
            Quantization::SignificantDigits { digits, mode } => {
                attrs.insert(mode.nsd_attribute(), i32::from(digits));
                bitgroom = Some(digits);
            }
        }
    }

    let values = match dtype {
        DType::Float64 => {
            if let Some(nsd) = bitgroom {
                quantize::bitgroom_f64(&mut values, nsd);
            }
            Encoded::F64(values)
        }
        DType::Float32 => {
            let mut narrow: Vec<f32> = values.iter().map(|&v| v as f32).collect();
            if let Some(nsd) = bitgroom {
                quantize::bitgroom_f32(&mut narrow, nsd);
            }
            Encoded::F32(narrow)
        }
        DType::UInt8 => Encoded::U8(to_integer(name, &values, fill, dtype)?),
        DType::Int32 => Encoded::I32(to_integer(name, &values, fill, dtype)?),
    };

    Ok(Prepared {
        dims: var.dims.clone(),
        values,
        fill,
        zlib: enc.zlib,
        attrs,
    })
}

fn kind_name(var: &Variable) -> &'static str {
    match var.data.kind() {
        DataKind::Float64 => "float64",
        DataKind::Float32 => "float32",
        DataKind::UInt8 => "uint8",
        DataKind::Int32 => "int32",
        DataKind::Time => "time",
    }
}

/// Cast to an integer type; NaN becomes the fill value, which must exist.
fn to_integer<T: num_traits::NumCast>(
    name: &str,
    values: &[f64],
    fill: Option<f64>,
    dtype: DType,
) -> NetCdfResult<Vec<T>> {
    let out_of_range = |value: f64| NetCdfError::ValueOutOfRange {
        variable: name.to_string(),
        value,
        dtype: dtype.to_string(),
    };
    values
        .iter()
        .map(|&v| {
            let v = if v.is_nan() { fill.ok_or_else(|| out_of_range(v))? } else { v };
            num_traits::cast(v).ok_or_else(|| out_of_range(v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_common::{AttrValue, QuantizeMode};
    use ndarray::{arr1, ArrayD, IxDyn};

    fn field(values: Vec<f64>) -> Variable {
        let n = values.len();
        Variable::new(
            &["x"],
            VarData::Float64(ArrayD::from_shape_vec(IxDyn(&[n]), values).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_integer_cast_uses_fill_for_nan() {
        let out: Vec<u8> = to_integer("q", &[1.0, f64::NAN], Some(255.0), DType::UInt8).unwrap();
        assert_eq!(out, vec![1, 255]);
        assert!(to_integer::<u8>("q", &[f64::NAN], None, DType::UInt8).is_err());
        assert!(to_integer::<u8>("q", &[300.0], None, DType::UInt8).is_err());
    }

    #[test]
    fn test_prepare_lsd_adds_attribute() {
        let mut ds = Dataset::new();
        ds.insert("cfc", field(vec![12.3456, f64::NAN])).unwrap();
        let table = EncodingTable::new().with(
            "/",
            "cfc",
            VarEncoding::new(DType::Float32).least_significant_digit(2).zlib(),
        );
        let prepared = prepare("/", "cfc", ds.get("cfc").unwrap(), &ds, &table).unwrap();
        assert_eq!(
            prepared.attrs.get("least_significant_digit"),
            Some(&AttrValue::Int(2))
        );
        assert!(prepared.fill.unwrap().is_nan());
        match prepared.values {
            Encoded::F32(v) => {
                assert_eq!(v[0], (1580.0f64 / 128.0) as f32);
                assert!(v[1].is_nan());
            }
            _ => panic!("expected float32"),
        }
    }

    #[test]
    fn test_prepare_bitgroom_records_significant_digits() {
        let mut ds = Dataset::new();
        ds.insert("sis", field(vec![0.3, 0.7])).unwrap();
        let table = EncodingTable::new().with(
            "/",
            "sis",
            VarEncoding::new(DType::Float32).significant_digits(2, QuantizeMode::BitGroom),
        );
        let prepared = prepare("/", "sis", ds.get("sis").unwrap(), &ds, &table).unwrap();
        let names: Vec<_> = prepared.attrs.names().collect();
        assert_eq!(names, vec!["_QuantizeBitGroomNumberOfSignificantDigits"]);
        assert_eq!(
            prepared.attrs.get("_QuantizeBitGroomNumberOfSignificantDigits"),
            Some(&AttrValue::Int(2))
        );
        match prepared.values {
            Encoded::F32(v) => assert_eq!(v[0].to_bits() & 0x7fff, 0),
            _ => panic!("expected float32"),
        }
    }

    #[test]
    fn test_prepare_rejects_quantized_integers() {
        let mut ds = Dataset::new();
        ds.insert("nobs", field(vec![1.0])).unwrap();
        let table = EncodingTable::new().with(
            "/",
            "nobs",
            VarEncoding::new(DType::UInt8).least_significant_digit(1),
        );
        assert!(matches!(
            prepare("/", "nobs", ds.get("nobs").unwrap(), &ds, &table),
            Err(NetCdfError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_bounds_inherit_parent_units() {
        use chrono::{TimeZone, Utc};
        let t = Utc.with_ymd_and_hms(2000, 1, 3, 0, 0, 0).unwrap();
        let mut ds = Dataset::new();
        ds.insert(
            "time",
            Variable::new(&["time"], VarData::Time(arr1(&[t]).into_dyn()))
                .unwrap()
                .with_attrs(Attributes::new().with("bounds", "time_bounds")),
        )
        .unwrap();
        ds.insert(
            "time_bounds",
            Variable::new(
                &["time", "bounds"],
                VarData::Time(ArrayD::from_elem(IxDyn(&[1, 2]), t)),
            )
            .unwrap(),
        )
        .unwrap();
        let table = EncodingTable::new().with(
            "/",
            "time",
            VarEncoding::new(DType::Float64)
                .no_fill()
                .time_units("days since 2000-01-01T00:00:00Z", "standard"),
        );

        let time = prepare("/", "time", ds.get("time").unwrap(), &ds, &table).unwrap();
        assert_eq!(time.attrs.get_str("calendar"), Some("standard"));
        assert_eq!(time.fill, None);

        let bounds = prepare("/", "time_bounds", ds.get("time_bounds").unwrap(), &ds, &table).unwrap();
        assert!(!bounds.attrs.contains("units"));
        match bounds.values {
            Encoded::F64(v) => assert_eq!(v, vec![2.0, 2.0]),
            _ => panic!("expected float64"),
        }
    }
}
