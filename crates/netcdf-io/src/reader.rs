//! Load a netCDF-4 file back into a [`DataTree`].
//!
//! Time variables (a `units` attribute of the form `<unit> since <epoch>`)
//! are decoded to timestamps, and so are their bounds. Fill values become
//! NaN in float data. What was decoded is recorded in an [`EncodingTable`]
//! so the tree can be written again the way it was stored.

use std::path::Path;

use cf_common::time::TimeUnits;
use cf_common::{
    Attributes, DType, DataTree, Dataset, EncodingTable, FillValue, VarData, VarEncoding, Variable,
};
use chrono::{DateTime, Utc};
use ndarray::{ArrayD, IxDyn};
use netcdf::types::{FloatType, IntType, NcVariableType};
use tracing::{debug, info, warn};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{from_nc_attr, get_f64_attr, silence_hdf5_errors};

/// A tree read from disk together with the encoding it was stored with.
#[derive(Debug, Clone)]
pub struct LoadedTree {
    pub tree: DataTree,
    pub encoding: EncodingTable,
}

/// Read every group of a file.
///
/// Only groups directly below the root are loaded; deeper groups are
/// skipped with a warning.
pub fn read_tree(path: impl AsRef<Path>) -> NetCdfResult<LoadedTree> {
    let path = path.as_ref();
    silence_hdf5_errors();

    let file = netcdf::open(path)?;
    let mut encoding = EncodingTable::new();

    let root = read_dataset(file.variables(), file.attributes(), "/", &mut encoding)?;
    let mut tree = DataTree::new(root);
    for group in file.groups()? {
        let name = group.name();
        if group.groups().next().is_some() {
            warn!(group = %name, "Skipping nested groups");
        }
        let ds = read_dataset(
            group.variables(),
            group.attributes(),
            &format!("/{}", name),
            &mut encoding,
        )?;
        tree.insert_group(&name, ds);
    }

    info!(
        path = %path.display(),
        groups = tree.groups().count(),
        "Read netCDF file"
    );
    Ok(LoadedTree { tree, encoding })
}

/// Stored values of one variable before time decoding.
struct Raw {
    name: String,
    dims: Vec<String>,
    data: VarData,
    attrs: Attributes,
    enc: VarEncoding,
}

fn read_dataset<'f>(
    variables: impl Iterator<Item = netcdf::Variable<'f>>,
    attributes: impl Iterator<Item = netcdf::Attribute<'f>>,
    path: &str,
    encoding: &mut EncodingTable,
) -> NetCdfResult<Dataset> {
    let mut raws = Vec::new();
    for var in variables {
        raws.push(read_variable(&var)?);
    }

    // Time coordinates first, then the bounds they name.
    let mut bounds_units = Vec::new();
    for raw in raws.iter_mut() {
        let Some(units) = raw.attrs.get_str("units").filter(|u| u.contains(" since ")) else {
            continue;
        };
        let units = TimeUnits::parse(units)?;
        decode_time(raw, &units)?;
        raw.enc.units = Some(units.as_str().to_string());
        raw.enc.calendar = raw
            .attrs
            .remove("calendar")
            .and_then(|c| c.as_str().map(str::to_string));
        raw.attrs.remove("units");
        if let Some(bounds) = raw.attrs.get_str("bounds") {
            bounds_units.push((bounds.to_string(), units));
        }
    }
    for (bounds, units) in bounds_units {
        if let Some(raw) = raws.iter_mut().find(|r| r.name == bounds) {
            if !matches!(raw.data, VarData::Time(_)) {
                decode_time(raw, &units)?;
            }
        }
    }

    let mut ds = Dataset::new();
    for attr in attributes {
        let name = attr.name().to_string();
        if let Some(value) = from_nc_attr(&name, attr.value()?) {
            ds.attrs.insert(name, value);
        }
    }
    for raw in raws {
        encoding.insert(path, raw.name.as_str(), raw.enc);
        let dims: Vec<&str> = raw.dims.iter().map(String::as_str).collect();
        let var = Variable::new(&dims, raw.data)?.with_attrs(raw.attrs);
        ds.insert(raw.name, var)?;
    }
    debug!(group = path, variables = ds.len(), "Read group");
    Ok(ds)
}

fn dtype_of(var: &netcdf::Variable) -> NetCdfResult<DType> {
    match var.vartype() {
        NcVariableType::Float(FloatType::F64) => Ok(DType::Float64),
        NcVariableType::Float(FloatType::F32) => Ok(DType::Float32),
        NcVariableType::Int(IntType::U8) => Ok(DType::UInt8),
        NcVariableType::Int(IntType::I32) => Ok(DType::Int32),
        other => Err(NetCdfError::UnsupportedType {
            variable: var.name(),
            found: format!("{:?}", other),
        }),
    }
}

fn shaped<T>(name: &str, shape: &[usize], values: Vec<T>) -> NetCdfResult<ArrayD<T>> {
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|e| {
        NetCdfError::InvalidFormat(format!("variable '{}' has an unexpected size: {}", name, e))
    })
}

fn read_variable(var: &netcdf::Variable) -> NetCdfResult<Raw> {
    let name = var.name();
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let dtype = dtype_of(var)?;
    let fill = get_f64_attr(var, "_FillValue");

    let mut attrs = Attributes::new();
    for attr in var.attributes() {
        let attr_name = attr.name().to_string();
        if attr_name == "_FillValue" {
            continue;
        }
        if let Some(value) = from_nc_attr(&attr_name, attr.value()?) {
            attrs.insert(attr_name, value);
        }
    }

    let masked = |v: f64| match fill {
        Some(f) if !f.is_nan() && v == f => f64::NAN,
        _ => v,
    };
    let data = match dtype {
        DType::Float64 => {
            let values: Vec<f64> = var.get_values::<f64, _>(..)?;
            VarData::Float64(shaped(&name, &shape, values.into_iter().map(masked).collect())?)
        }
        DType::Float32 => {
            let values: Vec<f32> = var.get_values::<f32, _>(..)?;
            let values = values
                .into_iter()
                .map(|v| masked(f64::from(v)) as f32)
                .collect();
            VarData::Float32(shaped(&name, &shape, values)?)
        }
        DType::UInt8 => VarData::UInt8(shaped(&name, &shape, var.get_values::<u8, _>(..)?)?),
        DType::Int32 => VarData::Int32(shaped(&name, &shape, var.get_values::<i32, _>(..)?)?),
    };

    let enc = VarEncoding {
        dtype: Some(dtype),
        fill: match fill {
            None => FillValue::None,
            Some(f) if f.is_nan() => FillValue::Default,
            Some(f) => FillValue::Value(f),
        },
        ..VarEncoding::default()
    };

    Ok(Raw {
        name,
        dims,
        data,
        attrs,
        enc,
    })
}

fn decode_time(raw: &mut Raw, units: &TimeUnits) -> NetCdfResult<()> {
    let offsets: Vec<f64> = match &raw.data {
        VarData::Float64(a) => a.iter().copied().collect(),
        VarData::Float32(a) => a.iter().map(|&v| f64::from(v)).collect(),
        VarData::Int32(a) => a.iter().map(|&v| f64::from(v)).collect(),
        VarData::UInt8(_) | VarData::Time(_) => {
            return Err(NetCdfError::UnsupportedType {
                variable: raw.name.clone(),
                found: "time units on non-numeric data".to_string(),
            })
        }
    };
    let times = offsets
        .into_iter()
        .map(|v| units.decode(v))
        .collect::<Result<Vec<DateTime<Utc>>, _>>()?;
    let shape = raw.data.shape().to_vec();
    raw.data = VarData::Time(shaped(&raw.name, &shape, times)?);
    Ok(())
}
