//! On-disk representation of variables.
//!
//! An [`EncodingTable`] maps group path and variable name to a
//! [`VarEncoding`]. It is applied only when a tree is serialized; the
//! in-memory data is never modified by it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::dataset::{DataKind, ROOT_GROUP};
use crate::error::CfError;

/// Deflate level used whenever compression is requested.
pub const DEFAULT_DEFLATE_LEVEL: i32 = 4;

/// Element type written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Float64,
    Float32,
    UInt8,
    Int32,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Float64 => "float64",
            DType::Float32 => "float32",
            DType::UInt8 => "uint8",
            DType::Int32 => "int32",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float64 | DType::Float32)
    }

    /// On-disk type used when no encoding names one.
    pub fn native(kind: DataKind) -> Self {
        match kind {
            DataKind::Float64 | DataKind::Time => DType::Float64,
            DataKind::Float32 => DType::Float32,
            DataKind::UInt8 => DType::UInt8,
            DataKind::Int32 => DType::Int32,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `_FillValue` policy of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FillValue {
    /// NaN for float types, nothing for integer types.
    #[default]
    Default,
    /// No `_FillValue` attribute at all.
    None,
    Value(f64),
}

impl FillValue {
    /// Fill value to write for the given on-disk type, if any.
    pub fn resolve(&self, dtype: DType) -> Option<f64> {
        match self {
            FillValue::Default if dtype.is_float() => Some(f64::NAN),
            FillValue::Default | FillValue::None => None,
            FillValue::Value(v) => Some(*v),
        }
    }
}

/// Lossy quantization algorithm for `significant_digits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeMode {
    BitGroom,
}

impl QuantizeMode {
    /// Attribute netcdf-c records the number of significant digits under.
    pub fn nsd_attribute(&self) -> &'static str {
        match self {
            QuantizeMode::BitGroom => "_QuantizeBitGroomNumberOfSignificantDigits",
        }
    }
}

impl FromStr for QuantizeMode {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bitgroom" => Ok(QuantizeMode::BitGroom),
            _ => Err(CfError::UnsupportedQuantizeMode(s.to_string())),
        }
    }
}

/// Precision reduction applied before compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantization {
    /// Keep this many decimal digits of absolute precision.
    LeastSignificantDigit(u8),
    /// Keep this many significant decimal digits.
    SignificantDigits { digits: u8, mode: QuantizeMode },
}

/// Per-variable on-disk parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VarEncoding {
    pub dtype: Option<DType>,
    pub fill: FillValue,
    pub zlib: bool,
    pub quantization: Option<Quantization>,
    /// CF time units, only meaningful for time-valued variables.
    pub units: Option<String>,
    pub calendar: Option<String>,
}

impl VarEncoding {
    pub fn new(dtype: DType) -> Self {
        Self {
            dtype: Some(dtype),
            ..Self::default()
        }
    }

    pub fn no_fill(mut self) -> Self {
        self.fill = FillValue::None;
        self
    }

    pub fn fill_value(mut self, value: f64) -> Self {
        self.fill = FillValue::Value(value);
        self
    }

    pub fn zlib(mut self) -> Self {
        self.zlib = true;
        self
    }

    pub fn least_significant_digit(mut self, digits: u8) -> Self {
        self.quantization = Some(Quantization::LeastSignificantDigit(digits));
        self
    }

    pub fn significant_digits(mut self, digits: u8, mode: QuantizeMode) -> Self {
        self.quantization = Some(Quantization::SignificantDigits { digits, mode });
        self
    }

    pub fn time_units(mut self, units: impl Into<String>, calendar: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self.calendar = Some(calendar.into());
        self
    }
}

/// Encodings keyed by group path, then variable name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodingTable {
    groups: BTreeMap<String, BTreeMap<String, VarEncoding>>,
}

impl EncodingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: &str, variable: impl Into<String>, enc: VarEncoding) {
        self.groups
            .entry(group_key(group))
            .or_default()
            .insert(variable.into(), enc);
    }

    /// Builder-style insert.
    pub fn with(mut self, group: &str, variable: impl Into<String>, enc: VarEncoding) -> Self {
        self.insert(group, variable, enc);
        self
    }

    pub fn get(&self, group: &str, variable: &str) -> Option<&VarEncoding> {
        self.groups.get(&group_key(group))?.get(variable)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Every entry as `(group, variable, encoding)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &VarEncoding)> {
        self.groups.iter().flat_map(|(group, vars)| {
            vars.iter()
                .map(move |(name, enc)| (group.as_str(), name.as_str(), enc))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(BTreeMap::is_empty)
    }

    /// Copy a block of encodings into every group already in the table.
    ///
    /// Entries of `common` replace same-named entries of a group.
    pub fn merge_common(&mut self, common: &BTreeMap<String, VarEncoding>) {
        for vars in self.groups.values_mut() {
            for (name, enc) in common {
                vars.insert(name.clone(), enc.clone());
            }
        }
    }
}

/// Normalize to an absolute group path: `"clouds"` → `"/clouds"`, `""` → `"/"`.
fn group_key(group: &str) -> String {
    let trimmed = group.trim_matches('/');
    if trimmed.is_empty() {
        ROOT_GROUP.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
