//! In-memory labeled arrays: variables, datasets and group trees.
//!
//! This is the hand-off format between the generator and the netCDF layer.
//! Variables own their data as `ndarray` buffers; datasets and trees keep
//! insertion order so output files are reproducible.

use chrono::{DateTime, Utc};
use ndarray::ArrayD;

use crate::attrs::Attributes;
use crate::error::{CfError, CfResult};

/// Path of the root group in a [`DataTree`].
pub const ROOT_GROUP: &str = "/";

/// Element type of a variable's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Float64,
    Float32,
    UInt8,
    Int32,
    Time,
}

/// Owned N-dimensional data of a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VarData {
    Float64(ArrayD<f64>),
    Float32(ArrayD<f32>),
    UInt8(ArrayD<u8>),
    Int32(ArrayD<i32>),
    Time(ArrayD<DateTime<Utc>>),
}

impl VarData {
    pub fn shape(&self) -> &[usize] {
        match self {
            VarData::Float64(a) => a.shape(),
            VarData::Float32(a) => a.shape(),
            VarData::UInt8(a) => a.shape(),
            VarData::Int32(a) => a.shape(),
            VarData::Time(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> DataKind {
        match self {
            VarData::Float64(_) => DataKind::Float64,
            VarData::Float32(_) => DataKind::Float32,
            VarData::UInt8(_) => DataKind::UInt8,
            VarData::Int32(_) => DataKind::Int32,
            VarData::Time(_) => DataKind::Time,
        }
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            VarData::Float64(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<&ArrayD<u8>> {
        match self {
            VarData::UInt8(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&ArrayD<DateTime<Utc>>> {
        match self {
            VarData::Time(a) => Some(a),
            _ => None,
        }
    }
}

/// A named-dimension array with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub dims: Vec<String>,
    pub data: VarData,
    pub attrs: Attributes,
}

impl Variable {
    /// Create a variable, checking that every data axis has a dimension name.
    pub fn new(dims: &[&str], data: VarData) -> CfResult<Self> {
        if dims.len() != data.ndim() {
            return Err(CfError::DimensionCountMismatch {
                variable: String::new(),
                data_dims: data.ndim(),
                named: dims.len(),
            });
        }
        Ok(Self {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data,
            attrs: Attributes::new(),
        })
    }

    /// Builder-style attribute replacement.
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// A named bundle of variables sharing dimensions, plus group attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    variables: Vec<(String, Variable)>,
    pub attrs: Attributes,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dataset without variables, carrying only attributes.
    pub fn with_attrs(attrs: Attributes) -> Self {
        Self {
            variables: Vec::new(),
            attrs,
        }
    }

    /// Insert or replace a variable; a replaced variable keeps its position.
    ///
    /// Fails when the variable's dimension sizes disagree with variables
    /// already in the dataset.
    pub fn insert(&mut self, name: impl Into<String>, var: Variable) -> CfResult<()> {
        let name = name.into();
        for (dim, size) in var.dims.iter().zip(var.shape()) {
            if let Some(existing) = self.dim_size_excluding(dim, &name) {
                if existing != *size {
                    return Err(CfError::ConflictingDimension {
                        dim: dim.clone(),
                        first: existing,
                        second: *size,
                    });
                }
            }
        }

        match self.variables.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = var,
            None => self.variables.push((name, var)),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        let idx = self.variables.iter().position(|(n, _)| n == name)?;
        Some(self.variables.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Dimensions in first-use order with their sizes.
    pub fn dims(&self) -> Vec<(String, usize)> {
        let mut dims: Vec<(String, usize)> = Vec::new();
        for (_, var) in &self.variables {
            for (dim, size) in var.dims.iter().zip(var.shape()) {
                if !dims.iter().any(|(d, _)| d == dim) {
                    dims.push((dim.clone(), *size));
                }
            }
        }
        dims
    }

    pub fn dim_size(&self, dim: &str) -> Option<usize> {
        self.dim_size_excluding(dim, "")
    }

    fn dim_size_excluding(&self, dim: &str, skip: &str) -> Option<usize> {
        self.variables
            .iter()
            .filter(|(n, _)| n != skip)
            .find_map(|(_, var)| {
                var.dims
                    .iter()
                    .position(|d| d == dim)
                    .map(|i| var.shape()[i])
            })
    }

    /// Merge another dataset's variables into this one.
    ///
    /// Variables already present are kept; attributes of `self` win.
    pub fn merge(mut self, other: &Dataset) -> CfResult<Self> {
        for (name, var) in other.iter() {
            if !self.contains(name) {
                self.insert(name, var.clone())?;
            }
        }
        Ok(self)
    }
}

/// A root dataset plus named child groups.
///
/// Groups are kept flat (one level below the root), which is all the
/// CM SAF layout needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTree {
    pub root: Dataset,
    groups: Vec<(String, Dataset)>,
}

impl DataTree {
    pub fn new(root: Dataset) -> Self {
        Self {
            root,
            groups: Vec::new(),
        }
    }

    /// Add or replace a child group. Leading slashes are stripped, so both
    /// `"/clouds"` and `"clouds"` name the same group.
    pub fn insert_group(&mut self, name: &str, dataset: Dataset) {
        let name = normalize_group_name(name).to_string();
        match self.groups.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = dataset,
            None => self.groups.push((name, dataset)),
        }
    }

    /// Look up a group by path; `"/"` is the root.
    pub fn group(&self, name: &str) -> Option<&Dataset> {
        let name = normalize_group_name(name);
        if name.is_empty() {
            return Some(&self.root);
        }
        self.groups.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Dataset> {
        let name = normalize_group_name(name);
        if name.is_empty() {
            return Some(&mut self.root);
        }
        self.groups
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    /// Child groups in insertion order (root excluded).
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.groups.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(n, _)| n.as_str())
    }

    /// Root followed by every child group, each with its full path.
    pub fn walk(&self) -> impl Iterator<Item = (String, &Dataset)> {
        std::iter::once((ROOT_GROUP.to_string(), &self.root))
            .chain(self.groups.iter().map(|(n, d)| (format!("/{}", n), d)))
    }
}

fn normalize_group_name(name: &str) -> &str {
    name.trim_start_matches('/')
}
