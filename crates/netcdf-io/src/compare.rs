//! Compare a generated tree with a stored reference.
//!
//! Data must agree within `|a - b| <= atol + rtol * |b|` (NaN matches NaN,
//! timestamps exactly). Attributes must be identical everywhere except for
//! `date_created`, which changes on every run.

use std::collections::BTreeSet;

use cf_common::{AttrValue, Attributes, DataTree, Dataset, VarData, Variable};
use thiserror::Error;

/// Attributes allowed to differ between runs.
pub const VOLATILE_ATTRS: [&str; 1] = ["date_created"];

/// The first difference found between two trees.
#[derive(Debug, Error, PartialEq)]
pub enum CompareError {
    #[error("group '{group}' exists only in the {side} file")]
    GroupMissing { group: String, side: &'static str },

    #[error("{group}: variable '{variable}' exists only in the {side} file")]
    VariableMissing {
        group: String,
        variable: String,
        side: &'static str,
    },

    #[error("{group}/{variable}: dimensions {test:?} differ from reference {reference:?}")]
    DimensionsDiffer {
        group: String,
        variable: String,
        test: Vec<(String, usize)>,
        reference: Vec<(String, usize)>,
    },

    #[error("{group}/{variable}: timestamps cannot be compared with numbers")]
    KindMismatch { group: String, variable: String },

    #[error("{group}/{variable}: {count} values differ, first at flat index {index}: {test} vs reference {reference}")]
    ValuesDiffer {
        group: String,
        variable: String,
        count: usize,
        index: usize,
        test: String,
        reference: String,
    },

    #[error("{location}: attribute '{attribute}' is {test} but reference has {reference}")]
    AttributeDiffers {
        location: String,
        attribute: String,
        test: String,
        reference: String,
    },
}

/// Numerical tolerance of the data comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

impl Tolerance {
    pub fn close(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        a == b || (a - b).abs() <= self.atol + self.rtol * b.abs()
    }
}

/// Compare `test` against `reference` with the default tolerance.
pub fn assert_trees_match(test: &DataTree, reference: &DataTree) -> Result<(), CompareError> {
    compare_trees(test, reference, Tolerance::default())
}

pub fn compare_trees(
    test: &DataTree,
    reference: &DataTree,
    tol: Tolerance,
) -> Result<(), CompareError> {
    let test_groups: BTreeSet<String> = test.walk().map(|(p, _)| p).collect();
    let ref_groups: BTreeSet<String> = reference.walk().map(|(p, _)| p).collect();
    if let Some(group) = test_groups.difference(&ref_groups).next() {
        return Err(CompareError::GroupMissing {
            group: group.clone(),
            side: "generated",
        });
    }
    if let Some(group) = ref_groups.difference(&test_groups).next() {
        return Err(CompareError::GroupMissing {
            group: group.clone(),
            side: "reference",
        });
    }

    for (path, ds) in test.walk() {
        if let Some(other) = reference.group(&path) {
            compare_datasets(&path, ds, other, tol)?;
        }
    }
    Ok(())
}

fn compare_datasets(
    group: &str,
    test: &Dataset,
    reference: &Dataset,
    tol: Tolerance,
) -> Result<(), CompareError> {
    compare_attrs(group, &test.attrs, &reference.attrs)?;

    for name in test.names() {
        if !reference.contains(name) {
            return Err(CompareError::VariableMissing {
                group: group.to_string(),
                variable: name.to_string(),
                side: "generated",
            });
        }
    }
    for (name, ref_var) in reference.iter() {
        let Some(test_var) = test.get(name) else {
            return Err(CompareError::VariableMissing {
                group: group.to_string(),
                variable: name.to_string(),
                side: "reference",
            });
        };
        compare_variables(group, name, test_var, ref_var, tol)?;
    }
    Ok(())
}

fn dims_of(var: &Variable) -> Vec<(String, usize)> {
    var.dims.iter().cloned().zip(var.shape().iter().copied()).collect()
}

fn as_f64(data: &VarData) -> Option<Vec<f64>> {
    match data {
        VarData::Float64(a) => Some(a.iter().copied().collect()),
        VarData::Float32(a) => Some(a.iter().map(|&v| f64::from(v)).collect()),
        VarData::UInt8(a) => Some(a.iter().map(|&v| f64::from(v)).collect()),
        VarData::Int32(a) => Some(a.iter().map(|&v| f64::from(v)).collect()),
        VarData::Time(_) => None,
    }
}

fn compare_variables(
    group: &str,
    name: &str,
    test: &Variable,
    reference: &Variable,
    tol: Tolerance,
) -> Result<(), CompareError> {
    let location = format!("{}/{}", group.trim_end_matches('/'), name);
    compare_attrs(&location, &test.attrs, &reference.attrs)?;

    if dims_of(test) != dims_of(reference) {
        return Err(CompareError::DimensionsDiffer {
            group: group.to_string(),
            variable: name.to_string(),
            test: dims_of(test),
            reference: dims_of(reference),
        });
    }

    let differ = |count: usize, index: usize, test: String, reference: String| {
        CompareError::ValuesDiffer {
            group: group.to_string(),
            variable: name.to_string(),
            count,
            index,
            test,
            reference,
        }
    };

    match (&test.data, &reference.data) {
        (VarData::Time(a), VarData::Time(b)) => {
            let mut bad = a.iter().zip(b.iter()).enumerate().filter(|(_, (x, y))| x != y);
            if let Some((i, (x, y))) = bad.next() {
                let count = 1 + bad.count();
                return Err(differ(count, i, x.to_rfc3339(), y.to_rfc3339()));
            }
        }
        (a, b) => {
            let (Some(a), Some(b)) = (as_f64(a), as_f64(b)) else {
                return Err(CompareError::KindMismatch {
                    group: group.to_string(),
                    variable: name.to_string(),
                });
            };
            let mut bad = a
                .iter()
                .zip(&b)
                .enumerate()
                .filter(|(_, (x, y))| !tol.close(**x, **y));
            if let Some((i, (x, y))) = bad.next() {
                let count = 1 + bad.count();
                return Err(differ(count, i, x.to_string(), y.to_string()));
            }
        }
    }
    Ok(())
}

fn compare_attrs(
    location: &str,
    test: &Attributes,
    reference: &Attributes,
) -> Result<(), CompareError> {
    let names: BTreeSet<&str> = test
        .names()
        .chain(reference.names())
        .filter(|n| !VOLATILE_ATTRS.contains(n))
        .collect();
    for name in names {
        let same = match (test.get(name), reference.get(name)) {
            (Some(a), Some(b)) => a.identical(b),
            _ => false,
        };
        if !same {
            let show = |v: Option<&AttrValue>| {
                v.map_or_else(|| "missing".to_string(), |v| v.to_string())
            };
            return Err(CompareError::AttributeDiffers {
                location: location.to_string(),
                attribute: name.to_string(),
                test: show(test.get(name)),
                reference: show(reference.get(name)),
            });
        }
    }
    Ok(())
}
