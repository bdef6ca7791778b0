//! Flatten a grouped tree into a single root namespace.
//!
//! A child group `/g` contributes dimensions `g__<dim>`, variables
//! `g__<var>` and root attributes `g__<attr>`. Attributes that name other
//! variables are rewritten to the flattened names. The mapping from new to
//! old names is recorded in reserved `__flattener_name_mapping_*` root
//! attributes, which [`strip_flattener_attrs`] removes again.

use std::collections::HashSet;

use cf_common::{AttrValue, Attributes, DataTree, Dataset, EncodingTable, Variable, ROOT_GROUP};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};

/// Name prefix reserved for the flattener's own attributes.
pub const FLATTENER_ATTR_PREFIX: &str = "__flattener";

/// Separator between group and original name.
pub const GROUP_SEPARATOR: &str = "__";

const MAPPING_VARIABLES: &str = "__flattener_name_mapping_variables";
const MAPPING_DIMENSIONS: &str = "__flattener_name_mapping_dimensions";
const MAPPING_ATTRIBUTES: &str = "__flattener_name_mapping_attributes";

/// Attributes whose value is a blank-separated list of variable names.
const REFERENCE_ATTRS: [&str; 6] = [
    "ancillary_variables",
    "bounds",
    "climatology",
    "coordinates",
    "grid_mapping",
    "quantization",
];

fn flat_name(group: &str, name: &str) -> String {
    format!("{}{}{}", group, GROUP_SEPARATOR, name)
}

/// Rewrite names in a reference list; names not found in the group are kept.
fn rewrite_references(value: &str, group: &str, ds: &Dataset) -> String {
    value
        .split_whitespace()
        .map(|token| {
            if ds.contains(token) {
                flat_name(group, token)
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn flat_variable(group: &str, ds: &Dataset, var: &Variable) -> NetCdfResult<Variable> {
    let dims: Vec<String> = var.dims.iter().map(|d| flat_name(group, d)).collect();
    let dims: Vec<&str> = dims.iter().map(String::as_str).collect();
    let mut attrs = Attributes::new();
    for (name, value) in var.attrs.iter() {
        let value = match value.as_str() {
            Some(refs) if REFERENCE_ATTRS.contains(&name) => {
                AttrValue::Str(rewrite_references(refs, group, ds))
            }
            _ => value.clone(),
        };
        attrs.insert(name, value);
    }
    Ok(Variable::new(&dims, var.data.clone())?.with_attrs(attrs))
}

/// Flatten every child group of `tree` into its root.
///
/// Fails when a flattened name collides with an existing root name.
pub fn flatten_tree(tree: &DataTree) -> NetCdfResult<DataTree> {
    let mut flat = tree.root.clone();
    let mut var_map = Vec::new();
    let mut dim_map = Vec::new();
    let mut attr_map = Vec::new();
    let mut dims_seen: HashSet<String> = flat.dims().into_iter().map(|(d, _)| d).collect();

    for (group, ds) in tree.groups() {
        for (dim, _) in ds.dims() {
            let new = flat_name(group, &dim);
            if !dims_seen.insert(new.clone()) {
                return Err(NetCdfError::NameCollision(new));
            }
            dim_map.push(format!("{}: /{}/{}", new, group, dim));
        }
        for (name, var) in ds.iter() {
            let new = flat_name(group, name);
            if flat.contains(&new) {
                return Err(NetCdfError::NameCollision(new));
            }
            flat.insert(new.clone(), flat_variable(group, ds, var)?)?;
            var_map.push(format!("{}: /{}/{}", new, group, name));
        }
        for (name, value) in ds.attrs.iter() {
            let new = flat_name(group, name);
            if flat.attrs.contains(&new) {
                return Err(NetCdfError::NameCollision(new));
            }
            flat.attrs.insert(new.clone(), value.clone());
            attr_map.push(format!("{}: /{}/{}", new, group, name));
        }
        debug!(group, variables = ds.len(), "Flattened group");
    }

    for (key, entries) in [
        (MAPPING_VARIABLES, var_map),
        (MAPPING_DIMENSIONS, dim_map),
        (MAPPING_ATTRIBUTES, attr_map),
    ] {
        if !entries.is_empty() {
            flat.attrs.insert(key, AttrValue::Strs(entries));
        }
    }
    Ok(DataTree::new(flat))
}

/// Move every encoding to the root under its flattened name.
///
/// Quantization is dropped: the stored values are already quantized and
/// keep their significant-digit attributes.
pub fn flatten_encoding(encoding: &EncodingTable) -> EncodingTable {
    let mut flat = EncodingTable::new();
    for (group, name, enc) in encoding.iter() {
        let mut enc = enc.clone();
        enc.quantization = None;
        let group = group.trim_start_matches('/');
        let new = if group.is_empty() {
            name.to_string()
        } else {
            flat_name(group, name)
        };
        flat.insert(ROOT_GROUP, new, enc);
    }
    flat
}

/// Remove every attribute reserved by the flattener, on the root, on each
/// group and on each variable. Returns how many were removed.
pub fn strip_flattener_attrs(tree: &mut DataTree) -> usize {
    fn strip(attrs: &mut Attributes) -> usize {
        let before = attrs.len();
        attrs.retain(|name, _| !name.starts_with(FLATTENER_ATTR_PREFIX));
        before - attrs.len()
    }

    let paths: Vec<String> = tree.walk().map(|(path, _)| path).collect();
    let mut removed = 0;
    for path in paths {
        let Some(ds) = tree.group_mut(&path) else {
            continue;
        };
        removed += strip(&mut ds.attrs);
        let names: Vec<String> = ds.names().map(str::to_string).collect();
        for name in names {
            if let Some(var) = ds.get_mut(&name) {
                removed += strip(&mut var.attrs);
            }
        }
    }
    removed
}

/// Whether any flattener attribute is left anywhere in the tree.
pub fn has_flattener_attrs(tree: &DataTree) -> bool {
    tree.walk().any(|(_, ds)| {
        ds.attrs.names().any(|n| n.starts_with(FLATTENER_ATTR_PREFIX))
            || ds
                .iter()
                .any(|(_, var)| var.attrs.names().any(|n| n.starts_with(FLATTENER_ATTR_PREFIX)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_common::{DType, VarEncoding};
    use test_utils::two_group_tree;

    #[test]
    fn test_flatten_prefixes_names() {
        let flat = flatten_tree(&two_group_tree()).unwrap();
        assert_eq!(flat.groups().count(), 0);
        let names: Vec<_> = flat.root.names().collect();
        assert!(names.contains(&"alpha__value"));
        assert!(names.contains(&"beta__time_bounds"));
        assert_eq!(flat.root.dim_size("alpha__lat"), Some(4));
        assert_eq!(flat.root.attrs.get_str("beta__title"), Some("Beta"));
        assert_eq!(flat.root.attrs.get_str("title"), Some("Two group test tree"));
    }

    #[test]
    fn test_flatten_rewrites_references() {
        let flat = flatten_tree(&two_group_tree()).unwrap();
        let value = flat.root.get("alpha__value").unwrap();
        assert_eq!(value.attrs.get_str("ancillary_variables"), Some("alpha__flag"));
        assert_eq!(value.attrs.get_str("grid_mapping"), Some("alpha__crs"));
        assert_eq!(value.attrs.get_str("long_name"), Some("Ramp"));
        let time = flat.root.get("beta__time").unwrap();
        assert_eq!(time.attrs.get_str("bounds"), Some("beta__time_bounds"));
        assert_eq!(time.dims, vec!["beta__time"]);
    }

    #[test]
    fn test_mapping_attrs_are_stripped() {
        let mut flat = flatten_tree(&two_group_tree()).unwrap();
        let mapping = flat.root.attrs.get(MAPPING_VARIABLES).unwrap();
        match mapping {
            AttrValue::Strs(entries) => assert!(entries.contains(&"alpha__value: /alpha/value".to_string())),
            other => panic!("unexpected mapping {}", other),
        }
        assert!(has_flattener_attrs(&flat));
        assert_eq!(strip_flattener_attrs(&mut flat), 3);
        assert!(!has_flattener_attrs(&flat));
    }

    #[test]
    fn test_reflatten_keeps_earlier_mapping() {
        let tree = flatten_tree(&two_group_tree()).unwrap();
        let mut again = flatten_tree(&tree).unwrap();
        assert_eq!(strip_flattener_attrs(&mut again), 3);
    }

    #[test]
    fn test_collision_is_an_error() {
        let mut tree = two_group_tree();
        let alpha = tree.group("alpha").unwrap().clone();
        let clash = alpha.get("value").unwrap().clone();
        tree.root.insert("alpha__value", clash).unwrap();
        assert!(matches!(
            flatten_tree(&tree),
            Err(NetCdfError::NameCollision(name)) if name == "alpha__value"
        ));
    }

    #[test]
    fn test_flatten_encoding() {
        let table = EncodingTable::new()
            .with("/clouds", "cfc", VarEncoding::new(DType::Float32).least_significant_digit(2))
            .with("/", "crs", VarEncoding::new(DType::Int32));
        let flat = flatten_encoding(&table);
        assert_eq!(flat.group_names().collect::<Vec<_>>(), vec!["/"]);
        assert!(flat.get("/", "clouds__cfc").unwrap().quantization.is_none());
        assert!(flat.get("/", "crs").is_some());
    }
}
