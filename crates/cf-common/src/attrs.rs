//! netCDF attribute values and insertion-ordered attribute maps.

use std::fmt;

/// A single attribute value as stored in a netCDF file.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Strs(Vec<String>),
    Double(f64),
    Doubles(Vec<f64>),
    Float(f32),
    Floats(Vec<f32>),
    Int(i32),
    Ints(Vec<i32>),
    /// Unsigned byte array, used for `flag_values` of u8 variables.
    UBytes(Vec<u8>),
}

impl AttrValue {
    /// Compare two values treating NaN as equal to NaN.
    ///
    /// `_FillValue = NaN` is a common attribute, so plain `==` is not enough
    /// to decide whether two files carry identical metadata.
    pub fn identical(&self, other: &AttrValue) -> bool {
        fn same_f64(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        fn same_f32(a: f32, b: f32) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }

        match (self, other) {
            (AttrValue::Double(a), AttrValue::Double(b)) => same_f64(*a, *b),
            (AttrValue::Doubles(a), AttrValue::Doubles(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_f64(*x, *y))
            }
            (AttrValue::Float(a), AttrValue::Float(b)) => same_f32(*a, *b),
            (AttrValue::Floats(a), AttrValue::Floats(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_f32(*x, *y))
            }
            _ => self == other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Double(v) => Some(*v),
            AttrValue::Float(v) => Some(f64::from(*v)),
            AttrValue::Int(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{:?}", s),
            AttrValue::Strs(v) => write!(f, "{:?}", v),
            AttrValue::Double(v) => write!(f, "{}", v),
            AttrValue::Doubles(v) => write!(f, "{:?}", v),
            AttrValue::Float(v) => write!(f, "{}f", v),
            AttrValue::Floats(v) => write!(f, "{:?}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Ints(v) => write!(f, "{:?}", v),
            AttrValue::UBytes(v) => write!(f, "{:?}ub", v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Double(v)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v)
    }
}

impl From<Vec<u8>> for AttrValue {
    fn from(v: Vec<u8>) -> Self {
        AttrValue::UBytes(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Doubles(v)
    }
}

/// Attribute map that keeps insertion order, so files are written the same
/// way on every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, AttrValue)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute. A replaced attribute keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Keep only the attributes for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &AttrValue) -> bool) {
        self.entries.retain(|(n, v)| keep(n, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add every attribute of `other`, replacing existing values.
    pub fn extend(&mut self, other: &Attributes) {
        for (name, value) in other.iter() {
            self.insert(name, value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}
