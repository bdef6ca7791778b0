//! Void timestamps: masking of field variables and the per-record status.

use cf_common::{AttrValue, Attributes, Dataset, VarData, Variable};
use ndarray::{Array1, ArrayD, Axis};
use num_traits::NumCast;
use tracing::debug;

use crate::error::{SampleError, SampleResult};

/// `record_status` flag: record is usable.
pub const RECORD_OK: u8 = 0;
/// `record_status` flag: record has no data.
pub const RECORD_VOID: u8 = 1;
/// `record_status` flag: record exists but should not be trusted. Never
/// emitted by the generator.
pub const RECORD_BAD_QUALITY: u8 = 2;

/// Set of time indices without valid data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mask {
    void: Vec<usize>,
}

impl Mask {
    pub fn new(void_timestamps: &[usize]) -> Self {
        let mut void = void_timestamps.to_vec();
        void.sort_unstable();
        void.dedup();
        Self { void }
    }

    pub fn void_timestamps(&self) -> &[usize] {
        &self.void
    }

    pub fn is_empty(&self) -> bool {
        self.void.is_empty()
    }

    pub fn is_void(&self, index: usize) -> bool {
        self.void.binary_search(&index).is_ok()
    }

    /// Fail if any void index lies outside a time axis of `ntimes` steps.
    pub fn validate(&self, ntimes: usize) -> SampleResult<()> {
        match self.void.iter().find(|&&i| i >= ntimes) {
            Some(&index) => Err(SampleError::VoidIndexOutOfRange { index, ntimes }),
            None => Ok(()),
        }
    }

    /// Replace the void time slices of each listed variable with its fill value.
    ///
    /// With no void timestamps the dataset is left untouched, even if the
    /// listed variables do not exist.
    pub fn apply(&self, ds: &mut Dataset, fills: &[(&str, f64)]) -> SampleResult<()> {
        if self.is_empty() {
            return Ok(());
        }

        for &(name, fill) in fills {
            let var = ds
                .get_mut(name)
                .ok_or_else(|| SampleError::MaskVariableMissing(name.to_string()))?;
            let axis = var
                .dims
                .iter()
                .position(|d| d == "time")
                .ok_or_else(|| SampleError::NoTimeDimension(name.to_string()))?;
            let ntimes = var.shape()[axis];
            self.validate(ntimes)?;

            let kind = format!("{:?}", var.data.kind());
            let void = &self.void;
            match &mut var.data {
                VarData::Float64(a) => fill_slices(a, axis, void, cast_fill(fill, false)),
                VarData::Float32(a) => fill_slices(a, axis, void, cast_fill(fill, false)),
                VarData::UInt8(a) => fill_slices(a, axis, void, cast_fill(fill, true)),
                VarData::Int32(a) => fill_slices(a, axis, void, cast_fill(fill, true)),
                VarData::Time(_) => None,
            }
            .ok_or_else(|| SampleError::FillTypeMismatch {
                variable: name.to_string(),
                fill,
                kind,
            })?;

            debug!(variable = name, fill, void = ?self.void, "Masked void timestamps");
        }
        Ok(())
    }

    /// Status flag per time step: void where masked, ok elsewhere.
    pub fn record_status(&self, ntimes: usize) -> SampleResult<Array1<u8>> {
        self.validate(ntimes)?;
        Ok(Array1::from_iter((0..ntimes).map(|i| {
            if self.is_void(i) {
                RECORD_VOID
            } else {
                RECORD_OK
            }
        })))
    }

    /// The `record_status` variable with its flag attributes.
    ///
    /// `scope` names what a record belongs to in the comment, e.g.
    /// `"file/group"`.
    pub fn record_status_variable(&self, ntimes: usize, scope: &str) -> SampleResult<Variable> {
        let status = self.record_status(ntimes)?;
        let attrs = Attributes::new()
            .with(
                "comment",
                format!(
                    "Overall status of each record (timestamp) in this {}. \
                     If a record is flagged as not ok, it is recommended not to use it.",
                    scope
                ),
            )
            .with("flag_meanings", "ok void bad_quality")
            .with(
                "flag_values",
                AttrValue::UBytes(vec![RECORD_OK, RECORD_VOID, RECORD_BAD_QUALITY]),
            )
            .with("long_name", "Record Status");
        Ok(Variable::new(&["time"], VarData::UInt8(status.into_dyn()))?.with_attrs(attrs))
    }
}

/// Fill value converted to the element type, or `None` if it does not fit.
fn cast_fill<T: NumCast>(fill: f64, integral: bool) -> Option<T> {
    if integral && fill.fract() != 0.0 {
        return None;
    }
    T::from(fill)
}

fn fill_slices<T: Copy>(
    data: &mut ArrayD<T>,
    axis: usize,
    void: &[usize],
    value: Option<T>,
) -> Option<()> {
    let value = value?;
    for &i in void {
        data.index_axis_mut(Axis(axis), i).fill(value);
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, IxDyn};

    fn dataset(ntimes: usize) -> Dataset {
        let mut ds = Dataset::new();
        let cfc = Array3::<f64>::from_elem((ntimes, 2, 3), 50.0).into_dyn();
        let nobs = ArrayD::<u8>::from_elem(IxDyn(&[ntimes, 2, 3]), 7);
        ds.insert(
            "cfc",
            Variable::new(&["time", "lat", "lon"], VarData::Float64(cfc)).unwrap(),
        )
        .unwrap();
        ds.insert(
            "nobs",
            Variable::new(&["time", "lat", "lon"], VarData::UInt8(nobs)).unwrap(),
        )
        .unwrap();
        ds
    }

    #[test]
    fn test_apply_masks_only_void_slices() {
        let mut ds = dataset(5);
        Mask::new(&[1, 3])
            .apply(&mut ds, &[("cfc", f64::NAN), ("nobs", 0.0)])
            .unwrap();

        let cfc = ds.get("cfc").unwrap().data.as_f64().unwrap();
        let nobs = ds.get("nobs").unwrap().data.as_u8().unwrap();
        for t in 0..5 {
            let void = t == 1 || t == 3;
            let cfc_t = cfc.index_axis(Axis(0), t);
            let nobs_t = nobs.index_axis(Axis(0), t);
            assert_eq!(cfc_t.iter().all(|v| v.is_nan()), void);
            assert_eq!(nobs_t.iter().all(|&v| v == 0), void);
            if !void {
                assert!(cfc_t.iter().all(|&v| v == 50.0));
                assert!(nobs_t.iter().all(|&v| v == 7));
            }
        }
    }

    #[test]
    fn test_empty_mask_is_noop() {
        let mut ds = dataset(2);
        let before = ds.clone();
        Mask::new(&[]).apply(&mut ds, &[("missing", 0.0)]).unwrap();
        assert_eq!(ds, before);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut ds = dataset(2);
        let err = Mask::new(&[2]).apply(&mut ds, &[("cfc", f64::NAN)]).unwrap_err();
        assert!(matches!(
            err,
            SampleError::VoidIndexOutOfRange { index: 2, ntimes: 2 }
        ));
    }

    #[test]
    fn test_missing_variable() {
        let mut ds = dataset(2);
        let err = Mask::new(&[0]).apply(&mut ds, &[("sis", f64::NAN)]).unwrap_err();
        assert!(matches!(err, SampleError::MaskVariableMissing(_)));
    }

    #[test]
    fn test_nan_fill_on_integer_variable() {
        let mut ds = dataset(2);
        let err = Mask::new(&[0]).apply(&mut ds, &[("nobs", f64::NAN)]).unwrap_err();
        assert!(matches!(err, SampleError::FillTypeMismatch { .. }));
    }

    #[test]
    fn test_record_status() {
        let mask = Mask::new(&[4, 20]);
        let status = mask.record_status(24).unwrap();
        for (i, &s) in status.iter().enumerate() {
            assert_eq!(s == RECORD_VOID, i == 4 || i == 20);
            assert_ne!(s, RECORD_BAD_QUALITY);
        }
    }

    #[test]
    fn test_record_status_variable_attrs() {
        let var = Mask::new(&[]).record_status_variable(3, "file/group").unwrap();
        assert_eq!(var.dims, vec!["time"]);
        assert_eq!(var.attrs.get_str("flag_meanings"), Some("ok void bad_quality"));
        assert_eq!(
            var.attrs.get("flag_values"),
            Some(&AttrValue::UBytes(vec![0, 1, 2]))
        );
        assert!(var.attrs.get_str("comment").unwrap().contains("this file/group."));
    }
}
