//! Shared test utilities for the gerda-samples workspace.
//!
//! Fixtures for small grids and time axes, a synthetic two-group tree with
//! known values, and helpers for tests that need an external CF checker.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Return the path of an external program, or skip the test when it is not
/// installed.
///
/// ```ignore
/// let cfchecks = test_utils::require_program!("cfchecks");
/// ```
#[macro_export]
macro_rules! require_program {
    ($name:expr) => {{
        match $crate::find_program($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: '{}' is not installed", $name);
                return;
            }
        }
    }};
}

/// Assert `|left - right| <= epsilon` after widening both sides to f64.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: {} is not within {} of {} (diff {})",
                left, epsilon, right, diff
            );
        }
    }};
}

/// Element-wise [`assert_approx_eq!`] over two sequences. NaN only matches NaN.
#[macro_export]
macro_rules! assert_slices_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: Vec<f64> = $left.into_iter().map(|v| v as f64).collect();
        let right: Vec<f64> = $right.into_iter().map(|v| v as f64).collect();
        assert_eq!(left.len(), right.len(), "sequences differ in length");
        for (i, (l, r)) in left.iter().zip(&right).enumerate() {
            if l.is_nan() || r.is_nan() {
                assert!(l.is_nan() && r.is_nan(), "assertion failed at {}: {} vs {}", i, l, r);
            } else {
                $crate::assert_approx_eq!(*l, *r, $epsilon);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_eq_within_epsilon() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5f32, -5.500001f64, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_approx_eq_outside_epsilon() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }

    #[test]
    fn test_slices_nan_matches_nan() {
        assert_slices_approx_eq!(vec![1.0, f64::NAN], vec![1.0001, f64::NAN], 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_slices_nan_against_value() {
        assert_slices_approx_eq!(vec![f64::NAN], vec![0.0], 0.001);
    }
}
