//! Shortwave radiation: a rotating heart-shaped indicator.

use cf_common::{Attributes, Coordinates, Dataset, VarData, Variable};
use ndarray::{Array2, Array3, Axis};
use tracing::debug;

use super::{FieldGenerator, FIELD_DIMS};
use crate::aggregation::Aggregation;
use crate::error::SampleResult;
use crate::mask::Mask;
use crate::metadata;

/// Shrinks the heart inside the unit square so rotation does not clip it.
const HEART_EXTENT: f64 = 1.2;

/// The `/radiation` group: `sis`.
#[derive(Debug, Clone, Copy)]
pub struct Radiation {
    aggregation: Aggregation,
}

impl Radiation {
    pub fn new(aggregation: Aggregation) -> Self {
        Self { aggregation }
    }
}

impl FieldGenerator for Radiation {
    fn name(&self) -> &'static str {
        "radiation"
    }

    fn dataset(&self, coords: &Coordinates, mask: &Mask) -> SampleResult<Dataset> {
        let mut ds = Dataset::with_attrs(Attributes::new().with("title", "Radiation"));
        let sis = VarData::Float64(shortwave_radiation(coords).into_dyn());
        ds.insert(
            "sis",
            Variable::new(&FIELD_DIMS, sis)?.with_attrs(metadata::sis_attrs(self.aggregation)),
        )?;
        mask.apply(&mut ds, &[("sis", f64::NAN)])?;
        debug!(aggregation = %self.aggregation, "Generated radiation group");
        Ok(ds)
    }
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

/// Heart indicator on a `rows x cols` array: 1 inside, 0 outside.
///
/// `x` runs from -1 to 1 across columns and `y` from 1 to -1 down the rows,
/// both scaled by the heart extent.
pub fn heart_indicator(rows: usize, cols: usize) -> Array2<f64> {
    let ys = linspace(1.0, -1.0, rows);
    let xs = linspace(-1.0, 1.0, cols);
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let x = xs[c] * HEART_EXTENT;
        let y = ys[r] * HEART_EXTENT;
        let inside = x.powi(2) + (5.0 * y / 4.0 - x.abs().sqrt()).powi(2) - 1.0 <= 0.0;
        if inside {
            1.0
        } else {
            0.0
        }
    })
}

/// Rotate an indicator array counter-clockwise about its centre, keeping
/// the shape.
///
/// Each output cell samples the input bilinearly at the inversely rotated
/// position (zero outside) and is re-thresholded at one half. This is an
/// approximation of cubic spline rotation: cells well inside or outside the
/// shape agree with it, cells along the outline may come out flipped.
pub fn rotate_indicator(field: &Array2<f64>, degrees: f64) -> Array2<f64> {
    let (rows, cols) = field.dim();
    let rc = (rows as f64 - 1.0) / 2.0;
    let cc = (cols as f64 - 1.0) / 2.0;
    let (s, c) = degrees.to_radians().sin_cos();

    Array2::from_shape_fn((rows, cols), |(r, col)| {
        let dy = r as f64 - rc;
        let dx = col as f64 - cc;
        let src_col = cc + c * dx + s * dy;
        let src_row = rc - s * dx + c * dy;
        if sample_bilinear(field, src_row, src_col) >= 0.5 {
            1.0
        } else {
            0.0
        }
    })
}

fn sample_bilinear(field: &Array2<f64>, row: f64, col: f64) -> f64 {
    const EPS: f64 = 1e-9;
    let (rows, cols) = field.dim();
    let max_r = rows as f64 - 1.0;
    let max_c = cols as f64 - 1.0;
    if row < -EPS || col < -EPS || row > max_r + EPS || col > max_c + EPS {
        return 0.0;
    }
    let row = row.clamp(0.0, max_r);
    let col = col.clamp(0.0, max_c);

    let r0 = row.floor() as usize;
    let c0 = col.floor() as usize;
    let r1 = (r0 + 1).min(rows - 1);
    let c1 = (c0 + 1).min(cols - 1);
    let fr = row - r0 as f64;
    let fc = col - c0 as f64;

    let top = field[[r0, c0]] * (1.0 - fc) + field[[r0, c1]] * fc;
    let bottom = field[[r1, c0]] * (1.0 - fc) + field[[r1, c1]] * fc;
    top * (1.0 - fr) + bottom * fr
}

/// `sis`: the heart rotated by `360 · i / ntimes` degrees at time index `i`.
pub fn shortwave_radiation(coords: &Coordinates) -> Array3<f64> {
    let (ntimes, rows, cols) = coords.shape();
    let heart = heart_indicator(rows, cols);
    let mut sis = Array3::<f64>::zeros((ntimes, rows, cols));
    for (i, mut slice) in sis.axis_iter_mut(Axis(0)).enumerate() {
        let angle = 360.0 * i as f64 / ntimes as f64;
        slice.assign(&rotate_indicator(&heart, angle));
    }
    sis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        assert_eq!(linspace(1.0, -1.0, 3), vec![1.0, 0.0, -1.0]);
        assert_eq!(linspace(-1.0, 1.0, 1), vec![-1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_heart_is_binary_and_nonempty() {
        let heart = heart_indicator(40, 40);
        assert!(heart.iter().all(|&v| v == 0.0 || v == 1.0));
        let inside = heart.iter().filter(|&&v| v == 1.0).count();
        assert!(inside > 100 && inside < 1600);
        // Padding keeps the sides and the tip clear
        assert!(heart.row(39).iter().all(|&v| v == 0.0));
        assert!(heart.column(0).iter().all(|&v| v == 0.0));
        assert!(heart.column(39).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_heart_is_mirror_symmetric() {
        let heart = heart_indicator(31, 31);
        for r in 0..31 {
            for c in 0..31 {
                assert_eq!(heart[[r, c]], heart[[r, 30 - c]]);
            }
        }
    }

    #[test]
    fn test_zero_rotation_is_identity() {
        let heart = heart_indicator(25, 25);
        assert_eq!(rotate_indicator(&heart, 0.0), heart);
        assert_eq!(rotate_indicator(&heart, 360.0), heart);
    }

    #[test]
    fn test_oblique_rotation_only_changes_outline() {
        let heart = heart_indicator(41, 41);
        let rotated = rotate_indicator(&heart, 37.0);
        let (s, c) = 37f64.to_radians().sin_cos();
        let mut outline = 0;
        for r in 0..41 {
            for col in 0..41 {
                let (dy, dx) = (r as f64 - 20.0, col as f64 - 20.0);
                let src_row = 20.0 - s * dx + c * dy;
                let src_col = 20.0 + c * dx + s * dy;
                if src_row < -1e-6 || src_col < -1e-6 || src_row > 40.0 + 1e-6 || src_col > 40.0 + 1e-6 {
                    assert_eq!(rotated[[r, col]], 0.0);
                    continue;
                }
                let r0 = src_row.clamp(0.0, 40.0).floor() as usize;
                let c0 = src_col.clamp(0.0, 40.0).floor() as usize;
                let (r1, c1) = ((r0 + 1).min(40), (c0 + 1).min(40));
                let stencil = [heart[[r0, c0]], heart[[r0, c1]], heart[[r1, c0]], heart[[r1, c1]]];
                if stencil.iter().all(|&v| v == stencil[0]) {
                    assert_eq!(rotated[[r, col]], stencil[0], "cell ({}, {})", r, col);
                } else {
                    outline += 1;
                }
            }
        }
        assert!(outline > 0);
        assert!(rotated.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn test_half_turn_flips_vertically() {
        let heart = heart_indicator(21, 21);
        let rotated = rotate_indicator(&heart, 180.0);
        for r in 0..21 {
            for c in 0..21 {
                assert_eq!(rotated[[r, c]], heart[[20 - r, 20 - c]]);
            }
        }
    }
}
