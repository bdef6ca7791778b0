//! Lossy precision reduction applied before deflate.
//!
//! Both schemes leave NaN untouched so missing values survive.

/// Explicit mantissa bits of an IEEE single.
const F32_MANTISSA_BITS: u32 = 23;
/// Explicit mantissa bits of an IEEE double.
const F64_MANTISSA_BITS: u32 = 52;

/// Number of binary digits needed for `digits` decimal digits after the point.
pub fn lsd_bits(digits: u8) -> i32 {
    (10f64.powi(i32::from(digits))).log2().ceil() as i32
}

/// Round every value to a multiple of `2^-b`, `b = ceil(log2(10^digits))`.
///
/// The absolute error stays below `10^-digits`, and the zeroed trailing
/// bits compress well.
pub fn least_significant_digit(values: &mut [f64], digits: u8) {
    let scale = 2f64.powi(lsd_bits(digits));
    for v in values.iter_mut().filter(|v| v.is_finite()) {
        *v = (*v * scale).round_ties_even() / scale;
    }
}

/// Mantissa bits kept for `nsd` significant decimal digits in single
/// precision. Double precision keeps one bit more, as netcdf-c does.
pub fn bitgroom_kept_bits(nsd: u8) -> u32 {
    (f64::from(nsd) * std::f64::consts::LOG2_10).ceil() as u32 + 1
}

/// BitGroom on single precision values.
///
/// Even indices have their trailing bits shaved to zero, odd non-zero
/// indices have them set to one, so the quantization error averages out.
pub fn bitgroom_f32(values: &mut [f32], nsd: u8) {
    let keep = bitgroom_kept_bits(nsd);
    if keep >= F32_MANTISSA_BITS {
        return;
    }
    let shave = u32::MAX << (F32_MANTISSA_BITS - keep);
    let set = !shave;
    for (idx, v) in values.iter_mut().enumerate() {
        if v.is_nan() {
            continue;
        }
        let bits = v.to_bits();
        if idx % 2 == 0 {
            *v = f32::from_bits(bits & shave);
        } else if bits != 0 {
            *v = f32::from_bits(bits | set);
        }
    }
}

/// BitGroom on double precision values.
pub fn bitgroom_f64(values: &mut [f64], nsd: u8) {
    let keep = bitgroom_kept_bits(nsd) + 1;
    if keep >= F64_MANTISSA_BITS {
        return;
    }
    let shave = u64::MAX << (F64_MANTISSA_BITS - keep);
    let set = !shave;
    for (idx, v) in values.iter_mut().enumerate() {
        if v.is_nan() {
            continue;
        }
        let bits = v.to_bits();
        if idx % 2 == 0 {
            *v = f64::from_bits(bits & shave);
        } else if bits != 0 {
            *v = f64::from_bits(bits | set);
        }
    }
}
