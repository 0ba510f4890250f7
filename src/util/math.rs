//! Numeric helpers shared by the detector and the motion estimator.

use std::f32::consts::TAU;

/// Wraps an angle in radians to the range [0, 2π).
pub(crate) fn wrap_rad(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Truncates a pixel displacement toward zero.
///
/// Saturates at the `i32` range and maps NaN to zero, matching `as` casts.
pub(crate) fn truncate_px(value: f32) -> i32 {
    value.trunc() as i32
}

/// Reflect-101 border handling (`dcb|abcd|cba`) for an axis of length `len`.
pub(crate) fn reflect_101(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let len = len as isize;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Sub-sample peak offset of the parabola through samples at `-1, 0, +1`.
///
/// Returns `None` unless the parabola is concave and its vertex lies within
/// one sample of the centre.
pub(crate) fn parabolic_peak_offset(fm: f32, f0: f32, fp: f32) -> Option<f32> {
    if !fm.is_finite() || !f0.is_finite() || !fp.is_finite() {
        return None;
    }
    let denom = fm - 2.0 * f0 + fp;
    if denom > -1e-12 {
        return None;
    }
    let dx = 0.5 * (fm - fp) / denom;
    (dx.is_finite() && dx.abs() <= 1.0).then_some(dx)
}
