//! SIMD kernel using the `wide` crate.
//!
//! Descriptors have 128 elements, so the loop runs 16 full `f32x8` lanes with
//! no scalar tail.

use crate::feature::{Descriptor, DESCRIPTOR_LEN};
use crate::kernel::DistanceKernel;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

/// SIMD-accelerated squared Euclidean distance.
pub struct SimdL2;

impl DistanceKernel for SimdL2 {
    #[inline]
    fn squared_distance(a: &Descriptor, b: &Descriptor) -> f32 {
        let a = a.as_slice();
        let b = b.as_slice();
        let mut acc = f32x8::ZERO;
        for start in (0..DESCRIPTOR_LEN).step_by(LANES) {
            let d = load_f32x8(&a[start..]) - load_f32x8(&b[start..]);
            acc += d * d;
        }
        hsum(acc)
    }
}
