//! Scalar reference kernel.

use crate::feature::Descriptor;
use crate::kernel::DistanceKernel;

/// Plain loop over descriptor elements.
pub struct ScalarL2;

impl DistanceKernel for ScalarL2 {
    #[inline]
    fn squared_distance(a: &Descriptor, b: &Descriptor) -> f32 {
        a.as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum()
    }
}
