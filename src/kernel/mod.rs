//! Descriptor distance kernels and nearest-neighbour search.
//!
//! Kernels compute squared Euclidean distances between descriptors. The
//! matcher only ever compares distances from the same kernel, so the SIMD
//! kernel's different summation order never changes which neighbour wins
//! beyond floating-point ties.

use crate::feature::{Descriptor, Feature};

/// Distance kernel over 128-element descriptors.
pub trait DistanceKernel {
    /// Squared Euclidean distance between `a` and `b`.
    fn squared_distance(a: &Descriptor, b: &Descriptor) -> f32;
}

/// Candidate index and its squared distance to a query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub sq_distance: f32,
}

/// Returns the two nearest candidates to `query`, closest first.
///
/// Ties keep the lower candidate index. Returns `None` when there are fewer
/// than two candidates.
pub fn nearest_two<K: DistanceKernel>(
    query: &Descriptor,
    candidates: &[Feature],
) -> Option<(Neighbor, Neighbor)> {
    if candidates.len() < 2 {
        return None;
    }
    let mut best = Neighbor {
        index: usize::MAX,
        sq_distance: f32::INFINITY,
    };
    let mut second = best;
    for (index, cand) in candidates.iter().enumerate() {
        let sq_distance = K::squared_distance(query, &cand.descriptor);
        if sq_distance < best.sq_distance {
            second = best;
            best = Neighbor { index, sq_distance };
        } else if sq_distance < second.sq_distance {
            second = Neighbor { index, sq_distance };
        }
    }
    if best.index == usize::MAX || second.index == usize::MAX {
        // Only reachable when distances are NaN.
        return None;
    }
    Some((best, second))
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

#[cfg(not(feature = "simd"))]
pub(crate) use scalar::ScalarL2 as ActiveL2;
#[cfg(feature = "simd")]
pub(crate) use simd::SimdL2 as ActiveL2;
