//! Rayon-parallel nearest-neighbour search (feature-gated).
//!
//! Parallelises over reference descriptors. Each query is independent, and
//! `collect` keeps query order, so the output equals the sequential path.

use crate::feature::FeatureSet;
use crate::kernel::{nearest_two, DistanceKernel};
use crate::matching::{ratio_filter, Match};
use rayon::prelude::*;

/// Query-parallel 2-NN search followed by the ratio test.
pub fn ratio_matches_par<K: DistanceKernel>(
    reference: &FeatureSet,
    current: &FeatureSet,
    ratio: f32,
) -> Vec<Match> {
    let candidates = current.features();
    reference
        .features()
        .par_iter()
        .enumerate()
        .filter_map(|(query_idx, feature)| {
            let (best, second) = nearest_two::<K>(&feature.descriptor, candidates)?;
            ratio_filter(query_idx, best, second, ratio)
        })
        .collect()
}
