//! Descriptor matching between a reference and a current feature set.
//!
//! Every reference descriptor is paired with its two nearest current
//! descriptors. A pair survives only when the nearest is clearly closer than
//! the runner-up (the ratio test); survivors are ranked by distance and the
//! closest `max_matches` are returned.

use crate::candidate::topk::TopK;
use crate::feature::FeatureSet;
use crate::kernel::{nearest_two, ActiveL2, DistanceKernel, Neighbor};
use crate::trace::{trace_event, trace_span};
use crate::util::{RealignError, RealignResult};

/// A correspondence between a reference and a current feature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Index into the reference (query) set.
    pub query_idx: usize,
    /// Index into the current (candidate) set.
    pub train_idx: usize,
    /// Euclidean descriptor distance; lower is more similar.
    pub distance: f32,
}

/// Matching configuration.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Nearest must be strictly closer than `ratio` times the second nearest.
    pub ratio: f32,
    /// Maximum number of matches returned.
    pub max_matches: usize,
    /// Use rayon parallel search when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            max_matches: 10,
            parallel: false,
        }
    }
}

impl MatchConfig {
    /// Checks that the ratio lies in `(0, 1]`.
    pub fn validate(&self) -> RealignResult<()> {
        if !(self.ratio.is_finite() && self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(RealignError::InvalidInput("ratio must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Applies the ratio test to a query's two nearest neighbours.
pub(crate) fn ratio_filter(
    query_idx: usize,
    best: Neighbor,
    second: Neighbor,
    ratio: f32,
) -> Option<Match> {
    let nearest = best.sq_distance.sqrt();
    let runner_up = second.sq_distance.sqrt();
    (nearest < ratio * runner_up).then_some(Match {
        query_idx,
        train_idx: best.index,
        distance: nearest,
    })
}

/// Sequential 2-NN search followed by the ratio test, in query order.
pub fn ratio_matches<K: DistanceKernel>(
    reference: &FeatureSet,
    current: &FeatureSet,
    ratio: f32,
) -> Vec<Match> {
    let candidates = current.features();
    reference
        .features()
        .iter()
        .enumerate()
        .filter_map(|(query_idx, feature)| {
            let (best, second) = nearest_two::<K>(&feature.descriptor, candidates)?;
            ratio_filter(query_idx, best, second, ratio)
        })
        .collect()
}

/// Ratio-test matcher with top-K ranking.
#[derive(Clone, Debug, Default)]
pub struct DescriptorMatcher {
    cfg: MatchConfig,
}

impl DescriptorMatcher {
    /// Creates a matcher after validating `cfg`.
    pub fn new(cfg: MatchConfig) -> RealignResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Matches `reference` against `current`, most confident first.
    ///
    /// Returns an empty list when either set has fewer than two features.
    pub fn match_features(&self, reference: &FeatureSet, current: &FeatureSet) -> Vec<Match> {
        let _span = trace_span!(
            "match_features",
            reference = reference.len(),
            current = current.len()
        )
        .entered();
        if reference.len() < 2 || current.len() < 2 || self.cfg.max_matches == 0 {
            return Vec::new();
        }

        let candidates = self.ratio_survivors(reference, current);
        let survivors = candidates.len();
        let mut topk = TopK::new(self.cfg.max_matches);
        for m in candidates {
            topk.push(m);
        }
        let out = topk.into_sorted_asc();
        trace_event!("matches_ranked", survivors = survivors, kept = out.len());
        out
    }

    #[cfg(feature = "rayon")]
    fn ratio_survivors(&self, reference: &FeatureSet, current: &FeatureSet) -> Vec<Match> {
        if self.cfg.parallel {
            crate::kernel::rayon::ratio_matches_par::<ActiveL2>(reference, current, self.cfg.ratio)
        } else {
            ratio_matches::<ActiveL2>(reference, current, self.cfg.ratio)
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn ratio_survivors(&self, reference: &FeatureSet, current: &FeatureSet) -> Vec<Match> {
        ratio_matches::<ActiveL2>(reference, current, self.cfg.ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::{ratio_filter, DescriptorMatcher, MatchConfig};
    use crate::kernel::Neighbor;

    #[test]
    fn ratio_filter_is_strict() {
        let best = Neighbor {
            index: 3,
            sq_distance: 0.75 * 0.75,
        };
        let second = Neighbor {
            index: 1,
            sq_distance: 1.0,
        };
        assert!(ratio_filter(0, best, second, 0.75).is_none());
        let m = ratio_filter(5, best, second, 0.8).unwrap();
        assert_eq!((m.query_idx, m.train_idx), (5, 3));
        assert!((m.distance - 0.75).abs() < 1e-6);
    }

    #[test]
    fn invalid_ratio_is_rejected() {
        assert!(DescriptorMatcher::new(MatchConfig {
            ratio: 0.0,
            ..MatchConfig::default()
        })
        .is_err());
        assert!(DescriptorMatcher::new(MatchConfig {
            ratio: 1.5,
            ..MatchConfig::default()
        })
        .is_err());
    }
}
