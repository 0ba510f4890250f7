//! Top-K tracking for descriptor correspondences.

use crate::matching::Match;
use std::cmp::Ordering;

/// Ascending distance with deterministic tie-breaking on indices.
pub(crate) fn match_cmp_asc(a: &Match, b: &Match) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.query_idx.cmp(&b.query_idx))
        .then_with(|| a.train_idx.cmp(&b.train_idx))
}

/// Sorts matches most confident first.
pub(crate) fn sort_matches_asc(matches: &mut [Match]) {
    matches.sort_by(match_cmp_asc);
}

/// Top-K container with O(k) insertion cost.
pub(crate) struct TopK {
    k: usize,
    items: Vec<Match>,
}

impl TopK {
    /// Creates a new Top-K collector.
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k),
        }
    }

    /// Pushes a match, evicting the most distant one if at capacity.
    pub(crate) fn push(&mut self, m: Match) {
        if self.k == 0 {
            return;
        }
        if self.items.len() < self.k {
            self.items.push(m);
            return;
        }

        let mut worst_idx = 0usize;
        for (idx, item) in self.items.iter().enumerate().skip(1) {
            if match_cmp_asc(item, &self.items[worst_idx]) == Ordering::Greater {
                worst_idx = idx;
            }
        }

        if match_cmp_asc(&m, &self.items[worst_idx]) == Ordering::Less {
            self.items[worst_idx] = m;
        }
    }

    /// Returns matches sorted by ascending distance.
    pub(crate) fn into_sorted_asc(mut self) -> Vec<Match> {
        sort_matches_asc(&mut self.items);
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::TopK;
    use crate::matching::Match;

    fn m(query_idx: usize, distance: f32) -> Match {
        Match {
            query_idx,
            train_idx: 0,
            distance,
        }
    }

    #[test]
    fn keeps_k_closest_in_order() {
        let mut topk = TopK::new(3);
        for (idx, d) in [0.9, 0.1, 0.5, 0.3, 0.7, 0.2].into_iter().enumerate() {
            topk.push(m(idx, d));
        }
        let out = topk.into_sorted_asc();
        let queries: Vec<usize> = out.iter().map(|m| m.query_idx).collect();
        assert_eq!(queries, vec![1, 5, 3]);
    }

    #[test]
    fn ties_prefer_lower_query_index() {
        let mut topk = TopK::new(2);
        for idx in [4, 2, 7, 0] {
            topk.push(m(idx, 0.5));
        }
        let queries: Vec<usize> = topk.into_sorted_asc().iter().map(|m| m.query_idx).collect();
        assert_eq!(queries, vec![0, 2]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut topk = TopK::new(0);
        topk.push(m(0, 0.1));
        assert!(topk.into_sorted_asc().is_empty());
    }
}
