//! Translation estimate from matched keypoints.
//!
//! The displacement of each match is `reference - current`. The estimate is
//! the per-axis arithmetic mean over all matches; a frame is aligned when both
//! mean components lie within the tolerance (inclusive). Reported integer
//! components are truncated toward zero after the verdict is taken.

use crate::feature::FeatureSet;
use crate::matching::Match;
use crate::trace::{trace_event, trace_span};
use crate::util::math::truncate_px;
use crate::util::{RealignError, RealignResult};

/// Alignment policy.
#[derive(Clone, Debug)]
pub struct AlignConfig {
    /// Largest mean displacement per axis, in pixels, still counted as aligned.
    pub tolerance_px: f32,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self { tolerance_px: 10.0 }
    }
}

impl AlignConfig {
    /// Checks that the tolerance is finite and non-negative.
    pub fn validate(&self) -> RealignResult<()> {
        if !(self.tolerance_px.is_finite() && self.tolerance_px >= 0.0) {
            return Err(RealignError::InvalidInput("tolerance must be non-negative"));
        }
        Ok(())
    }
}

/// Horizontal move hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Right,
}

/// Vertical move hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vertical {
    Up,
    Down,
}

/// Which way to move the camera; `None` components are already in tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Guidance {
    pub horizontal: Option<Horizontal>,
    pub vertical: Option<Vertical>,
}

/// Mean displacement between two frames and the derived verdict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionEstimate {
    /// Mean `reference.x - current.x`.
    pub mean_dx: f32,
    /// Mean `reference.y - current.y`.
    pub mean_dy: f32,
    /// `mean_dx` truncated toward zero.
    pub dx: i32,
    /// `mean_dy` truncated toward zero.
    pub dy: i32,
    pub is_aligned: bool,
    /// Number of matches averaged.
    pub num_matches: usize,
    tolerance_px: f32,
}

impl MotionEstimate {
    /// Suggested camera move for components outside the tolerance.
    pub fn guidance(&self) -> Guidance {
        let tol = self.tolerance_px;
        let horizontal = if self.mean_dx > tol {
            Some(Horizontal::Right)
        } else if self.mean_dx < -tol {
            Some(Horizontal::Left)
        } else {
            None
        };
        let vertical = if self.mean_dy > tol {
            Some(Vertical::Down)
        } else if self.mean_dy < -tol {
            Some(Vertical::Up)
        } else {
            None
        };
        Guidance {
            horizontal,
            vertical,
        }
    }
}

/// Averages the displacement of `matches` and classifies it.
///
/// Fails with [`RealignError::InsufficientMatches`] when `matches` is empty and
/// with [`RealignError::IndexOutOfBounds`] when a match points outside either
/// feature set.
pub fn estimate_motion(
    matches: &[Match],
    reference: &FeatureSet,
    current: &FeatureSet,
    cfg: &AlignConfig,
) -> RealignResult<MotionEstimate> {
    let _span = trace_span!("estimate_motion", matches = matches.len()).entered();
    if matches.is_empty() {
        return Err(RealignError::InsufficientMatches);
    }

    let mut sum_dx = 0.0f64;
    let mut sum_dy = 0.0f64;
    for m in matches {
        let reference_kp = &reference
            .get(m.query_idx)
            .ok_or(RealignError::IndexOutOfBounds {
                index: m.query_idx,
                len: reference.len(),
                context: "reference feature",
            })?
            .keypoint;
        let current_kp = &current
            .get(m.train_idx)
            .ok_or(RealignError::IndexOutOfBounds {
                index: m.train_idx,
                len: current.len(),
                context: "current feature",
            })?
            .keypoint;
        sum_dx += f64::from(reference_kp.x) - f64::from(current_kp.x);
        sum_dy += f64::from(reference_kp.y) - f64::from(current_kp.y);
    }

    let n = matches.len() as f64;
    let mean_dx = (sum_dx / n) as f32;
    let mean_dy = (sum_dy / n) as f32;
    let tol = cfg.tolerance_px;
    let is_aligned = mean_dx.abs() <= tol && mean_dy.abs() <= tol;

    let estimate = MotionEstimate {
        mean_dx,
        mean_dy,
        dx: truncate_px(mean_dx),
        dy: truncate_px(mean_dy),
        is_aligned,
        num_matches: matches.len(),
        tolerance_px: tol,
    };
    trace_event!(
        "motion_estimated",
        mean_dx = mean_dx,
        mean_dy = mean_dy,
        aligned = is_aligned
    );
    Ok(estimate)
}
