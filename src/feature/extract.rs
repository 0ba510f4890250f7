//! Feature extraction pipeline: luminance, pre-blur, SIFT detection.

use crate::feature::descriptor::compute_descriptor;
use crate::feature::detect::{find_extrema, DetectParams, Extremum};
use crate::feature::orientation::dominant_orientations;
use crate::feature::{Feature, FeatureSet, Keypoint};
use crate::image::blur::{gaussian_blur, gaussian_kernel, sigma_for_kernel_size};
use crate::image::pyramid::{Octave, ScaleSpace, ScaleSpaceParams};
use crate::image::ImagePlane;
use crate::trace::{trace_event, trace_span};
use crate::util::{RealignError, RealignResult};
use ::image::RgbImage;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::cmp::Ordering;

/// Configuration for feature extraction.
#[derive(Clone, Debug)]
pub struct ExtractConfig {
    /// Side of the square smoothing kernel applied before detection (odd).
    pub blur_kernel_size: usize,
    /// Base blur of each scale-space octave.
    pub sigma: f32,
    /// Sampled scales per octave.
    pub num_intervals: usize,
    /// Minimum DoG contrast, for intensities in `[0, 1]`.
    pub contrast_threshold: f32,
    /// Maximum ratio of principal curvatures before a point counts as an edge.
    pub edge_threshold: f32,
    /// Upsample the image by two before building the scale space.
    pub double_base_image: bool,
    /// Keep only the strongest responses when non-zero.
    pub max_features: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: 15,
            sigma: 1.6,
            num_intervals: 3,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            double_base_image: true,
            max_features: 0,
        }
    }
}

impl ExtractConfig {
    /// Checks that every parameter is usable.
    pub fn validate(&self) -> RealignResult<()> {
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(RealignError::InvalidInput("blur kernel size must be odd"));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(RealignError::InvalidInput("sigma must be positive"));
        }
        if self.num_intervals == 0 {
            return Err(RealignError::InvalidInput("num_intervals must be at least 1"));
        }
        if !(self.contrast_threshold.is_finite() && self.contrast_threshold >= 0.0) {
            return Err(RealignError::InvalidInput("contrast threshold must be non-negative"));
        }
        if !(self.edge_threshold.is_finite() && self.edge_threshold >= 1.0) {
            return Err(RealignError::InvalidInput("edge threshold must be at least 1"));
        }
        Ok(())
    }
}

/// Extracts keypoints and descriptors from decoded images.
#[derive(Clone, Debug)]
pub struct FeatureExtractor {
    cfg: ExtractConfig,
    pre_blur: Vec<f32>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        let cfg = ExtractConfig::default();
        let size = cfg.blur_kernel_size;
        Self {
            pre_blur: default_kernel(size),
            cfg,
        }
    }
}

impl FeatureExtractor {
    /// Creates an extractor after validating `cfg`.
    pub fn new(cfg: ExtractConfig) -> RealignResult<Self> {
        cfg.validate()?;
        let size = cfg.blur_kernel_size;
        let pre_blur = gaussian_kernel(size, sigma_for_kernel_size(size))?;
        Ok(Self { cfg, pre_blur })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ExtractConfig {
        &self.cfg
    }

    /// Extracts features from an RGB raster.
    ///
    /// Images without enough texture (or too small for a single octave)
    /// produce an empty set.
    pub fn extract(&self, img: &RgbImage) -> RealignResult<FeatureSet> {
        let _span = trace_span!(
            "extract_features",
            width = img.width(),
            height = img.height()
        )
        .entered();
        let luma = ImagePlane::luma_from_rgb(img);
        let smoothed = gaussian_blur(luma.view(), &self.pre_blur);
        let features = self.extract_plane(&smoothed)?;
        trace_event!("features_extracted", count = features.len());
        Ok(features)
    }

    /// Runs detection and description on an already smoothed plane.
    pub fn extract_plane(&self, plane: &ImagePlane) -> RealignResult<FeatureSet> {
        let space = ScaleSpace::build(
            plane,
            ScaleSpaceParams {
                sigma: self.cfg.sigma,
                intervals: self.cfg.num_intervals,
                double_base: self.cfg.double_base_image,
                ..ScaleSpaceParams::default()
            },
        )?;
        let params = DetectParams {
            sigma: self.cfg.sigma,
            intervals: self.cfg.num_intervals,
            contrast_threshold: self.cfg.contrast_threshold,
            edge_threshold: self.cfg.edge_threshold,
        };
        let coord_scale = if self.cfg.double_base_image { 0.5 } else { 1.0 };

        #[cfg(feature = "rayon")]
        let per_octave: Vec<Vec<Feature>> = space
            .octaves()
            .par_iter()
            .enumerate()
            .map(|(idx, octave)| describe_octave(octave, idx, &params, coord_scale))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let per_octave: Vec<Vec<Feature>> = space
            .octaves()
            .iter()
            .enumerate()
            .map(|(idx, octave)| describe_octave(octave, idx, &params, coord_scale))
            .collect();

        let mut features: Vec<Feature> = per_octave.into_iter().flatten().collect();
        features.sort_by(feature_cmp);
        features.dedup_by(|a, b| feature_cmp(a, b) == Ordering::Equal);

        if self.cfg.max_features > 0 && features.len() > self.cfg.max_features {
            retain_strongest(&mut features, self.cfg.max_features);
        }
        Ok(FeatureSet::new(features))
    }
}

fn default_kernel(size: usize) -> Vec<f32> {
    // The default size is odd and its sigma positive, so this cannot fail.
    gaussian_kernel(size, sigma_for_kernel_size(size)).unwrap_or_else(|_| vec![1.0])
}

fn describe_octave(
    octave: &Octave,
    octave_idx: usize,
    params: &DetectParams,
    coord_scale: f32,
) -> Vec<Feature> {
    let mut out = Vec::new();
    for ext in find_extrema(octave, octave_idx, params) {
        let gauss = octave.gaussians()[ext.layer].view();
        for angle in dominant_orientations(gauss, ext.col, ext.row, ext.scale) {
            let descriptor = compute_descriptor(gauss, ext.col, ext.row, angle, ext.scale);
            out.push(Feature {
                keypoint: to_keypoint(&ext, angle, coord_scale),
                descriptor,
            });
        }
    }
    out
}

fn to_keypoint(ext: &Extremum, angle: f32, coord_scale: f32) -> Keypoint {
    let octave_scale = (1usize << ext.octave) as f32 * coord_scale;
    Keypoint {
        x: ext.x * octave_scale,
        y: ext.y * octave_scale,
        size: ext.scale * 2.0 * octave_scale,
        angle,
        response: ext.response,
        octave: ext.octave,
    }
}

/// Orders by position, then size, then angle; equal keys are duplicates.
fn feature_cmp(a: &Feature, b: &Feature) -> Ordering {
    let (ka, kb) = (&a.keypoint, &b.keypoint);
    ka.x.total_cmp(&kb.x)
        .then_with(|| ka.y.total_cmp(&kb.y))
        .then_with(|| kb.size.total_cmp(&ka.size))
        .then_with(|| ka.angle.total_cmp(&kb.angle))
}

/// Keeps the `keep` strongest responses while preserving the existing order.
fn retain_strongest(features: &mut Vec<Feature>, keep: usize) {
    let mut order: Vec<usize> = (0..features.len()).collect();
    order.sort_by(|&a, &b| {
        features[b]
            .keypoint
            .response
            .total_cmp(&features[a].keypoint.response)
            .then_with(|| a.cmp(&b))
    });
    let mut selected = vec![false; features.len()];
    for &idx in order.iter().take(keep) {
        selected[idx] = true;
    }
    let mut idx = 0;
    features.retain(|_| {
        let keep = selected[idx];
        idx += 1;
        keep
    });
}
