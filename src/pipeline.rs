//! End-to-end entry points over encoded image payloads.
//!
//! [`Pipeline`] bundles the configured stages and exposes the three core
//! operations. [`Aligner`] adds a [`SessionStore`] so callers can register a
//! reference under a session id and compare later frames against it.

use crate::feature::{ExtractConfig, FeatureExtractor, FeatureSet};
use crate::image::io::decode_image;
use crate::matching::{DescriptorMatcher, MatchConfig};
use crate::motion::{estimate_motion, AlignConfig, MotionEstimate};
use crate::overlay::{build_edge_overlay, EdgeOverlay, OverlayConfig};
use crate::session::SessionStore;
use crate::util::{RealignError, RealignResult};

/// Verdict returned to callers comparing a frame against a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alignment {
    pub is_aligned: bool,
    pub dx: i32,
    pub dy: i32,
}

impl From<MotionEstimate> for Alignment {
    fn from(value: MotionEstimate) -> Self {
        Self {
            is_aligned: value.is_aligned,
            dx: value.dx,
            dy: value.dy,
        }
    }
}

/// Configuration of every pipeline stage.
#[derive(Clone, Debug, Default)]
pub struct PipelineConfig {
    pub extract: ExtractConfig,
    pub overlay: OverlayConfig,
    pub matching: MatchConfig,
    pub align: AlignConfig,
}

/// Configured decode → extract → match → estimate pipeline.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    extractor: FeatureExtractor,
    overlay: OverlayConfig,
    matcher: DescriptorMatcher,
    align: AlignConfig,
}

impl Pipeline {
    /// Builds a pipeline after validating every stage's configuration.
    pub fn new(cfg: PipelineConfig) -> RealignResult<Self> {
        cfg.overlay.validate()?;
        cfg.align.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(cfg.extract)?,
            overlay: cfg.overlay,
            matcher: DescriptorMatcher::new(cfg.matching)?,
            align: cfg.align,
        })
    }

    /// Decodes `encoded` and extracts its features.
    pub fn extract_features(&self, encoded: &str) -> RealignResult<FeatureSet> {
        let img = decode_image(encoded)?;
        self.extractor.extract(&img)
    }

    /// Decodes `encoded` once and returns its edge overlay and features.
    pub fn build_reference(&self, encoded: &str) -> RealignResult<(EdgeOverlay, FeatureSet)> {
        let img = decode_image(encoded)?;
        let overlay = build_edge_overlay(&img, &self.overlay);
        let features = self.extractor.extract(&img)?;
        Ok((overlay, features))
    }

    /// Returns the base64 RGBA overlay of `encoded` and its features.
    pub fn build_overlay(&self, encoded: &str) -> RealignResult<(String, FeatureSet)> {
        let (overlay, features) = self.build_reference(encoded)?;
        Ok((overlay.to_base64(), features))
    }

    /// Full motion estimate of `encoded` relative to `reference`.
    pub fn estimate_motion(
        &self,
        reference: &FeatureSet,
        encoded: &str,
    ) -> RealignResult<MotionEstimate> {
        let current = self.extract_features(encoded)?;
        let matches = self.matcher.match_features(reference, &current);
        estimate_motion(&matches, reference, &current, &self.align)
    }

    /// Alignment verdict of `encoded` relative to `reference`.
    pub fn estimate_alignment(
        &self,
        reference: &FeatureSet,
        encoded: &str,
    ) -> RealignResult<Alignment> {
        self.estimate_motion(reference, encoded).map(Alignment::from)
    }
}

/// Extracts features from a base64 image with default settings.
pub fn extract_features(encoded: &str) -> RealignResult<FeatureSet> {
    Pipeline::default().extract_features(encoded)
}

/// Builds the base64 RGBA overlay and features of a base64 image with
/// default settings.
pub fn build_overlay(encoded: &str) -> RealignResult<(String, FeatureSet)> {
    Pipeline::default().build_overlay(encoded)
}

/// Compares a base64 image against reference features with default settings.
pub fn estimate_alignment(reference: &FeatureSet, encoded: &str) -> RealignResult<Alignment> {
    Pipeline::default().estimate_alignment(reference, encoded)
}

/// Session-aware front end over a [`Pipeline`].
pub struct Aligner<S> {
    pipeline: Pipeline,
    store: S,
}

impl<S: SessionStore> Aligner<S> {
    /// Creates an aligner with default settings.
    pub fn new(store: S) -> Self {
        Self {
            pipeline: Pipeline::default(),
            store,
        }
    }

    /// Replaces the pipeline configuration.
    pub fn with_config(mut self, cfg: PipelineConfig) -> RealignResult<Self> {
        self.pipeline = Pipeline::new(cfg)?;
        Ok(self)
    }

    /// Returns the session store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the underlying pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Stores the features of `encoded` under `id` and returns its overlay.
    ///
    /// Registering an existing id replaces its reference.
    pub fn register_detailed(&self, id: &str, encoded: &str) -> RealignResult<EdgeOverlay> {
        let (overlay, features) = self.pipeline.build_reference(encoded)?;
        self.store.put(id, features);
        Ok(overlay)
    }

    /// Like [`Aligner::register_detailed`], returning the base64 RGBA overlay.
    pub fn register(&self, id: &str, encoded: &str) -> RealignResult<String> {
        self.register_detailed(id, encoded)
            .map(|overlay| overlay.to_base64())
    }

    /// Full motion estimate of `encoded` against the reference of `id`.
    pub fn compare_detailed(&self, id: &str, encoded: &str) -> RealignResult<MotionEstimate> {
        let reference = self
            .store
            .get(id)
            .ok_or_else(|| RealignError::UnknownSession { id: id.to_string() })?;
        self.pipeline.estimate_motion(&reference, encoded)
    }

    /// Alignment verdict of `encoded` against the reference of `id`.
    pub fn compare(&self, id: &str, encoded: &str) -> RealignResult<Alignment> {
        self.compare_detailed(id, encoded).map(Alignment::from)
    }
}
