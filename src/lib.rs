//! Realign estimates how far a camera has drifted from a reference framing.
//!
//! A reference image is registered once: its SIFT features are stored and an
//! edge overlay is returned for display. Each later frame is matched against
//! the stored features and the mean keypoint displacement decides whether the
//! frame is aligned. Images travel as base64 text.
//!
//! Extraction and matching run on the CPU; the `rayon` feature parallelises
//! octaves and descriptor search, `simd` vectorises descriptor distances and
//! `tracing` emits spans for each stage.

mod candidate;
pub mod feature;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod matching;
pub mod motion;
pub mod overlay;
pub mod pipeline;
pub mod session;
mod trace;
pub mod util;

pub use feature::{
    Descriptor, ExtractConfig, Feature, FeatureExtractor, FeatureSet, Keypoint, DESCRIPTOR_LEN,
};
pub use crate::image::io::{decode_image, encode_base64};
pub use matching::{DescriptorMatcher, Match, MatchConfig};
pub use motion::{estimate_motion, AlignConfig, Guidance, Horizontal, MotionEstimate, Vertical};
pub use overlay::{build_edge_overlay, EdgeOverlay, OverlayConfig};
pub use pipeline::{
    build_overlay, estimate_alignment, extract_features, Aligner, Alignment, Pipeline,
    PipelineConfig,
};
pub use session::{InMemorySessionStore, SessionStore};
pub use util::{RealignError, RealignResult};
