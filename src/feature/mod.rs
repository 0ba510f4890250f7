//! Scale-invariant keypoints and descriptors.
//!
//! A [`FeatureSet`] is an ordered list of [`Feature`] records, each pairing a
//! [`Keypoint`] with its [`Descriptor`]. Keypoint and descriptor sequences are
//! index-aligned by construction; [`FeatureSet::from_parts`] is the only way
//! to join two separately produced sequences and rejects mismatched lengths.

mod descriptor;
mod detect;
mod extract;
mod orientation;

pub use extract::{ExtractConfig, FeatureExtractor};

use crate::util::{RealignError, RealignResult};

/// Number of elements in a descriptor vector (4x4 cells of 8 orientations).
pub const DESCRIPTOR_LEN: usize = 128;

/// A detected salient location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    /// X coordinate (column) in source image pixels.
    pub x: f32,
    /// Y coordinate (row) in source image pixels.
    pub y: f32,
    /// Diameter of the neighbourhood the keypoint describes.
    pub size: f32,
    /// Dominant gradient orientation in radians, in `[0, 2π)`.
    pub angle: f32,
    /// Absolute difference-of-Gaussians contrast at the refined extremum.
    pub response: f32,
    /// Octave the keypoint was detected in.
    pub octave: usize,
}

impl Keypoint {
    /// Creates a keypoint at `(x, y)` with neutral scale metadata.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            size: 1.0,
            angle: 0.0,
            response: 0.0,
            octave: 0,
        }
    }

    /// Returns the location as `(x, y)`.
    pub fn pt(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// Fixed-length appearance vector attached to a keypoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor([f32; DESCRIPTOR_LEN]);

impl Descriptor {
    /// Wraps a raw descriptor vector.
    pub fn new(values: [f32; DESCRIPTOR_LEN]) -> Self {
        Self(values)
    }

    /// Builds a descriptor from a slice of exactly [`DESCRIPTOR_LEN`] values.
    pub fn from_slice(values: &[f32]) -> RealignResult<Self> {
        let arr: [f32; DESCRIPTOR_LEN] = values
            .try_into()
            .map_err(|_| RealignError::InvalidInput("descriptor must have 128 elements"))?;
        Ok(Self(arr))
    }

    /// Returns the descriptor values.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Descriptor) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

/// A keypoint together with its descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

/// All features extracted from one image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    /// Wraps already paired features.
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Joins parallel keypoint and descriptor sequences.
    pub fn from_parts(
        keypoints: Vec<Keypoint>,
        descriptors: Vec<Descriptor>,
    ) -> RealignResult<Self> {
        if keypoints.len() != descriptors.len() {
            return Err(RealignError::InvalidInput(
                "keypoint and descriptor counts differ",
            ));
        }
        let features = keypoints
            .into_iter()
            .zip(descriptors)
            .map(|(keypoint, descriptor)| Feature {
                keypoint,
                descriptor,
            })
            .collect();
        Ok(Self { features })
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true when no features were found.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Returns the feature at `index`.
    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    /// Returns all features in order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Iterates keypoints in index order.
    pub fn keypoints(&self) -> impl ExactSizeIterator<Item = &Keypoint> + '_ {
        self.features.iter().map(|f| &f.keypoint)
    }

    /// Iterates descriptors in index order.
    pub fn descriptors(&self) -> impl ExactSizeIterator<Item = &Descriptor> + '_ {
        self.features.iter().map(|f| &f.descriptor)
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}
