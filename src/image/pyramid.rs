//! Gaussian scale space and difference-of-Gaussians octaves.
//!
//! Each octave holds `intervals + 3` progressively blurred images and the
//! `intervals + 2` differences between neighbours. The base of every octave
//! after the first is the image with twice the octave's initial sigma from the
//! previous octave, subsampled by two.

use crate::image::blur::gaussian_blur_sigma;
use crate::image::ImagePlane;
use crate::util::{RealignError, RealignResult};

/// Smallest side an octave may have and still leave room for the detector.
pub(crate) const MIN_OCTAVE_SIDE: usize = 12;

/// Parameters for building a scale space.
#[derive(Clone, Copy, Debug)]
pub struct ScaleSpaceParams {
    /// Blur of the first image in every octave.
    pub sigma: f32,
    /// Number of sampled scales per octave.
    pub intervals: usize,
    /// Upsample the input by two before building the first octave.
    pub double_base: bool,
    /// Blur already present in the input image.
    pub assumed_blur: f32,
}

impl Default for ScaleSpaceParams {
    fn default() -> Self {
        Self {
            sigma: 1.6,
            intervals: 3,
            double_base: true,
            assumed_blur: 0.5,
        }
    }
}

/// One octave of the scale space.
pub struct Octave {
    gaussians: Vec<ImagePlane>,
    dogs: Vec<ImagePlane>,
}

impl Octave {
    /// Gaussian-blurred images, finest first.
    pub fn gaussians(&self) -> &[ImagePlane] {
        &self.gaussians
    }

    /// Difference-of-Gaussians images.
    pub fn dogs(&self) -> &[ImagePlane] {
        &self.dogs
    }

    /// Octave width in pixels.
    pub fn width(&self) -> usize {
        self.gaussians[0].width()
    }

    /// Octave height in pixels.
    pub fn height(&self) -> usize {
        self.gaussians[0].height()
    }
}

/// Owned scale space built from a base level.
pub struct ScaleSpace {
    octaves: Vec<Octave>,
}

impl ScaleSpace {
    /// Builds the scale space for `base`.
    ///
    /// The octave count is `round(log2(min side)) - 2` measured on the
    /// (possibly doubled) base, clamped to at least one; octaves whose side
    /// would fall below the detector's working size are not built, so empty
    /// or tiny planes yield no octaves.
    pub fn build(base: &ImagePlane, params: ScaleSpaceParams) -> RealignResult<Self> {
        if params.intervals == 0 {
            return Err(RealignError::InvalidInput("scale space needs at least one interval"));
        }
        if !(params.sigma.is_finite() && params.sigma > 0.0) {
            return Err(RealignError::InvalidInput("scale space sigma must be positive"));
        }

        let factor = if params.double_base { 2 } else { 1 };
        if base.width().min(base.height()) * factor < MIN_OCTAVE_SIDE {
            return Ok(Self {
                octaves: Vec::new(),
            });
        }

        let (seed, seed_blur) = if params.double_base {
            (base.upsample_double(), params.assumed_blur * 2.0)
        } else {
            (base.clone(), params.assumed_blur)
        };
        let sigma_diff = (params.sigma * params.sigma - seed_blur * seed_blur)
            .max(0.01)
            .sqrt();
        let mut octave_base = gaussian_blur_sigma(seed.view(), sigma_diff)?;

        let min_side = octave_base.width().min(octave_base.height());
        let max_octaves = ((min_side as f32).log2().round() as isize - 2).max(1) as usize;
        let increments = blur_increments(params.sigma, params.intervals);

        let mut octaves = Vec::with_capacity(max_octaves);
        while octaves.len() < max_octaves {
            if octave_base.width().min(octave_base.height()) < MIN_OCTAVE_SIDE {
                break;
            }
            let mut gaussians = Vec::with_capacity(increments.len());
            gaussians.push(octave_base);
            for &sigma in increments.iter().skip(1) {
                let next = gaussian_blur_sigma(gaussians[gaussians.len() - 1].view(), sigma)?;
                gaussians.push(next);
            }
            let dogs = gaussians
                .windows(2)
                .map(|pair| pair[1].difference(&pair[0]))
                .collect();

            let next_base = gaussians[params.intervals].downsample_half();
            octaves.push(Octave { gaussians, dogs });
            match next_base {
                Some(img) => octave_base = img,
                None => break,
            }
        }

        Ok(Self { octaves })
    }

    /// Returns all octaves (octave 0 is the finest).
    pub fn octaves(&self) -> &[Octave] {
        &self.octaves
    }
}

/// Incremental blurs taking each image in an octave from `sigma * k^(i-1)`
/// to `sigma * k^i`; entry 0 is the octave's base sigma.
fn blur_increments(sigma: f32, intervals: usize) -> Vec<f32> {
    let k = 2.0f32.powf(1.0 / intervals as f32);
    let mut out = Vec::with_capacity(intervals + 3);
    out.push(sigma);
    for i in 1..intervals + 3 {
        let prev = k.powi(i as i32 - 1) * sigma;
        let total = prev * k;
        out.push((total * total - prev * prev).sqrt());
    }
    out
}
