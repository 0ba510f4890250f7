//! Raster planes and image I/O.
//!
//! `ImagePlane` is the owned single-channel `f32` buffer the detector works
//! on; intensities are kept in `[0, 1]` once converted from 8-bit samples.
//! `ImageView` borrows a plane for the blur and sampling routines.

use crate::util::{RealignError, RealignResult};
use ::image::RgbImage;

pub mod blur;
pub mod io;
pub mod pyramid;

/// Borrowed row-major view of an [`ImagePlane`].
#[derive(Copy, Clone)]
pub struct ImageView<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
}

impl ImageView<'_> {
    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reads `(x, y)` without an `Option`; callers guarantee bounds.
    #[inline]
    pub(crate) fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}

/// Owned contiguous single-channel `f32` image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePlane {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl ImagePlane {
    /// Wraps a row-major buffer of exactly `width * height` samples.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> RealignResult<Self> {
        if width == 0 || height == 0 {
            return Err(RealignError::InvalidInput("image dimensions must be non-zero"));
        }
        let needed = width
            .checked_mul(height)
            .ok_or(RealignError::InvalidInput("image dimensions overflow"))?;
        if data.len() != needed {
            return Err(RealignError::InvalidInput("buffer length does not match dimensions"));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub(crate) fn zeros(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    /// Converts an RGB raster to luminance in `[0, 1]` using Rec.601 weights.
    pub fn luma_from_rgb(img: &RgbImage) -> Self {
        let width = img.width() as usize;
        let height = img.height() as usize;
        let data = img
            .pixels()
            .map(|px| {
                let [r, g, b] = px.0;
                (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) / 255.0
            })
            .collect();
        Self {
            data,
            width,
            height,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major samples.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
        }
    }

    /// Bilinear 2x upsampling with pixel-centre alignment.
    pub(crate) fn upsample_double(&self) -> Self {
        let dst_w = self.width * 2;
        let dst_h = self.height * 2;
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let mut dst = Self::zeros(dst_w, dst_h);
        for y in 0..dst_h {
            let sy = ((y as f32 + 0.5) * 0.5 - 0.5).clamp(0.0, max_y);
            let y0 = sy.floor() as usize;
            let y1 = (y0 + 1).min(self.height - 1);
            let fy = sy - y0 as f32;
            for x in 0..dst_w {
                let sx = ((x as f32 + 0.5) * 0.5 - 0.5).clamp(0.0, max_x);
                let x0 = sx.floor() as usize;
                let x1 = (x0 + 1).min(self.width - 1);
                let fx = sx - x0 as f32;
                let top = self.data[y0 * self.width + x0] * (1.0 - fx)
                    + self.data[y0 * self.width + x1] * fx;
                let bottom = self.data[y1 * self.width + x0] * (1.0 - fx)
                    + self.data[y1 * self.width + x1] * fx;
                dst.data[y * dst_w + x] = top * (1.0 - fy) + bottom * fy;
            }
        }
        dst
    }

    /// Nearest-neighbour 2x downsampling (keeps even rows and columns).
    ///
    /// Returns `None` when either dimension would drop to zero.
    pub(crate) fn downsample_half(&self) -> Option<Self> {
        let dst_w = self.width / 2;
        let dst_h = self.height / 2;
        if dst_w == 0 || dst_h == 0 {
            return None;
        }
        let mut data = Vec::with_capacity(dst_w * dst_h);
        for y in 0..dst_h {
            let row = &self.data[(2 * y) * self.width..(2 * y + 1) * self.width];
            data.extend(row.iter().step_by(2).take(dst_w));
        }
        Some(Self {
            data,
            width: dst_w,
            height: dst_h,
        })
    }

    /// Per-pixel `self - other`; both planes must share dimensions.
    pub(crate) fn difference(&self, other: &Self) -> Self {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a - b)
            .collect();
        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ImagePlane;
    use ::image::{Rgb, RgbImage};

    #[test]
    fn luma_uses_rec601_weights() {
        let img = RgbImage::from_pixel(2, 1, Rgb([255, 0, 0]));
        let plane = ImagePlane::luma_from_rgb(&img);
        assert!((plane.data()[0] - 0.299).abs() < 1e-6);
    }

    #[test]
    fn downsample_keeps_even_samples() {
        let data: Vec<f32> = (0..20).map(|v| v as f32).collect();
        let plane = ImagePlane::new(data, 5, 4).unwrap();
        let half = plane.downsample_half().unwrap();
        assert_eq!((half.width(), half.height()), (2, 2));
        assert_eq!(half.data(), &[0.0, 2.0, 10.0, 12.0]);
    }

    #[test]
    fn upsample_preserves_constant_images() {
        let plane = ImagePlane::new(vec![0.5; 6], 3, 2).unwrap();
        let doubled = plane.upsample_double();
        assert_eq!((doubled.width(), doubled.height()), (6, 4));
        assert!(doubled.data().iter().all(|v| (v - 0.5).abs() < 1e-6));
    }
}
