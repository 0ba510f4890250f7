//! Transparent edge overlays for framing guidance.
//!
//! Edges come from a colour Canny detector whose thresholds scale with the
//! mean sample intensity of the source image, so dark and bright scenes
//! produce comparable outlines. Background pixels are transparent red and edge pixels
//! opaque white.

mod canny;

use crate::image::io::encode_base64;
use crate::trace::{trace_event, trace_span};
use crate::util::{RealignError, RealignResult};
use ::image::{GrayImage, ImageFormat, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// RGBA value written for non-edge pixels.
pub const BACKGROUND: [u8; 4] = [255, 0, 0, 0];
/// RGBA value written for edge pixels.
pub const EDGE: [u8; 4] = [255, 255, 255, 255];

/// Canny threshold factors relative to mean intensity.
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    pub low_ratio: f32,
    pub high_ratio: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            low_ratio: 0.75,
            high_ratio: 2.66,
        }
    }
}

impl OverlayConfig {
    /// Checks that both ratios are positive and ordered.
    pub fn validate(&self) -> RealignResult<()> {
        if !(self.low_ratio.is_finite() && self.low_ratio > 0.0) {
            return Err(RealignError::InvalidInput("low ratio must be positive"));
        }
        if !(self.high_ratio.is_finite() && self.high_ratio >= self.low_ratio) {
            return Err(RealignError::InvalidInput("high ratio must be at least the low ratio"));
        }
        Ok(())
    }
}

/// An RGBA edge overlay with the dimensions of its source image.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeOverlay {
    image: RgbaImage,
    edges: usize,
}

impl EdgeOverlay {
    /// Overlay width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Overlay height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Number of edge pixels.
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Row-major RGBA bytes, four per pixel.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Borrows the overlay as an image buffer.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA bytes as standard base64.
    pub fn to_base64(&self) -> String {
        encode_base64(self.image.as_raw())
    }

    /// Encodes the overlay as a PNG container.
    pub fn to_png(&self) -> RealignResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.image
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|err| RealignError::Encode {
                reason: err.to_string(),
            })?;
        Ok(out.into_inner())
    }
}

/// Mean over every colour sample of `img`.
pub fn mean_intensity(img: &RgbImage) -> f32 {
    let raw = img.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let sum: u64 = raw.iter().map(|&v| u64::from(v)).sum();
    (sum as f64 / raw.len() as f64) as f32
}

/// Builds the edge overlay for `img`.
pub fn build_edge_overlay(img: &RgbImage, cfg: &OverlayConfig) -> EdgeOverlay {
    let _span = trace_span!("build_overlay", width = img.width(), height = img.height()).entered();
    let mean = mean_intensity(img);
    let edges = edge_map(img, mean * cfg.low_ratio, mean * cfg.high_ratio);

    let mut count = 0usize;
    let image = RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        if edges.get_pixel(x, y)[0] == 255 {
            count += 1;
            Rgba(EDGE)
        } else {
            Rgba(BACKGROUND)
        }
    });
    trace_event!("overlay_built", mean = mean, edges = count);
    EdgeOverlay {
        image,
        edges: count,
    }
}

fn edge_map(img: &RgbImage, low: f32, high: f32) -> GrayImage {
    // Zero thresholds would mark every interior pixel; a black frame has no edges.
    if high <= 0.0 {
        return GrayImage::new(img.width(), img.height());
    }
    canny::color_canny(img, low, high)
}

#[cfg(test)]
mod tests {
    use super::{build_edge_overlay, mean_intensity, OverlayConfig, BACKGROUND, EDGE};
    use ::image::{Rgb, RgbImage};

    fn square(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (20..44).contains(&x) && (16..40).contains(&y) {
                Rgb([230, 230, 230])
            } else {
                Rgb([40, 40, 40])
            }
        })
    }

    #[test]
    fn mean_covers_all_channels() {
        let img = RgbImage::from_pixel(2, 2, Rgb([30, 60, 90]));
        assert!((mean_intensity(&img) - 60.0).abs() < 1e-6);
    }

    #[test]
    fn overlay_marks_square_outline() {
        let img = square(64, 56);
        let overlay = build_edge_overlay(&img, &OverlayConfig::default());
        assert_eq!((overlay.width(), overlay.height()), (64, 56));
        assert_eq!(overlay.as_raw().len(), 64 * 56 * 4);
        assert!(overlay.edge_count() > 0);
        for px in overlay.as_raw().chunks_exact(4) {
            assert!(px == BACKGROUND || px == EDGE);
        }
        // Far from the square nothing is marked.
        assert_eq!(overlay.image().get_pixel(2, 2).0, BACKGROUND);
        assert_eq!(overlay.image().get_pixel(32, 28).0, BACKGROUND);
    }

    #[test]
    fn equal_luma_colour_boundary_is_outlined() {
        // Red and dark green have nearly the same Rec.601 luma.
        let img = RgbImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 130, 0])
            }
        });
        let overlay = build_edge_overlay(&img, &OverlayConfig::default());
        assert!(overlay.edge_count() > 0);
        for y in 1..63 {
            assert_eq!(overlay.image().get_pixel(31, y).0, EDGE, "row {y}");
            assert_eq!(overlay.image().get_pixel(10, y).0, BACKGROUND);
        }
    }

    #[test]
    fn black_and_flat_frames_have_no_edges() {
        let black = RgbImage::new(32, 32);
        assert_eq!(build_edge_overlay(&black, &OverlayConfig::default()).edge_count(), 0);
        let flat = RgbImage::from_pixel(32, 32, Rgb([128, 128, 128]));
        assert_eq!(build_edge_overlay(&flat, &OverlayConfig::default()).edge_count(), 0);
    }

    #[test]
    fn png_encoding_produces_a_png_container() {
        let overlay = build_edge_overlay(&square(40, 40), &OverlayConfig::default());
        let png = overlay.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
