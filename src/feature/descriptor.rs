//! 4x4x8 gradient-histogram descriptors.
//!
//! Samples inside a rotated square window are binned into a 4x4 spatial grid
//! of 8-bin orientation histograms with trilinear interpolation. The vector is
//! normalised, clipped at 0.2 to damp large gradients, and normalised again.

use crate::feature::{Descriptor, DESCRIPTOR_LEN};
use crate::image::ImageView;
use crate::util::math::wrap_rad;
use std::f32::consts::TAU;

const DESCR_WIDTH: usize = 4;
const DESCR_HIST_BINS: usize = 8;
/// Spatial cell width as a multiple of the keypoint scale.
const DESCR_SCL_FCTR: f32 = 3.0;
const DESCR_MAG_THR: f32 = 0.2;

/// Computes the descriptor of the keypoint at `(col, row)` in `img`.
pub(crate) fn compute_descriptor(
    img: ImageView<'_>,
    col: usize,
    row: usize,
    angle: f32,
    scale: f32,
) -> Descriptor {
    let d = DESCR_WIDTH;
    let n = DESCR_HIST_BINS;
    let cells = d + 2;
    let mut hist = vec![0.0f32; cells * cells * n];

    let hist_width = DESCR_SCL_FCTR * scale;
    let width = img.width() as isize;
    let height = img.height() as isize;
    let max_radius = ((width * width + height * height) as f32).sqrt();
    let radius = (hist_width * std::f32::consts::SQRT_2 * (d as f32 + 1.0) * 0.5)
        .min(max_radius)
        .round() as isize;

    let (sin_t, cos_t) = angle.sin_cos();
    let (sin_t, cos_t) = (sin_t / hist_width, cos_t / hist_width);
    let bins_per_rad = n as f32 / TAU;
    let exp_scale = -1.0 / (d as f32 * d as f32 * 0.5);
    let half = d as f32 / 2.0 - 0.5;

    for i in -radius..=radius {
        for j in -radius..=radius {
            // Offset rotated into the keypoint frame, in cell units.
            let c_rot = j as f32 * cos_t + i as f32 * sin_t;
            let r_rot = -(j as f32) * sin_t + i as f32 * cos_t;
            let rbin = r_rot + half;
            let cbin = c_rot + half;
            if rbin <= -1.0 || rbin >= d as f32 || cbin <= -1.0 || cbin >= d as f32 {
                continue;
            }
            let y = row as isize + i;
            let x = col as isize + j;
            if y <= 0 || y >= height - 1 || x <= 0 || x >= width - 1 {
                continue;
            }
            let (x, y) = (x as usize, y as usize);
            let dx = img.at(x + 1, y) - img.at(x - 1, y);
            let dy = img.at(x, y + 1) - img.at(x, y - 1);
            let weight = ((c_rot * c_rot + r_rot * r_rot) * exp_scale).exp();
            let mag = dx.hypot(dy) * weight;
            let obin = wrap_rad(dy.atan2(dx) - angle) * bins_per_rad;

            let r0 = rbin.floor();
            let c0 = cbin.floor();
            let o0 = obin.floor();
            let (fr, fc, fo) = (rbin - r0, cbin - c0, obin - o0);
            let r0 = (r0 as isize + 1) as usize;
            let c0 = (c0 as isize + 1) as usize;
            let o0 = o0 as usize % n;
            let o1 = (o0 + 1) % n;

            for (dr, wr) in [(0usize, 1.0 - fr), (1, fr)] {
                for (dc, wc) in [(0usize, 1.0 - fc), (1, fc)] {
                    let base = ((r0 + dr) * cells + (c0 + dc)) * n;
                    let v = mag * wr * wc;
                    hist[base + o0] += v * (1.0 - fo);
                    hist[base + o1] += v * fo;
                }
            }
        }
    }

    let mut out = [0.0f32; DESCRIPTOR_LEN];
    for r in 0..d {
        for c in 0..d {
            let src = ((r + 1) * cells + (c + 1)) * n;
            let dst = (r * d + c) * n;
            out[dst..dst + n].copy_from_slice(&hist[src..src + n]);
        }
    }
    normalize_clipped(&mut out);
    Descriptor::new(out)
}

fn normalize_clipped(values: &mut [f32; DESCRIPTOR_LEN]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return;
    }
    let threshold = norm * DESCR_MAG_THR;
    for v in values.iter_mut() {
        *v = v.min(threshold);
    }
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return;
    }
    for v in values.iter_mut() {
        *v /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::compute_descriptor;
    use crate::image::ImagePlane;

    fn textured(width: usize, height: usize) -> ImagePlane {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let v = (x as f32 * 0.37).sin() * (y as f32 * 0.23).cos();
                data.push(0.5 + 0.4 * v);
            }
        }
        ImagePlane::new(data, width, height).unwrap()
    }

    #[test]
    fn descriptor_is_unit_length_and_clipped() {
        let plane = textured(64, 64);
        let desc = compute_descriptor(plane.view(), 32, 32, 0.7, 2.0);
        let norm: f32 = desc.as_slice().iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(desc.as_slice().iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn flat_patch_gives_zero_descriptor() {
        let plane = ImagePlane::new(vec![0.4; 32 * 32], 32, 32).unwrap();
        let desc = compute_descriptor(plane.view(), 16, 16, 0.0, 1.6);
        assert!(desc.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn different_locations_give_different_descriptors() {
        let plane = textured(64, 64);
        let a = compute_descriptor(plane.view(), 24, 30, 0.0, 2.0);
        let b = compute_descriptor(plane.view(), 32, 30, 0.0, 2.0);
        assert!(a.distance(&b) > 0.05);
    }
}
