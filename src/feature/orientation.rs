//! Dominant gradient orientations around a keypoint.

use crate::image::ImageView;
use crate::util::math::{parabolic_peak_offset, wrap_rad};
use std::f32::consts::TAU;

const ORI_BINS: usize = 36;
/// Gaussian window sigma as a multiple of the keypoint scale.
const ORI_SIG_FCTR: f32 = 1.5;
const ORI_RADIUS: f32 = 3.0 * ORI_SIG_FCTR;
/// Secondary peaks at or above this fraction of the maximum spawn keypoints.
const ORI_PEAK_RATIO: f32 = 0.8;

/// Returns the orientations (radians, `[0, 2π)`) of all histogram peaks
/// within [`ORI_PEAK_RATIO`] of the strongest one.
pub(crate) fn dominant_orientations(
    img: ImageView<'_>,
    col: usize,
    row: usize,
    scale: f32,
) -> Vec<f32> {
    let hist = smooth(&orientation_histogram(img, col, row, scale));
    let max = hist.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }

    let threshold = max * ORI_PEAK_RATIO;
    let mut out = Vec::new();
    for j in 0..ORI_BINS {
        let left = hist[(j + ORI_BINS - 1) % ORI_BINS];
        let right = hist[(j + 1) % ORI_BINS];
        let centre = hist[j];
        if centre > left && centre > right && centre >= threshold {
            let offset = parabolic_peak_offset(left, centre, right).unwrap_or(0.0);
            let bin = j as f32 + offset;
            out.push(wrap_rad(bin * TAU / ORI_BINS as f32));
        }
    }
    out
}

fn orientation_histogram(img: ImageView<'_>, col: usize, row: usize, scale: f32) -> [f32; ORI_BINS] {
    let mut hist = [0.0f32; ORI_BINS];
    let radius = (ORI_RADIUS * scale).round() as isize;
    let sigma = ORI_SIG_FCTR * scale;
    let exp_scale = -1.0 / (2.0 * sigma * sigma);
    let width = img.width() as isize;
    let height = img.height() as isize;

    for i in -radius..=radius {
        let y = row as isize + i;
        if y <= 0 || y >= height - 1 {
            continue;
        }
        for j in -radius..=radius {
            let x = col as isize + j;
            if x <= 0 || x >= width - 1 {
                continue;
            }
            let (x, y) = (x as usize, y as usize);
            let dx = img.at(x + 1, y) - img.at(x - 1, y);
            let dy = img.at(x, y + 1) - img.at(x, y - 1);
            let weight = (((i * i + j * j) as f32) * exp_scale).exp();
            let angle = wrap_rad(dy.atan2(dx));
            let bin = (angle * ORI_BINS as f32 / TAU).round() as usize % ORI_BINS;
            hist[bin] += weight * dx.hypot(dy);
        }
    }
    hist
}

/// Circular `[1, 4, 6, 4, 1] / 16` smoothing.
fn smooth(hist: &[f32; ORI_BINS]) -> [f32; ORI_BINS] {
    let mut out = [0.0f32; ORI_BINS];
    let n = ORI_BINS;
    for (i, slot) in out.iter_mut().enumerate() {
        let m2 = hist[(i + n - 2) % n];
        let m1 = hist[(i + n - 1) % n];
        let p1 = hist[(i + 1) % n];
        let p2 = hist[(i + 2) % n];
        *slot = (m2 + p2) * (1.0 / 16.0) + (m1 + p1) * (4.0 / 16.0) + hist[i] * (6.0 / 16.0);
    }
    out
}
