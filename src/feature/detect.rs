//! Difference-of-Gaussians extremum detection and sub-pixel refinement.

use crate::image::pyramid::Octave;
use crate::image::{ImagePlane, ImageView};
use nalgebra::{Matrix3, Vector3};

/// Pixels ignored along every octave border.
pub(crate) const IMG_BORDER: usize = 5;
const MAX_INTERP_STEPS: usize = 5;

#[derive(Clone, Copy, Debug)]
pub(crate) struct DetectParams {
    pub(crate) sigma: f32,
    pub(crate) intervals: usize,
    pub(crate) contrast_threshold: f32,
    pub(crate) edge_threshold: f32,
}

/// A refined scale-space extremum in octave coordinates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Extremum {
    pub(crate) octave: usize,
    /// Gaussian layer nearest to the refined scale.
    pub(crate) layer: usize,
    pub(crate) col: usize,
    pub(crate) row: usize,
    /// Sub-pixel position within the octave.
    pub(crate) x: f32,
    pub(crate) y: f32,
    /// Blur of the extremum relative to the octave's sampling grid.
    pub(crate) scale: f32,
    pub(crate) response: f32,
}

/// Finds all stable extrema in one octave, scanning layer by layer in
/// row-major order.
pub(crate) fn find_extrema(octave: &Octave, octave_idx: usize, params: &DetectParams) -> Vec<Extremum> {
    let dogs = octave.dogs();
    let width = octave.width();
    let height = octave.height();
    let mut out = Vec::new();
    if width <= 2 * IMG_BORDER || height <= 2 * IMG_BORDER || dogs.len() < params.intervals + 2 {
        return out;
    }

    let threshold = 0.5 * params.contrast_threshold / params.intervals as f32;
    for layer in 1..=params.intervals {
        let stack = [dogs[layer - 1].view(), dogs[layer].view(), dogs[layer + 1].view()];
        for row in IMG_BORDER..height - IMG_BORDER {
            for col in IMG_BORDER..width - IMG_BORDER {
                let value = stack[1].at(col, row);
                if value.abs() <= threshold || !is_local_extremum(&stack, col, row, value) {
                    continue;
                }
                if let Some(ext) = refine_extremum(dogs, octave_idx, layer, col, row, params) {
                    out.push(ext);
                }
            }
        }
    }
    out
}

fn is_local_extremum(stack: &[ImageView<'_>; 3], col: usize, row: usize, value: f32) -> bool {
    for img in stack {
        for y in row - 1..=row + 1 {
            for x in col - 1..=col + 1 {
                let other = img.at(x, y);
                if value > 0.0 && other > value {
                    return false;
                }
                if value < 0.0 && other < value {
                    return false;
                }
            }
        }
    }
    true
}

/// Gradient, Hessian and centre value of the DoG at `(col, row, layer)`.
fn derivatives(
    dogs: &[ImagePlane],
    layer: usize,
    col: usize,
    row: usize,
) -> (Vector3<f32>, Matrix3<f32>, f32) {
    let prev = dogs[layer - 1].view();
    let cur = dogs[layer].view();
    let next = dogs[layer + 1].view();
    let (c, r) = (col, row);
    let v = cur.at(c, r);

    let grad = Vector3::new(
        (cur.at(c + 1, r) - cur.at(c - 1, r)) * 0.5,
        (cur.at(c, r + 1) - cur.at(c, r - 1)) * 0.5,
        (next.at(c, r) - prev.at(c, r)) * 0.5,
    );

    let dxx = cur.at(c + 1, r) + cur.at(c - 1, r) - 2.0 * v;
    let dyy = cur.at(c, r + 1) + cur.at(c, r - 1) - 2.0 * v;
    let dss = next.at(c, r) + prev.at(c, r) - 2.0 * v;
    let dxy = (cur.at(c + 1, r + 1) - cur.at(c - 1, r + 1) - cur.at(c + 1, r - 1)
        + cur.at(c - 1, r - 1))
        * 0.25;
    let dxs = (next.at(c + 1, r) - next.at(c - 1, r) - prev.at(c + 1, r) + prev.at(c - 1, r)) * 0.25;
    let dys = (next.at(c, r + 1) - next.at(c, r - 1) - prev.at(c, r + 1) + prev.at(c, r - 1)) * 0.25;

    let hessian = Matrix3::new(dxx, dxy, dxs, dxy, dyy, dys, dxs, dys, dss);
    (grad, hessian, v)
}

/// Fits a 3D quadratic around the sample, moving to the neighbouring sample
/// while the fitted offset exceeds half a step. Rejects points that drift off
/// the octave, fail to converge, have low contrast or lie on an edge.
fn refine_extremum(
    dogs: &[ImagePlane],
    octave_idx: usize,
    layer: usize,
    col: usize,
    row: usize,
    params: &DetectParams,
) -> Option<Extremum> {
    let width = dogs[0].width() as isize;
    let height = dogs[0].height() as isize;
    let border = IMG_BORDER as isize;
    let (mut layer, mut col, mut row) = (layer as isize, col as isize, row as isize);

    let mut converged = None;
    for _ in 0..MAX_INTERP_STEPS {
        let (grad, hessian, _) = derivatives(dogs, layer as usize, col as usize, row as usize);
        let offset = -hessian.lu().solve(&grad)?;
        if offset.iter().all(|v| v.abs() < 0.5) {
            converged = Some(offset);
            break;
        }
        if offset.iter().any(|v| !v.is_finite() || v.abs() > (i32::MAX / 3) as f32) {
            return None;
        }

        col += offset.x.round() as isize;
        row += offset.y.round() as isize;
        layer += offset.z.round() as isize;
        if layer < 1
            || layer > params.intervals as isize
            || col < border
            || col >= width - border
            || row < border
            || row >= height - border
        {
            return None;
        }
    }
    let offset = converged?;
    let (layer, col, row) = (layer as usize, col as usize, row as usize);

    let (grad, hessian, value) = derivatives(dogs, layer, col, row);
    let contrast = value + 0.5 * grad.dot(&offset);
    if contrast.abs() * (params.intervals as f32) < params.contrast_threshold {
        return None;
    }

    let dxx = hessian[(0, 0)];
    let dyy = hessian[(1, 1)];
    let dxy = hessian[(0, 1)];
    let trace = dxx + dyy;
    let det = dxx * dyy - dxy * dxy;
    let edge = params.edge_threshold;
    if det <= 0.0 || trace * trace * edge >= (edge + 1.0) * (edge + 1.0) * det {
        return None;
    }

    let scale = params.sigma * 2.0f32.powf((layer as f32 + offset.z) / params.intervals as f32);
    Some(Extremum {
        octave: octave_idx,
        layer,
        col,
        row,
        x: col as f32 + offset.x,
        y: row as f32 + offset.y,
        scale,
        response: contrast.abs(),
    })
}
