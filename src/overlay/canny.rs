//! Canny edge detection on colour images.
//!
//! Each pixel takes the Sobel gradient of whichever channel has the largest
//! L1 magnitude there, so boundaries between colours of equal brightness
//! still produce edges. No smoothing is applied before differentiation; the
//! thresholds compare directly against `|gx| + |gy|` of the 3x3 Sobel
//! responses.

use ::image::{GrayImage, Luma, RgbImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// tan(22.5°) and tan(67.5°), the sector bounds for gradient directions.
const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

/// Per-pixel gradient of the strongest channel.
struct Gradients {
    gx: Vec<i32>,
    gy: Vec<i32>,
    mag: Vec<i32>,
    width: usize,
    height: usize,
}

impl Gradients {
    fn strongest_channel(img: &RgbImage) -> Self {
        let width = img.width() as usize;
        let height = img.height() as usize;
        let len = width * height;
        let mut gx = vec![0i32; len];
        let mut gy = vec![0i32; len];
        let mut mag = vec![0i32; len];

        for channel in 0..3 {
            let plane = GrayImage::from_fn(img.width(), img.height(), |x, y| {
                Luma([img.get_pixel(x, y)[channel]])
            });
            let hx = horizontal_sobel(&plane).into_raw();
            let vy = vertical_sobel(&plane).into_raw();
            for idx in 0..len {
                let (dx, dy) = (i32::from(hx[idx]), i32::from(vy[idx]));
                let m = dx.abs() + dy.abs();
                if m > mag[idx] {
                    gx[idx] = dx;
                    gy[idx] = dy;
                    mag[idx] = m;
                }
            }
        }

        Self {
            gx,
            gy,
            mag,
            width,
            height,
        }
    }

    /// Whether interior pixel `idx` is a local maximum across its edge.
    fn is_ridge(&self, idx: usize) -> bool {
        let m = self.mag[idx];
        let ax = self.gx[idx].abs() as f32;
        let ay = self.gy[idx].abs() as f32;
        let w = self.width;
        let (before, after) = if ay <= ax * TAN_22_5 {
            (idx - 1, idx + 1)
        } else if ay >= ax * TAN_67_5 {
            (idx - w, idx + w)
        } else if (self.gx[idx] > 0) == (self.gy[idx] > 0) {
            (idx - w - 1, idx + w + 1)
        } else {
            (idx - w + 1, idx + w - 1)
        };
        m > self.mag[before] && m >= self.mag[after]
    }
}

/// Binary edge map (255 on edges) with hysteresis thresholds `low <= high`.
///
/// The outermost row and column are never marked.
pub(crate) fn color_canny(img: &RgbImage, low: f32, high: f32) -> GrayImage {
    let mut out = GrayImage::new(img.width(), img.height());
    if img.width() < 3 || img.height() < 3 {
        return out;
    }
    let grad = Gradients::strongest_channel(img);
    let (w, h) = (grad.width, grad.height);

    // 0: not a candidate, 1: weak candidate, 2: edge.
    let mut state = vec![0u8; w * h];
    let mut stack = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let m = grad.mag[idx] as f32;
            if m <= low || !grad.is_ridge(idx) {
                continue;
            }
            if m > high {
                state[idx] = 2;
                stack.push(idx);
            } else {
                state[idx] = 1;
            }
        }
    }

    // Grow strong edges through 8-connected weak candidates.
    while let Some(idx) = stack.pop() {
        let (x, y) = (idx % w, idx / w);
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                let n = ny * w + nx;
                if state[n] == 1 {
                    state[n] = 2;
                    stack.push(n);
                }
            }
        }
    }

    for (px, s) in out.pixels_mut().zip(state) {
        if s == 2 {
            *px = Luma([255]);
        }
    }
    out
}
