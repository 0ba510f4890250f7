//! Separable Gaussian smoothing for `f32` planes.
//!
//! Kernels are sampled from the continuous Gaussian and normalised to sum to
//! one. Borders use reflect-101 so a constant image stays constant.

use crate::image::{ImagePlane, ImageView};
use crate::util::math::reflect_101;
use crate::util::{RealignError, RealignResult};

/// Sigma implied by an odd kernel size when no sigma is given explicitly.
///
/// Uses the usual `0.3 * ((k - 1) / 2 - 1) + 0.8` rule, so a 15-tap kernel
/// yields a sigma of 2.6.
pub fn sigma_for_kernel_size(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Odd kernel size covering four standard deviations on each side.
pub fn kernel_size_for_sigma(sigma: f32) -> usize {
    let radius = (sigma * 4.0).round().max(1.0) as usize;
    2 * radius + 1
}

/// Builds a normalised 1D Gaussian kernel of `size` taps.
pub fn gaussian_kernel(size: usize, sigma: f32) -> RealignResult<Vec<f32>> {
    if size == 0 || size % 2 == 0 {
        return Err(RealignError::InvalidInput("gaussian kernel size must be odd"));
    }
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(RealignError::InvalidInput("gaussian sigma must be positive"));
    }
    let center = (size / 2) as f32;
    let scale = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - center;
            (x * x * scale).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for tap in kernel.iter_mut() {
        *tap /= sum;
    }
    Ok(kernel)
}

/// Convolves `src` with `kernel` along rows, then along columns.
pub fn gaussian_blur(src: ImageView<'_>, kernel: &[f32]) -> ImagePlane {
    let width = src.width();
    let height = src.height();
    let radius = (kernel.len() / 2) as isize;

    let mut horizontal = ImagePlane::zeros(width, height);
    {
        let out = horizontal.data_mut();
        for y in 0..height {
            let row_start = y * width;
            for x in 0..width {
                let mut acc = 0.0f32;
                for (k, &tap) in kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - radius, width);
                    acc += tap * src.at(sx, y);
                }
                out[row_start + x] = acc;
            }
        }
    }

    let mut dst = ImagePlane::zeros(width, height);
    {
        let tmp = horizontal.data();
        let out = dst.data_mut();
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0.0f32;
                for (k, &tap) in kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - radius, height);
                    acc += tap * tmp[sy * width + x];
                }
                out[y * width + x] = acc;
            }
        }
    }
    dst
}

/// Blurs with a kernel sized from `sigma`.
pub fn gaussian_blur_sigma(src: ImageView<'_>, sigma: f32) -> RealignResult<ImagePlane> {
    let kernel = gaussian_kernel(kernel_size_for_sigma(sigma), sigma)?;
    Ok(gaussian_blur(src, &kernel))
}
