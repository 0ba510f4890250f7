//! Low-level building blocks for custom pipelines.
//!
//! These expose the scale space, blur kernels, distance kernels and the raw
//! ratio-test search. Most users should prefer [`crate::Pipeline`] or
//! [`crate::Aligner`].

pub use crate::image::blur::{
    gaussian_blur, gaussian_blur_sigma, gaussian_kernel, kernel_size_for_sigma,
    sigma_for_kernel_size,
};
pub use crate::image::pyramid::{Octave, ScaleSpace, ScaleSpaceParams};
pub use crate::image::{ImagePlane, ImageView};
pub use crate::kernel::scalar::ScalarL2;
pub use crate::kernel::{nearest_two, DistanceKernel, Neighbor};
pub use crate::matching::ratio_matches;
pub use crate::overlay::mean_intensity;

#[cfg(feature = "simd")]
pub use crate::kernel::simd::SimdL2;

#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::ratio_matches_par;
