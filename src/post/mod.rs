//! Post-Processing Algorithms
//!
//! CPU-side numeric building blocks of the post-processing passes:
//!
//! - [`kernel`]: SSAO hemisphere kernel and rotation-noise generation
//! - [`blur`]: separable Gaussian / tent / bilateral blur weights
//! - [`tone`]: tone mapping operators and their CPU reference curves
//!
//! Everything here is pure data and math — no GPU types — so the numeric
//! behavior of the pipeline is testable without a device. The passes in
//! [`graph::passes`](crate::graph::passes) upload these values as uniforms
//! and mirror the same formulas in WGSL.

pub mod blur;
pub mod kernel;
pub mod tone;

pub use blur::{bilateral_depth_weight, gaussian_weights, tent_weights};
pub use kernel::{generate_ao_kernel, generate_ao_noise, AO_NOISE_DIM};
pub use tone::ToneMapping;

/// Linear interpolation between `a` and `b` by `f`.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, f: f32) -> f32 {
    a + f * (b - a)
}

/// Resolution of bloom mip level `level` (0-based) for a source of
/// `width` × `height`.
///
/// The down-sample factor doubles per level: level 0 is half resolution,
/// level 5 is 1/64. Clamped to at least 1 texel per axis.
#[inline]
#[must_use]
pub fn bloom_level_size(width: u32, height: u32, level: u32) -> (u32, u32) {
    let factor = 1u32 << (level + 1);
    ((width / factor).max(1), (height / factor).max(1))
}
