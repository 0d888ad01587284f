//! SSAO Kernel & Noise Generation
//!
//! The ambient occlusion pass samples the G-buffer with a fixed hemisphere
//! kernel generated once at startup, decorrelated per-pixel by a small
//! tiled rotation-noise texture.
//!
//! Both generators use fixed seeds so kernels are deterministic across
//! frames and sessions.

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::post::lerp;
use crate::settings::MAX_AO_SAMPLES;

/// Edge length of the square rotation-noise tile.
pub const AO_NOISE_DIM: u32 = 4;

/// Generates the hemisphere sample kernel for the SSAO pass.
///
/// Produces `sample_count` (clamped to [`MAX_AO_SAMPLES`], with a warning
/// when clamping occurs) random vectors in the unit hemisphere (z ≥ 0),
/// normalized, scaled by a random magnitude, then scaled again by
/// `lerp(0.1, 1.0, (i/n)²)`. The quadratic fall-off biases sample density
/// toward the shaded point, where occlusion matters most.
///
/// Returned as `Vec4` (w = 0) to match the WGSL uniform array layout.
#[must_use]
pub fn generate_ao_kernel(sample_count: u32) -> Vec<Vec4> {
    if sample_count > MAX_AO_SAMPLES {
        log::warn!("AO kernel request of {sample_count} samples clamped to {MAX_AO_SAMPLES}");
    }
    let sample_count = sample_count.clamp(1, MAX_AO_SAMPLES);

    let mut rng = StdRng::seed_from_u64(42);
    let mut kernel = Vec::with_capacity(sample_count as usize);

    for i in 0..sample_count {
        // Random direction in the upper hemisphere (z >= 0)
        let mut sample = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(0.0..1.0),
        )
        .normalize();

        // Random magnitude within the hemisphere volume
        sample *= rng.random_range(f32::EPSILON..=1.0);

        // Quadratic fall-off: cluster samples near the origin
        let scale = i as f32 / sample_count as f32;
        sample *= lerp(0.1, 1.0, scale * scale);

        kernel.push(Vec4::new(sample.x, sample.y, sample.z, 0.0));
    }
    kernel
}

/// Generates the 4×4 tiled rotation-noise texels (RGBA16F as `f32` data).
///
/// Each texel encodes a random rotation vector in the XY plane (z = 0),
/// used to rotate the sample kernel per-pixel and break banding. The
/// texture is sampled with `Repeat` addressing and `Nearest` filtering.
#[must_use]
pub fn generate_ao_noise() -> Vec<[f32; 4]> {
    let mut rng = StdRng::seed_from_u64(12345);
    let count = (AO_NOISE_DIM * AO_NOISE_DIM) as usize;
    let mut noise = Vec::with_capacity(count);
    for _ in 0..count {
        noise.push([
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            0.0,
            0.0,
        ]);
    }
    noise
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_count_matches_request() {
        assert_eq!(generate_ao_kernel(50).len(), 50);
    }

    #[test]
    fn kernel_count_clamped() {
        assert_eq!(generate_ao_kernel(200).len(), MAX_AO_SAMPLES as usize);
    }

    #[test]
    fn kernel_samples_lie_in_upper_hemisphere() {
        for (i, s) in generate_ao_kernel(64).iter().enumerate() {
            assert!(s.z >= 0.0, "sample {i} has negative z: {}", s.z);
            let len = s.truncate().length();
            assert!(
                len > 0.0 && len <= 1.0,
                "sample {i} length {len} outside (0, 1]"
            );
        }
    }

    #[test]
    fn kernel_is_deterministic() {
        assert_eq!(generate_ao_kernel(16), generate_ao_kernel(16));
    }

    #[test]
    fn noise_is_planar() {
        let noise = generate_ao_noise();
        assert_eq!(noise.len(), (AO_NOISE_DIM * AO_NOISE_DIM) as usize);
        for texel in &noise {
            assert_eq!(texel[2], 0.0, "noise rotation vectors must have z = 0");
        }
    }
}
