//! Separable Blur Kernels
//!
//! Weight generation for the two-pass (horizontal then vertical) blurs used
//! by the bloom chain, the AO smoothing pass, and the volumetric bilateral
//! blur. The GPU side receives these weights as a uniform array and applies
//! them along one axis per pass.
//!
//! The bilateral variant keeps the same spatial weights but additionally
//! scales each tap by a depth-similarity factor so volumetric blurring
//! never bleeds across depth discontinuities; that factor is computed
//! per-texel in the shader, with [`bilateral_depth_weight`] as its CPU
//! reference.

/// Largest supported kernel tap count (one side + center + other side).
pub const MAX_BLUR_TAPS: usize = 33;

/// Forces a kernel size into the supported odd range `1..=MAX_BLUR_TAPS`.
#[must_use]
fn clamp_kernel_size(size: u32) -> usize {
    let size = (size as usize).clamp(1, MAX_BLUR_TAPS);
    if size.is_multiple_of(2) { size + 1 } else { size }
}

/// Normalized Gaussian weights for a separable blur.
///
/// `size` is the full tap count (made odd if necessary); `sigma` is the
/// standard deviation in texels. Weights are symmetric around the center
/// tap and sum to 1.
#[must_use]
pub fn gaussian_weights(sigma: f32, size: u32) -> Vec<f32> {
    let size = clamp_kernel_size(size);
    let sigma = sigma.max(0.1);
    let half = (size / 2) as i32;

    let mut weights = Vec::with_capacity(size);
    let mut sum = 0.0f32;
    for i in -half..=half {
        let x = i as f32;
        let w = (-(x * x) / (2.0 * sigma * sigma)).exp();
        weights.push(w);
        sum += w;
    }
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Normalized tent (triangle) weights for a separable blur.
///
/// Weights fall off linearly from the center tap to zero just past the
/// kernel edge, then are normalized to sum to 1.
#[must_use]
pub fn tent_weights(size: u32) -> Vec<f32> {
    let size = clamp_kernel_size(size);
    let half = (size / 2) as i32;

    let mut weights = Vec::with_capacity(size);
    let mut sum = 0.0f32;
    for i in -half..=half {
        let w = (half + 1 - i.abs()) as f32;
        weights.push(w);
        sum += w;
    }
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Depth-similarity factor for the bilateral blur.
///
/// `dz` is the depth difference between the center texel and the tap;
/// `sigma_depth` controls how quickly dissimilar depths are rejected.
/// Returns 1 for identical depths and decays toward 0 across edges.
#[inline]
#[must_use]
pub fn bilateral_depth_weight(dz: f32, sigma_depth: f32) -> f32 {
    let sigma = sigma_depth.max(1e-5);
    (-(dz * dz) / (2.0 * sigma * sigma)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_normalized(weights: &[f32]) {
        let sum: f32 = weights.iter().sum();
        assert!(
            (sum - 1.0).abs() < 1e-5,
            "weights should sum to 1, got {sum}"
        );
    }

    fn assert_symmetric(weights: &[f32]) {
        let n = weights.len();
        for i in 0..n / 2 {
            assert!(
                (weights[i] - weights[n - 1 - i]).abs() < 1e-6,
                "weights not symmetric at tap {i}"
            );
        }
    }

    #[test]
    fn gaussian_normalized_and_symmetric() {
        let w = gaussian_weights(4.0, 15);
        assert_eq!(w.len(), 15);
        assert_normalized(&w);
        assert_symmetric(&w);
        // Center tap dominates
        assert!(w[7] > w[0]);
    }

    #[test]
    fn tent_normalized_and_symmetric() {
        let w = tent_weights(9);
        assert_eq!(w.len(), 9);
        assert_normalized(&w);
        assert_symmetric(&w);
    }

    #[test]
    fn even_size_rounded_up_to_odd() {
        assert_eq!(gaussian_weights(2.0, 8).len(), 9);
        assert_eq!(tent_weights(4).len(), 5);
    }

    #[test]
    fn bilateral_weight_rejects_depth_edges() {
        assert!((bilateral_depth_weight(0.0, 0.05) - 1.0).abs() < 1e-6);
        assert!(bilateral_depth_weight(1.0, 0.05) < 1e-3);
    }
}
