//! Blur & SSAO Kernel Tests
//!
//! Tests for:
//! - Gaussian and tent weight normalization, symmetry, and clamping
//! - Bilateral depth-similarity factor behavior
//! - SSAO hemisphere kernel distribution and determinism

use verger_render::post::{
    bilateral_depth_weight, generate_ao_kernel, generate_ao_noise, gaussian_weights, tent_weights,
    AO_NOISE_DIM,
};
use verger_render::settings::MAX_AO_SAMPLES;

const EPSILON: f32 = 1e-4;

fn assert_normalized(weights: &[f32]) {
    let _ = env_logger::builder().is_test(true).try_init();
    let sum: f32 = weights.iter().sum();
    assert!((sum - 1.0).abs() < EPSILON, "weights sum to {sum}");
}

fn assert_symmetric(weights: &[f32]) {
    let n = weights.len();
    for i in 0..n / 2 {
        assert!(
            (weights[i] - weights[n - 1 - i]).abs() < EPSILON,
            "weights[{}]={} != weights[{}]={}",
            i,
            weights[i],
            n - 1 - i,
            weights[n - 1 - i]
        );
    }
}

// ============================================================================
// Gaussian weights
// ============================================================================

#[test]
fn gaussian_weights_are_normalized_and_symmetric() {
    let w = gaussian_weights(4.0, 15);
    assert_eq!(w.len(), 15);
    assert_normalized(&w);
    assert_symmetric(&w);
}

#[test]
fn gaussian_weights_peak_at_center() {
    let w = gaussian_weights(2.0, 9);
    let center = w[w.len() / 2];
    for (i, weight) in w.iter().enumerate() {
        assert!(*weight <= center + EPSILON, "tap {i} exceeds center");
    }
}

#[test]
fn gaussian_even_size_rounded_up_to_odd() {
    assert_eq!(gaussian_weights(3.0, 8).len(), 9);
}

#[test]
fn gaussian_size_clamped_to_supported_range() {
    assert_eq!(gaussian_weights(3.0, 0).len(), 1);
    assert_eq!(gaussian_weights(3.0, 99).len(), 33);
}

#[test]
fn gaussian_wider_sigma_flattens_kernel() {
    let narrow = gaussian_weights(1.0, 9);
    let wide = gaussian_weights(8.0, 9);
    assert!(narrow[4] > wide[4], "narrow sigma should concentrate the center tap");
}

// ============================================================================
// Tent weights
// ============================================================================

#[test]
fn tent_weights_are_normalized_and_symmetric() {
    let w = tent_weights(15);
    assert_eq!(w.len(), 15);
    assert_normalized(&w);
    assert_symmetric(&w);
}

#[test]
fn tent_weights_fall_off_linearly() {
    let w = tent_weights(5);
    // Raw weights 1,2,3,2,1 over sum 9
    assert!((w[2] - 3.0 / 9.0).abs() < EPSILON);
    assert!((w[0] - 1.0 / 9.0).abs() < EPSILON);
}

// ============================================================================
// Bilateral depth factor
// ============================================================================

#[test]
fn bilateral_weight_is_one_for_equal_depth() {
    assert!((bilateral_depth_weight(0.0, 0.5) - 1.0).abs() < EPSILON);
}

#[test]
fn bilateral_weight_decays_across_depth_edges() {
    let near = bilateral_depth_weight(0.1, 0.5);
    let far = bilateral_depth_weight(2.0, 0.5);
    assert!(near > far);
    assert!(far < 0.01, "large depth gap should be rejected, got {far}");
}

// ============================================================================
// SSAO kernel
// ============================================================================

#[test]
fn ao_kernel_is_deterministic() {
    assert_eq!(generate_ao_kernel(64), generate_ao_kernel(64));
}

#[test]
fn ao_kernel_clamps_oversized_requests() {
    assert_eq!(
        generate_ao_kernel(MAX_AO_SAMPLES * 4).len(),
        MAX_AO_SAMPLES as usize
    );
}

#[test]
fn ao_kernel_samples_stay_in_unit_hemisphere() {
    for (i, s) in generate_ao_kernel(MAX_AO_SAMPLES).iter().enumerate() {
        assert!(s.z >= 0.0, "sample {i} below the surface plane");
        assert!(
            s.truncate().length() <= 1.0 + EPSILON,
            "sample {i} outside the unit hemisphere"
        );
        assert_eq!(s.w, 0.0);
    }
}

#[test]
fn ao_kernel_density_biased_toward_origin() {
    let kernel = generate_ao_kernel(64);
    let near_half: f32 = kernel[..32].iter().map(|s| s.truncate().length()).sum();
    let far_half: f32 = kernel[32..].iter().map(|s| s.truncate().length()).sum();
    assert!(
        near_half < far_half,
        "early samples should sit closer to the origin"
    );
}

#[test]
fn ao_noise_tile_is_planar_rotation() {
    let noise = generate_ao_noise();
    assert_eq!(noise.len(), (AO_NOISE_DIM * AO_NOISE_DIM) as usize);
    for texel in &noise {
        assert!((-1.0..1.0).contains(&texel[0]));
        assert!((-1.0..1.0).contains(&texel[1]));
        assert_eq!(texel[2], 0.0);
    }
}
