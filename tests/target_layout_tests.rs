//! Render-Target Layout Tests
//!
//! Tests for:
//! - Total framebuffer count and per-family counts
//! - Bloom pyramid down-sample and up-sample sizing
//! - Per-slot shadow map sizing from quality tiers (including Off)
//! - Plan determinism and resize behavior
//! - Fixed-size targets (avatars) staying independent of screen size

use verger_render::post::bloom_level_size;
use verger_render::settings::ShadowQuality;
use verger_render::targets::{
    plan_targets, TargetName, AVATAR_RESOLUTION, BLOOM_LEVELS, SHADOW_SLOTS,
};

fn default_plan(width: u32, height: u32) -> verger_render::targets::TargetPlan {
    let _ = env_logger::builder().is_test(true).try_init();
    let qualities = [ShadowQuality::default(); SHADOW_SLOTS];
    plan_targets(width, height, &qualities, &qualities)
}

// ============================================================================
// plan_targets structure
// ============================================================================

#[test]
fn plan_contains_all_framebuffers() {
    let plan = default_plan(1920, 1080);
    assert_eq!(plan.framebuffers.len(), 68);
}

#[test]
fn plan_has_one_slot_per_shadow_caster() {
    let plan = default_plan(1280, 720);
    for i in 0..SHADOW_SLOTS {
        assert!(plan.framebuffer(TargetName::OmniShadow(i)).is_some());
        assert!(plan.framebuffer(TargetName::DirectionalShadow(i)).is_some());
    }
    assert!(plan.framebuffer(TargetName::OmniShadow(SHADOW_SLOTS)).is_none());
}

#[test]
fn multisample_target_carries_depth_stencil() {
    let plan = default_plan(800, 600);
    let ms = plan.framebuffer(TargetName::Multisample).unwrap();
    assert!(ms.multisample);
    assert!(ms.has_depth_stencil);
    assert_eq!(ms.attachments.len(), 3);
}

#[test]
fn gbuffer_has_four_color_planes_and_depth() {
    let plan = default_plan(800, 600);
    let gbuffer = plan.framebuffer(TargetName::GBuffer).unwrap();
    assert_eq!(gbuffer.attachments.len(), 5);
}

// ============================================================================
// Bloom pyramid sizing
// ============================================================================

#[test]
fn bloom_levels_halve_resolution() {
    assert_eq!(bloom_level_size(1920, 1080, 0), (960, 540));
    assert_eq!(bloom_level_size(1920, 1080, 1), (480, 270));
    assert_eq!(bloom_level_size(1920, 1080, 5), (30, 16));
}

#[test]
fn bloom_level_size_never_reaches_zero() {
    let (w, h) = bloom_level_size(4, 4, 5);
    assert_eq!((w, h), (1, 1));
}

#[test]
fn down_sample_chain_matches_level_sizes() {
    let plan = default_plan(1920, 1080);
    for level in 0..BLOOM_LEVELS {
        let fb = plan.framebuffer(TargetName::BloomDown(level)).unwrap();
        let (w, h) = bloom_level_size(1920, 1080, u32::try_from(level).unwrap());
        assert_eq!(fb.attachments[0].width, w, "level {level} width");
        assert_eq!(fb.attachments[0].height, h, "level {level} height");
    }
}

#[test]
fn ping_pong_pairs_share_their_level_size() {
    let plan = default_plan(1920, 1080);
    for level in 0..BLOOM_LEVELS {
        let a = plan.framebuffer(TargetName::PingPong(2 * level)).unwrap();
        let b = plan.framebuffer(TargetName::PingPong(2 * level + 1)).unwrap();
        assert_eq!(a.attachments[0].width, b.attachments[0].width);
        assert_eq!(a.attachments[0].height, b.attachments[0].height);
    }
}

#[test]
fn up_sample_chain_ends_at_full_resolution() {
    let plan = default_plan(1920, 1080);
    let coarsest = plan.framebuffer(TargetName::UpSample(0)).unwrap();
    assert_eq!(coarsest.attachments[0].width, 1920 >> 5);
    let finest = plan
        .framebuffer(TargetName::UpSample(2 * BLOOM_LEVELS - 1))
        .unwrap();
    assert_eq!(finest.attachments[0].width, 1920);
    assert_eq!(finest.attachments[0].height, 1080);
}

#[test]
fn up_sample_sizes_grow_monotonically() {
    let plan = default_plan(1920, 1080);
    let mut previous = 0;
    for stage in 0..BLOOM_LEVELS {
        let fb = plan.framebuffer(TargetName::UpSample(2 * stage)).unwrap();
        assert!(
            fb.attachments[0].width >= previous,
            "stage {stage} shrank: {} < {previous}",
            fb.attachments[0].width
        );
        previous = fb.attachments[0].width;
    }
}

// ============================================================================
// Shadow quality sizing
// ============================================================================

#[test]
fn shadow_maps_sized_from_quality_tier() {
    let plan = plan_targets(
        1920,
        1080,
        &[ShadowQuality::High; SHADOW_SLOTS],
        &[ShadowQuality::Small; SHADOW_SLOTS],
    );
    let dir = plan.framebuffer(TargetName::DirectionalShadow(0)).unwrap();
    assert_eq!(dir.attachments[0].width, 2048);
    let omni = plan.framebuffer(TargetName::OmniShadow(0)).unwrap();
    assert_eq!(omni.attachments[0].width, 512);
}

#[test]
fn shadow_slots_carry_independent_qualities() {
    let mut directional = [ShadowQuality::Medium; SHADOW_SLOTS];
    directional[0] = ShadowQuality::High;
    directional[3] = ShadowQuality::Tiny;
    let plan = plan_targets(
        1920,
        1080,
        &directional,
        &[ShadowQuality::Small; SHADOW_SLOTS],
    );
    let high = plan.framebuffer(TargetName::DirectionalShadow(0)).unwrap();
    assert_eq!(high.attachments[0].width, 2048);
    let tiny = plan.framebuffer(TargetName::DirectionalShadow(3)).unwrap();
    assert_eq!(tiny.attachments[0].width, 256);
    let rest = plan.framebuffer(TargetName::DirectionalShadow(1)).unwrap();
    assert_eq!(rest.attachments[0].width, 1024);
}

#[test]
fn off_quality_still_allocates_placeholder_maps() {
    let plan = plan_targets(
        1920,
        1080,
        &[ShadowQuality::Off; SHADOW_SLOTS],
        &[ShadowQuality::Off; SHADOW_SLOTS],
    );
    assert_eq!(plan.framebuffers.len(), 68);
    let dir = plan.framebuffer(TargetName::DirectionalShadow(0)).unwrap();
    assert_eq!(dir.attachments[0].width, 256);
}

#[test]
fn off_slot_keeps_placeholder_while_others_resize() {
    let mut omni = [ShadowQuality::High; SHADOW_SLOTS];
    omni[2] = ShadowQuality::Off;
    let plan = plan_targets(
        1280,
        720,
        &[ShadowQuality::Medium; SHADOW_SLOTS],
        &omni,
    );
    let off = plan.framebuffer(TargetName::OmniShadow(2)).unwrap();
    assert_eq!(off.attachments[0].width, 256);
    let on = plan.framebuffer(TargetName::OmniShadow(0)).unwrap();
    assert_eq!(on.attachments[0].width, 2048);
}

#[test]
fn quality_tiers_map_to_expected_resolutions() {
    assert_eq!(ShadowQuality::Off.resolution(), None);
    assert_eq!(ShadowQuality::Tiny.resolution(), Some(256));
    assert_eq!(ShadowQuality::Small.resolution(), Some(512));
    assert_eq!(ShadowQuality::Medium.resolution(), Some(1024));
    assert_eq!(ShadowQuality::High.resolution(), Some(2048));
}

// ============================================================================
// Determinism and resize
// ============================================================================

#[test]
fn plan_is_deterministic() {
    assert_eq!(default_plan(1366, 768), default_plan(1366, 768));
}

#[test]
fn resize_changes_screen_sized_targets_only_in_size() {
    let before = default_plan(1280, 720);
    let after = default_plan(2560, 1440);
    assert_eq!(before.framebuffers.len(), after.framebuffers.len());
    for (a, b) in before.framebuffers.iter().zip(&after.framebuffers) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.attachments.len(), b.attachments.len());
    }
}

#[test]
fn tiny_surface_plans_without_zero_sized_attachments() {
    let plan = default_plan(1, 1);
    for fb in &plan.framebuffers {
        for a in &fb.attachments {
            assert!(a.width >= 1, "{:?} has zero width", fb.name);
            assert!(a.height >= 1, "{:?} has zero height", fb.name);
        }
    }
}

#[test]
fn avatar_targets_ignore_screen_resolution() {
    for plan in [default_plan(640, 480), default_plan(3840, 2160)] {
        for i in 0..2 {
            let fb = plan.framebuffer(TargetName::Avatar(i)).unwrap();
            assert_eq!(fb.attachments[0].width, AVATAR_RESOLUTION);
            assert_eq!(fb.attachments[0].height, AVATAR_RESOLUTION);
        }
    }
}

#[test]
fn avatar_targets_are_color_only() {
    let plan = default_plan(1280, 720);
    for i in 0..2 {
        let fb = plan.framebuffer(TargetName::Avatar(i)).unwrap();
        assert_eq!(fb.attachments.len(), 1, "portraits are flat color blits");
        assert!(!fb.has_depth_stencil);
    }
}

#[test]
fn volumetric_stages_are_half_resolution_except_composite() {
    let plan = default_plan(1921, 1079);
    for i in 0..3 {
        let fb = plan.framebuffer(TargetName::Volumetric(i)).unwrap();
        assert_eq!(fb.attachments[0].width, 961);
        assert_eq!(fb.attachments[0].height, 540);
    }
    let full = plan.framebuffer(TargetName::Volumetric(3)).unwrap();
    assert_eq!(full.attachments[0].width, 1921);
    assert_eq!(full.attachments[0].height, 1079);
}
