//! Extracted Scene Tests
//!
//! Tests for:
//! - Primary shadow-caster selection per light class
//! - GPU light record packing
//! - Camera view-projection composition
//! - Tone mapping operator selection indices
//! - Frame-graph pass ordering

use glam::{Mat4, Vec3, Vec4};

use verger_render::graph::extracted::GpuLight;
use verger_render::renderer::build_frame_graph;
use verger_render::{ExtractedCamera, ExtractedLight, ExtractedScene, LightKind, ToneMapping};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Shadow caster selection
// ============================================================================

fn light(kind: LightKind, casts_shadows: bool, intensity: f32) -> ExtractedLight {
    init_logs();
    ExtractedLight {
        kind,
        casts_shadows,
        intensity,
        ..ExtractedLight::default()
    }
}

#[test]
fn primary_caster_skips_non_casting_lights() {
    let scene = ExtractedScene {
        lights: vec![
            light(LightKind::Directional, false, 1.0),
            light(LightKind::Directional, true, 2.0),
        ],
        ..ExtractedScene::default()
    };
    let primary = scene.primary_caster(LightKind::Directional).unwrap();
    assert!((primary.intensity - 2.0).abs() < f32::EPSILON);
}

#[test]
fn primary_caster_is_none_without_matching_class() {
    let scene = ExtractedScene {
        lights: vec![light(LightKind::Point, true, 1.0)],
        ..ExtractedScene::default()
    };
    assert!(scene.primary_caster(LightKind::Directional).is_none());
    assert!(scene.primary_caster(LightKind::Point).is_some());
}

#[test]
fn casters_preserve_slot_order() {
    let scene = ExtractedScene {
        lights: vec![
            light(LightKind::Point, true, 1.0),
            light(LightKind::Directional, true, 2.0),
            light(LightKind::Point, false, 3.0),
            light(LightKind::Point, true, 4.0),
        ],
        ..ExtractedScene::default()
    };
    let intensities: Vec<f32> = scene
        .casters(LightKind::Point)
        .map(|l| l.intensity)
        .collect();
    assert_eq!(intensities, vec![1.0, 4.0]);
}

// ============================================================================
// GPU light packing
// ============================================================================

#[test]
fn gpu_light_encodes_kind_in_position_w() {
    for (kind, tag) in [
        (LightKind::Directional, 0.0),
        (LightKind::Point, 1.0),
        (LightKind::Spot, 2.0),
    ] {
        let gpu = GpuLight::from(&light(kind, true, 1.0));
        assert!((gpu.position.w - tag).abs() < f32::EPSILON);
    }
}

#[test]
fn gpu_light_packs_scalars_into_vector_lanes() {
    let src = ExtractedLight {
        kind: LightKind::Spot,
        position: Vec3::new(1.0, 2.0, 3.0),
        color: Vec3::new(0.5, 0.25, 0.125),
        intensity: 8.0,
        spot_cos_cutoff: 0.8,
        far_plane: 50.0,
        ..ExtractedLight::default()
    };
    let gpu = GpuLight::from(&src);
    assert_eq!(gpu.position.truncate(), src.position);
    assert_eq!(gpu.color, Vec4::new(0.5, 0.25, 0.125, 8.0));
    assert!((gpu.direction.w - 0.8).abs() < f32::EPSILON);
    assert!((gpu.params.w - 50.0).abs() < f32::EPSILON);
}

// ============================================================================
// Camera
// ============================================================================

#[test]
fn camera_view_proj_applies_view_before_projection() {
    let camera = ExtractedCamera {
        view: Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
        projection: Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0),
        ..ExtractedCamera::default()
    };
    let clip = camera.view_proj() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    let expected = camera.projection * Vec4::new(0.0, 0.0, -5.0, 1.0);
    assert!((clip - expected).length() < 1e-5);
}

// ============================================================================
// Tone mapping selection
// ============================================================================

#[test]
fn tone_mapping_shader_indices_are_stable() {
    assert_eq!(ToneMapping::Off.shader_index(), 0);
    assert_eq!(ToneMapping::Reinhard.shader_index(), 1);
    assert_eq!(ToneMapping::Aces.shader_index(), 2);
}

// ============================================================================
// Frame-graph ordering
// ============================================================================

#[test]
fn occlusion_resolves_before_shading() {
    init_logs();
    let graph = build_frame_graph(wgpu::TextureFormat::Bgra8UnormSrgb);
    let names = graph.node_names();
    let ssao = names.iter().position(|n| *n == "SSAO Pass").unwrap();
    let color = names.iter().position(|n| *n == "Color Pass").unwrap();
    let geometry = names.iter().position(|n| *n == "Geometry Pass").unwrap();
    assert!(geometry < ssao, "occlusion needs the geometry buffer first");
    assert!(
        ssao < color,
        "shading reads the blurred occlusion plane, so it must run after it"
    );
}

#[test]
fn compositing_runs_after_every_effect_pass() {
    init_logs();
    let graph = build_frame_graph(wgpu::TextureFormat::Bgra8UnormSrgb);
    let names = graph.node_names();
    let composite = names
        .iter()
        .position(|n| *n == "Scene Composite Pass")
        .unwrap();
    for pass in ["Bloom Pass", "Volumetric Pass", "Motion Blur Pass"] {
        let index = names.iter().position(|n| *n == pass).unwrap();
        assert!(index < composite, "{pass} must feed the scene composite");
    }
    assert_eq!(*names.last().unwrap(), "Final Pass");
}
