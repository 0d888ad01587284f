//! Extracted Frame Scene
//!
//! Flat, renderer-owned snapshot of everything a frame needs: camera,
//! lights, meshes, and per-mesh material parameters. The game simulation
//! hands one of these to [`Renderer::render`](crate::Renderer::render)
//! each frame so the passes never reach back into game state.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Camera snapshot for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ExtractedCamera {
    /// World-space eye position.
    pub position: Vec3,
    /// View matrix.
    pub view: Mat4,
    /// Projection matrix (near/far from the graphics settings).
    pub projection: Mat4,
    /// Previous frame's combined view-projection, for motion blur.
    pub previous_view_proj: Mat4,
}

impl ExtractedCamera {
    /// Combined view-projection.
    #[inline]
    #[must_use]
    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for ExtractedCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            previous_view_proj: Mat4::IDENTITY,
        }
    }
}

/// Light source class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Infinitely distant, direction only.
    Directional,
    /// Omnidirectional point light.
    Point,
    /// Cone-limited spot light.
    Spot,
}

/// One light, already culled and sorted by the extractor.
///
/// The first light of each class is the primary shadow caster bound to the
/// color pass.
#[derive(Debug, Clone, Copy)]
pub struct ExtractedLight {
    /// Light class.
    pub kind: LightKind,
    /// World position (ignored for directional lights).
    pub position: Vec3,
    /// Emission direction (ignored for point lights).
    pub direction: Vec3,
    /// Linear-space color.
    pub color: Vec3,
    /// Scalar intensity multiplier.
    pub intensity: f32,
    /// Constant, linear, quadratic attenuation.
    pub attenuation: Vec3,
    /// Cosine of the spot cutoff angle.
    pub spot_cos_cutoff: f32,
    /// Shadow reach for point lights.
    pub far_plane: f32,
    /// Whether this light renders into a shadow map slot.
    pub casts_shadows: bool,
}

impl Default for ExtractedLight {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            intensity: 1.0,
            attenuation: Vec3::new(1.0, 0.09, 0.032),
            spot_cos_cutoff: 0.9,
            far_plane: 100.0,
            casts_shadows: true,
        }
    }
}

/// GPU-layout light record matching the WGSL `Light` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz position, w kind (0 directional, 1 point, 2 spot).
    pub position: Vec4,
    /// xyz direction, w spot cosine cutoff.
    pub direction: Vec4,
    /// xyz color, w intensity.
    pub color: Vec4,
    /// xyz attenuation, w far plane.
    pub params: Vec4,
}

impl From<&ExtractedLight> for GpuLight {
    fn from(light: &ExtractedLight) -> Self {
        let kind = match light.kind {
            LightKind::Directional => 0.0,
            LightKind::Point => 1.0,
            LightKind::Spot => 2.0,
        };
        Self {
            position: light.position.extend(kind),
            direction: light.direction.extend(light.spot_cos_cutoff),
            color: light.color.extend(light.intensity),
            params: light.attenuation.extend(light.far_plane),
        }
    }
}

/// Material parameters for one mesh.
#[derive(Debug, Clone, Copy)]
pub struct MaterialParams {
    /// Base color with alpha.
    pub base_color: Vec4,
    /// Blinn-Phong specular exponent.
    pub shininess: f32,
    /// Blinn-Phong specular strength / PBR metallic.
    pub specular: f32,
    /// PBR roughness.
    pub roughness: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            shininess: 32.0,
            specular: 0.5,
            roughness: 0.5,
        }
    }
}

/// One mesh instance: uploaded geometry plus its frame transform.
pub struct ExtractedMesh {
    /// Interleaved position/normal/uv vertex buffer.
    pub vertex_buffer: wgpu::Buffer,
    /// 32-bit index buffer.
    pub index_buffer: wgpu::Buffer,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Model matrix.
    pub transform: Mat4,
    /// Shading parameters.
    pub material: MaterialParams,
    /// Whether the mesh renders into shadow maps.
    pub casts_shadows: bool,
}

/// Complete frame snapshot handed to the pipeline.
#[derive(Default)]
pub struct ExtractedScene {
    /// Camera state.
    pub camera: ExtractedCamera,
    /// Lights, primary casters first within each class.
    pub lights: Vec<ExtractedLight>,
    /// Mesh instances to draw.
    pub meshes: Vec<ExtractedMesh>,
}

impl ExtractedScene {
    /// First shadow-casting light of `kind`, the primary caster.
    #[must_use]
    pub fn primary_caster(&self, kind: LightKind) -> Option<&ExtractedLight> {
        self.lights
            .iter()
            .find(|l| l.kind == kind && l.casts_shadows)
    }

    /// Shadow-casting lights of `kind`, in slot order.
    pub fn casters(&self, kind: LightKind) -> impl Iterator<Item = &ExtractedLight> {
        self.lights
            .iter()
            .filter(move |l| l.kind == kind && l.casts_shadows)
    }
}

/// Vertex layout shared by every geometry pipeline.
#[must_use]
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];
    wgpu::VertexBufferLayout {
        array_stride: (8 * size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}
