//! Shader Registry & Uniform Buffers
//!
//! All WGSL programs are embedded at build time and compiled up front, one
//! module per pipeline pass kind. A compile failure in any program is fatal
//! at startup, caught through each module's compilation info rather than
//! the device's uncaptured-error hook.

use std::borrow::Cow;
use std::marker::PhantomData;

use bytemuck::Pod;
use rustc_hash::FxHashMap;

use crate::errors::{RenderError, Result};

/// Fullscreen-triangle vertex stage shared by all post-processing programs.
const FULLSCREEN_VS: &str = include_str!("wgsl/fullscreen.wgsl");

/// Every distinct shader program the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Forward Blinn-Phong shading.
    BlinnPhong,
    /// Forward physically based shading.
    Pbr,
    /// Depth-only shadow rendering (directional, spot, and cube faces).
    Shadow,
    /// Geometry-buffer fill.
    GBuffer,
    /// Ambient-occlusion estimation from the G-buffer.
    Ao,
    /// Ambient-occlusion noise-suppression blur.
    AoBlur,
    /// Separable Gaussian blur.
    GaussianBlur,
    /// Separable tent blur.
    TentBlur,
    /// Bloom pyramid down-sample.
    Downsample,
    /// Bloom pyramid additive up-sample.
    Upsample,
    /// Volumetric light scattering.
    Volumetric,
    /// Depth down-sample feeding the volumetric pass.
    VolumetricDownsample,
    /// Depth-aware bilateral blur for the volumetric buffer.
    BilateralBlur,
    /// Camera motion blur from reprojected depth.
    MotionBlur,
    /// Scene compositing (color + bloom + volumetrics + AO).
    CompositingScene,
    /// UI merge over the composited scene.
    CompositingUi,
    /// Final tone-mapped present.
    Final,
}

impl PassKind {
    /// All pass kinds, in compile order.
    pub const ALL: [Self; 17] = [
        Self::BlinnPhong,
        Self::Pbr,
        Self::Shadow,
        Self::GBuffer,
        Self::Ao,
        Self::AoBlur,
        Self::GaussianBlur,
        Self::TentBlur,
        Self::Downsample,
        Self::Upsample,
        Self::Volumetric,
        Self::VolumetricDownsample,
        Self::BilateralBlur,
        Self::MotionBlur,
        Self::CompositingScene,
        Self::CompositingUi,
        Self::Final,
    ];

    /// Human-readable label used for GPU objects and diagnostics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BlinnPhong => "Blinn-Phong Shader",
            Self::Pbr => "PBR Shader",
            Self::Shadow => "Shadow Shader",
            Self::GBuffer => "G-Buffer Shader",
            Self::Ao => "AO Shader",
            Self::AoBlur => "AO Blur Shader",
            Self::GaussianBlur => "Gaussian Blur Shader",
            Self::TentBlur => "Tent Blur Shader",
            Self::Downsample => "Downsample Shader",
            Self::Upsample => "Upsample Shader",
            Self::Volumetric => "Volumetric Shader",
            Self::VolumetricDownsample => "Volumetric Downsample Shader",
            Self::BilateralBlur => "Bilateral Blur Shader",
            Self::MotionBlur => "Motion Blur Shader",
            Self::CompositingScene => "Scene Compositing Shader",
            Self::CompositingUi => "UI Compositing Shader",
            Self::Final => "Final Shader",
        }
    }

    /// Whether the program is a fullscreen pass that receives the shared
    /// triangle vertex stage as a prelude.
    #[must_use]
    pub fn is_fullscreen(self) -> bool {
        !matches!(
            self,
            Self::BlinnPhong | Self::Pbr | Self::Shadow | Self::GBuffer
        )
    }

    fn source(self) -> &'static str {
        match self {
            Self::BlinnPhong => include_str!("wgsl/blinn_phong.wgsl"),
            Self::Pbr => include_str!("wgsl/pbr.wgsl"),
            Self::Shadow => include_str!("wgsl/shadow.wgsl"),
            Self::GBuffer => include_str!("wgsl/gbuffer.wgsl"),
            Self::Ao => include_str!("wgsl/ao.wgsl"),
            Self::AoBlur => include_str!("wgsl/ao_blur.wgsl"),
            Self::GaussianBlur => include_str!("wgsl/gaussian_blur.wgsl"),
            Self::TentBlur => include_str!("wgsl/tent_blur.wgsl"),
            Self::Downsample => include_str!("wgsl/downsample.wgsl"),
            Self::Upsample => include_str!("wgsl/upsample.wgsl"),
            Self::Volumetric => include_str!("wgsl/volumetric.wgsl"),
            Self::VolumetricDownsample => include_str!("wgsl/volumetric_downsample.wgsl"),
            Self::BilateralBlur => include_str!("wgsl/bilateral_blur.wgsl"),
            Self::MotionBlur => include_str!("wgsl/motion_blur.wgsl"),
            Self::CompositingScene => include_str!("wgsl/compositing_scene.wgsl"),
            Self::CompositingUi => include_str!("wgsl/compositing_ui.wgsl"),
            Self::Final => include_str!("wgsl/final.wgsl"),
        }
    }
}

/// One compiled program.
pub struct ShaderProgram {
    /// Which pass the program serves.
    pub kind: PassKind,
    /// Compiled WGSL module.
    pub module: wgpu::ShaderModule,
}

/// Holds every compiled shader module for the lifetime of the renderer.
pub struct ShaderRegistry {
    programs: FxHashMap<PassKind, ShaderProgram>,
}

impl ShaderRegistry {
    /// Compiles all embedded programs.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ShaderCompile`] for the first program that
    /// fails validation.
    pub fn new(device: &wgpu::Device) -> Result<Self> {
        let mut programs = FxHashMap::default();
        for kind in PassKind::ALL {
            let source = if kind.is_fullscreen() {
                Cow::Owned(format!("{FULLSCREEN_VS}\n{}", kind.source()))
            } else {
                Cow::Borrowed(kind.source())
            };
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kind.label()),
                source: wgpu::ShaderSource::Wgsl(source),
            });
            let info = pollster::block_on(module.get_compilation_info());
            if let Some(error) = info
                .messages
                .iter()
                .find(|m| m.message_type == wgpu::CompilationMessageType::Error)
            {
                return Err(RenderError::ShaderCompile {
                    label: kind.label(),
                    message: error.message.clone(),
                });
            }
            programs.insert(kind, ShaderProgram { kind, module });
        }
        log::info!("compiled {} shader programs", programs.len());
        Ok(Self { programs })
    }

    /// Compiled module for one pass kind.
    ///
    /// # Panics
    ///
    /// Panics when `kind` was never registered (unreachable after a
    /// successful [`ShaderRegistry::new`]).
    #[inline]
    #[must_use]
    pub fn module(&self, kind: PassKind) -> &wgpu::ShaderModule {
        &self.programs[&kind].module
    }
}

/// A typed GPU uniform buffer mirroring one `Pod` struct.
pub struct UniformBuffer<T: Pod> {
    buffer: wgpu::Buffer,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    /// Allocates an uninitialized uniform buffer sized for `T`.
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size_of::<T>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            _marker: PhantomData,
        }
    }

    /// Uploads a new value.
    pub fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    /// Underlying GPU buffer, for bind-group entries.
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighting_shaders_sample_the_occlusion_plane() {
        // Occlusion modulates ambient light at shading time, so both
        // shading models must bind and read the blurred occlusion map.
        for kind in [PassKind::BlinnPhong, PassKind::Pbr] {
            let source = kind.source();
            assert!(
                source.contains("occlusion_map"),
                "{} does not bind the occlusion map",
                kind.label()
            );
            assert!(
                source.contains("occlusion_factor"),
                "{} does not apply the occlusion factor",
                kind.label()
            );
        }
    }

    #[test]
    fn scene_compositing_does_not_reapply_occlusion() {
        let source = PassKind::CompositingScene.source();
        assert!(
            !source.contains("occlusion_texture"),
            "compositing must not multiply occlusion in a second time"
        );
    }

    #[test]
    fn occlusion_blur_runs_one_axis_per_pass() {
        let source = PassKind::AoBlur.source();
        assert!(source.contains("vec2<f32>(uniforms.params.x, 0.0)"));
        assert!(source.contains("vec2<f32>(0.0, uniforms.params.y)"));
    }

    #[test]
    fn occlusion_skips_samples_outside_the_frustum() {
        let source = PassKind::Ao.source();
        assert!(
            source.contains("sample_uv.x < 0.0 || sample_uv.x > 1.0"),
            "off-screen kernel samples must not contribute occlusion"
        );
    }
}
