//! Motion Blur Pass
//!
//! Camera-driven smear over the resolved scene color. Per-fragment
//! velocity comes from reprojecting the G-buffer position through the
//! previous frame's view-projection; the compositor picks this plane over
//! the raw scene color while the effect is enabled.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::node::RenderNode;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::TargetName;

use super::common::{
    begin_fullscreen_pass, fullscreen_pipeline, hdr_color_target, sampler_entry, texture_entry,
    uniform_entry, Samplers,
};

/// Samples along the velocity vector.
const BLUR_TAPS: f32 = 8.0;
/// Velocity clamp in uv units.
const MAX_VELOCITY: f32 = 0.05;
/// Normalization applied to the strength setting.
const STRENGTH_SCALE: f32 = 1.0 / 100.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct MotionBlurUniforms {
    previous_view_proj: Mat4,
    params: Vec4,
}

pub struct MotionBlurPass {
    layout: Option<wgpu::BindGroupLayout>,
    pipeline: Option<wgpu::RenderPipeline>,
    uniforms: Option<UniformBuffer<MotionBlurUniforms>>,
    samplers: Option<Samplers>,
    bind_group: Option<wgpu::BindGroup>,
    cached_generation: Option<u64>,
    enabled: bool,
}

impl MotionBlurPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: None,
            pipeline: None,
            uniforms: None,
            samplers: None,
            bind_group: None,
            cached_generation: None,
            enabled: false,
        }
    }
}

impl Default for MotionBlurPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for MotionBlurPass {
    fn name(&self) -> &str {
        "Motion Blur Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        self.enabled = ctx.settings.motion_blur.enabled;
        if !self.enabled {
            return;
        }

        if self.layout.is_none() {
            self.samplers = Some(Samplers::new(ctx.device));
            self.uniforms = Some(UniformBuffer::new(ctx.device, "Motion Blur Uniforms"));
            let layout = ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Motion Blur Layout"),
                    entries: &[
                        uniform_entry(0),
                        texture_entry(1),
                        texture_entry(2),
                        sampler_entry(3),
                        sampler_entry(4),
                    ],
                });
            self.pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "Motion Blur Pipeline",
                ctx.shaders.module(PassKind::MotionBlur),
                &[&layout],
                &[hdr_color_target()],
            ));
            self.layout = Some(layout);
        }

        if self.cached_generation != Some(ctx.targets_generation) {
            let samplers = self.samplers.as_ref().unwrap();
            let scene = ctx.targets.framebuffer(TargetName::SceneColor(0)).color_view(0);
            let position = ctx.targets.framebuffer(TargetName::GBuffer).color_view(0);
            self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Motion Blur Bind Group"),
                layout: self.layout.as_ref().unwrap(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniforms.as_ref().unwrap().buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(scene),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(position),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&samplers.linear),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(&samplers.nearest),
                    },
                ],
            }));
            self.cached_generation = Some(ctx.targets_generation);
        }

        self.uniforms.as_ref().unwrap().write(
            ctx.queue,
            &MotionBlurUniforms {
                previous_view_proj: ctx.scene.camera.previous_view_proj,
                params: Vec4::new(
                    ctx.settings.motion_blur.strength * STRENGTH_SCALE,
                    BLUR_TAPS,
                    MAX_VELOCITY,
                    0.0,
                ),
            },
        );
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if !self.enabled {
            return;
        }
        let (Some(pipeline), Some(bind_group)) = (self.pipeline.as_ref(), self.bind_group.as_ref())
        else {
            return;
        };
        let view = ctx.targets.framebuffer(TargetName::MotionBlur).color_view(0);
        let mut pass = begin_fullscreen_pass(encoder, "Motion Blur", view);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
