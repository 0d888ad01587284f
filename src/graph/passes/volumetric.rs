//! Volumetric Lighting Pass
//!
//! Half-resolution light-shaft march against the primary directional
//! shadow map:
//!
//! 1. Down-sample the G-buffer position plane, keeping the nearest
//!    position of each 2x2 block.
//! 2. Ray-march the scattering estimate at half resolution.
//! 3. Depth-aware bilateral blur through the half-resolution ping pair.
//! 4. Box-filter the result up to the full-resolution plane the
//!    compositor samples.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::extracted::LightKind;
use crate::graph::node::RenderNode;
use crate::graph::shadow_math;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::TargetName;

use super::common::{
    begin_fullscreen_pass, fullscreen_pipeline, hdr_color_target, sampler_entry, texture_entry,
    uniform_entry, Samplers,
};
use super::shadow::DIRECTIONAL_EXTENT;

/// Ray-march step count.
const MARCH_STEPS: f32 = 32.0;
/// Per-step transmittance decay.
const MARCH_DECAY: f32 = 0.97;
/// Scattering density.
const MARCH_DENSITY: f32 = 0.05;
/// Depth sigma for the bilateral blur, in world units.
const BLUR_DEPTH_SIGMA: f32 = 0.5;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct VolumetricUniforms {
    light_view_proj: Mat4,
    camera_position: Vec4,
    light_direction: Vec4,
    light_color: Vec4,
    params: Vec4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ParamsUniforms {
    params: Vec4,
}

pub struct VolumetricPass {
    downsample_layout: Option<wgpu::BindGroupLayout>,
    scatter_layout: Option<wgpu::BindGroupLayout>,
    bilateral_layout: Option<wgpu::BindGroupLayout>,
    downsample_pipeline: Option<wgpu::RenderPipeline>,
    scatter_pipeline: Option<wgpu::RenderPipeline>,
    bilateral_pipeline: Option<wgpu::RenderPipeline>,
    upscale_pipeline: Option<wgpu::RenderPipeline>,
    samplers: Option<Samplers>,
    downsample_uniforms: Option<UniformBuffer<ParamsUniforms>>,
    scatter_uniforms: Option<UniformBuffer<VolumetricUniforms>>,
    blur_h_uniforms: Option<UniformBuffer<ParamsUniforms>>,
    blur_v_uniforms: Option<UniformBuffer<ParamsUniforms>>,
    upscale_uniforms: Option<UniformBuffer<ParamsUniforms>>,
    downsample_bind: Option<wgpu::BindGroup>,
    scatter_bind: Option<wgpu::BindGroup>,
    blur_h_bind: Option<wgpu::BindGroup>,
    blur_v_bind: Option<wgpu::BindGroup>,
    upscale_bind: Option<wgpu::BindGroup>,
    cached_generation: Option<u64>,
    enabled: bool,
}

impl VolumetricPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            downsample_layout: None,
            scatter_layout: None,
            bilateral_layout: None,
            downsample_pipeline: None,
            scatter_pipeline: None,
            bilateral_pipeline: None,
            upscale_pipeline: None,
            samplers: None,
            downsample_uniforms: None,
            scatter_uniforms: None,
            blur_h_uniforms: None,
            blur_v_uniforms: None,
            upscale_uniforms: None,
            downsample_bind: None,
            scatter_bind: None,
            blur_h_bind: None,
            blur_v_bind: None,
            upscale_bind: None,
            cached_generation: None,
            enabled: false,
        }
    }

    fn create_pipelines(&mut self, ctx: &PrepareContext) {
        self.samplers = Some(Samplers::new(ctx.device));
        self.downsample_uniforms = Some(UniformBuffer::new(ctx.device, "Volumetric Downsample"));
        self.scatter_uniforms = Some(UniformBuffer::new(ctx.device, "Volumetric Scatter"));
        self.blur_h_uniforms = Some(UniformBuffer::new(ctx.device, "Volumetric Blur H"));
        self.blur_v_uniforms = Some(UniformBuffer::new(ctx.device, "Volumetric Blur V"));
        self.upscale_uniforms = Some(UniformBuffer::new(ctx.device, "Volumetric Upscale"));

        let downsample_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Volumetric Downsample Layout"),
                    entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
                });
        let scatter_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Volumetric Scatter Layout"),
                entries: &[
                    uniform_entry(0),
                    texture_entry(1),
                    sampler_entry(2),
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Depth,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 4,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                        count: None,
                    },
                ],
            });
        let bilateral_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Volumetric Bilateral Layout"),
                    entries: &[
                        uniform_entry(0),
                        texture_entry(1),
                        texture_entry(2),
                        sampler_entry(3),
                    ],
                });

        self.downsample_pipeline = Some(fullscreen_pipeline(
            ctx.device,
            "Volumetric Downsample Pipeline",
            ctx.shaders.module(PassKind::VolumetricDownsample),
            &[&downsample_layout],
            &[hdr_color_target()],
        ));
        self.scatter_pipeline = Some(fullscreen_pipeline(
            ctx.device,
            "Volumetric Scatter Pipeline",
            ctx.shaders.module(PassKind::Volumetric),
            &[&scatter_layout],
            &[hdr_color_target()],
        ));
        self.bilateral_pipeline = Some(fullscreen_pipeline(
            ctx.device,
            "Volumetric Bilateral Pipeline",
            ctx.shaders.module(PassKind::BilateralBlur),
            &[&bilateral_layout],
            &[hdr_color_target()],
        ));
        // The plain box down-sampler doubles as the upscale blit.
        self.upscale_pipeline = Some(fullscreen_pipeline(
            ctx.device,
            "Volumetric Upscale Pipeline",
            ctx.shaders.module(PassKind::Downsample),
            &[&downsample_layout],
            &[hdr_color_target()],
        ));

        self.downsample_layout = Some(downsample_layout);
        self.scatter_layout = Some(scatter_layout);
        self.bilateral_layout = Some(bilateral_layout);
    }

    fn rebuild_bind_groups(&mut self, ctx: &PrepareContext) {
        let samplers = self.samplers.as_ref().unwrap();
        let gbuffer_position = ctx.targets.framebuffer(TargetName::GBuffer).color_view(0);
        let half_position = ctx.targets.framebuffer(TargetName::Volumetric(0)).color_view(0);
        let scatter = ctx.targets.framebuffer(TargetName::Volumetric(1)).color_view(0);
        let ping = ctx.targets.framebuffer(TargetName::Volumetric(2)).color_view(0);
        let shadow = ctx
            .targets
            .framebuffer(TargetName::DirectionalShadow(0))
            .attachment(0)
            .view();

        let single = |uniforms: &UniformBuffer<ParamsUniforms>,
                      texture: &wgpu::TextureView,
                      sampler: &wgpu::Sampler| {
            ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Volumetric Single"),
                layout: self.downsample_layout.as_ref().unwrap(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(texture),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        };
        self.downsample_bind = Some(single(
            self.downsample_uniforms.as_ref().unwrap(),
            gbuffer_position,
            &samplers.nearest,
        ));
        self.upscale_bind = Some(single(
            self.upscale_uniforms.as_ref().unwrap(),
            scatter,
            &samplers.linear,
        ));

        self.scatter_bind = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Volumetric Scatter"),
            layout: self.scatter_layout.as_ref().unwrap(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self
                        .scatter_uniforms
                        .as_ref()
                        .unwrap()
                        .buffer()
                        .as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(half_position),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&samplers.nearest),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(shadow),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&samplers.comparison),
                },
            ],
        }));

        let bilateral = |uniforms: &UniformBuffer<ParamsUniforms>, source: &wgpu::TextureView| {
            ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Volumetric Bilateral"),
                layout: self.bilateral_layout.as_ref().unwrap(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(half_position),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&samplers.linear),
                    },
                ],
            })
        };
        self.blur_h_bind = Some(bilateral(self.blur_h_uniforms.as_ref().unwrap(), scatter));
        self.blur_v_bind = Some(bilateral(self.blur_v_uniforms.as_ref().unwrap(), ping));

        // Static texel-size uniforms only change with the target set.
        #[allow(clippy::cast_precision_loss)]
        let texel_of = |name: TargetName| {
            let (w, h) = ctx
                .targets
                .framebuffer(name)
                .resolution()
                .unwrap_or((1, 1));
            (1.0 / w as f32, 1.0 / h as f32)
        };
        let (fx, fy) = texel_of(TargetName::GBuffer);
        self.downsample_uniforms.as_ref().unwrap().write(
            ctx.queue,
            &ParamsUniforms {
                params: Vec4::new(fx, fy, 0.0, 0.0),
            },
        );
        let (hx, hy) = texel_of(TargetName::Volumetric(0));
        self.blur_h_uniforms.as_ref().unwrap().write(
            ctx.queue,
            &ParamsUniforms {
                params: Vec4::new(hx, hy, 1.0, BLUR_DEPTH_SIGMA),
            },
        );
        self.blur_v_uniforms.as_ref().unwrap().write(
            ctx.queue,
            &ParamsUniforms {
                params: Vec4::new(hx, hy, 0.0, BLUR_DEPTH_SIGMA),
            },
        );
        self.upscale_uniforms.as_ref().unwrap().write(
            ctx.queue,
            &ParamsUniforms {
                params: Vec4::new(hx, hy, 0.0, 0.0),
            },
        );
    }
}

impl Default for VolumetricPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for VolumetricPass {
    fn name(&self) -> &str {
        "Volumetric Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        self.enabled = ctx.settings.volumetrics;
        if !self.enabled {
            return;
        }

        if self.downsample_layout.is_none() {
            self.create_pipelines(ctx);
        }
        if self.cached_generation != Some(ctx.targets_generation) {
            self.rebuild_bind_groups(ctx);
            self.cached_generation = Some(ctx.targets_generation);
        }

        let primary = ctx.scene.primary_caster(LightKind::Directional);
        let shadow_valid = primary.is_some()
            && ctx.settings.shadows
            && ctx.targets.directional_shadow_quality(0).resolution().is_some();
        let (light_view_proj, direction, color, intensity) = primary.map_or(
            (Mat4::IDENTITY, glam::Vec3::NEG_Y, glam::Vec3::ONE, 0.0),
            |light| {
                (
                    shadow_math::directional_view_projection(
                        light.direction,
                        glam::Vec3::ZERO,
                        DIRECTIONAL_EXTENT,
                        ctx.settings.near,
                        ctx.settings.far,
                    ),
                    light.direction,
                    light.color,
                    light.intensity,
                )
            },
        );
        self.scatter_uniforms.as_ref().unwrap().write(
            ctx.queue,
            &VolumetricUniforms {
                light_view_proj,
                camera_position: ctx.scene.camera.position.extend(1.0),
                light_direction: direction.extend(intensity),
                light_color: color.extend(MARCH_DENSITY),
                params: Vec4::new(
                    MARCH_STEPS,
                    MARCH_DECAY,
                    ctx.settings.far,
                    f32::from(u8::from(shadow_valid)),
                ),
            },
        );
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if !self.enabled {
            return;
        }
        let (Some(downsample), Some(scatter), Some(bilateral), Some(upscale)) = (
            self.downsample_pipeline.as_ref(),
            self.scatter_pipeline.as_ref(),
            self.bilateral_pipeline.as_ref(),
            self.upscale_pipeline.as_ref(),
        ) else {
            return;
        };

        let steps: [(&str, &wgpu::RenderPipeline, &Option<wgpu::BindGroup>, TargetName); 5] = [
            ("Volumetric Downsample", downsample, &self.downsample_bind, TargetName::Volumetric(0)),
            ("Volumetric Scatter", scatter, &self.scatter_bind, TargetName::Volumetric(1)),
            ("Volumetric Blur H", bilateral, &self.blur_h_bind, TargetName::Volumetric(2)),
            ("Volumetric Blur V", bilateral, &self.blur_v_bind, TargetName::Volumetric(1)),
            ("Volumetric Upscale", upscale, &self.upscale_bind, TargetName::Volumetric(3)),
        ];
        for (label, pipeline, bind_group, target) in steps {
            let Some(bind_group) = bind_group.as_ref() else {
                continue;
            };
            let view = ctx.targets.framebuffer(target).color_view(0);
            let mut pass = begin_fullscreen_pass(encoder, label, view);
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}
