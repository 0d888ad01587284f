//! Ambient Occlusion Pass
//!
//! Screen-space AO from the G-buffer position and normal planes. The
//! hemisphere kernel and the 4x4 rotation-noise tile are generated on the
//! CPU ([`crate::post::kernel`]); the raw estimate lands in the first AO
//! plane, then an axis-separated box blur the size of the noise tile
//! ping-pongs 0 -> 1 -> 0 so the color pass always samples plane 0.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::node::RenderNode;
use crate::post::kernel::{generate_ao_kernel, generate_ao_noise, AO_NOISE_DIM};
use crate::settings::MAX_AO_SAMPLES;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::TargetName;

use super::common::{
    begin_fullscreen_pass, fullscreen_pipeline, hdr_color_target, sampler_entry, texture_entry,
    uniform_entry, Samplers,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct AoUniforms {
    view: Mat4,
    proj: Mat4,
    // x radius, y bias, z sample count, w unused.
    params: Vec4,
    noise_scale: Vec4,
    kernel: [Vec4; MAX_AO_SAMPLES as usize],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BlurUniforms {
    // xy texel size, z vertical flag, w half-width of the box.
    params: Vec4,
}

fn noise_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    // Signed 8-bit is plenty for rotation vectors.
    let texels: Vec<u8> = generate_ao_noise()
        .iter()
        .flat_map(|v| {
            v.iter()
                .map(|c| (c * 127.0).round().clamp(-127.0, 127.0) as i8 as u8)
                .collect::<Vec<u8>>()
        })
        .collect();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("AO Noise"),
        size: wgpu::Extent3d {
            width: AO_NOISE_DIM,
            height: AO_NOISE_DIM,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Snorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(AO_NOISE_DIM * 4),
            rows_per_image: None,
        },
        wgpu::Extent3d {
            width: AO_NOISE_DIM,
            height: AO_NOISE_DIM,
            depth_or_array_layers: 1,
        },
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

pub struct SsaoPass {
    ao_layout: Option<wgpu::BindGroupLayout>,
    blur_layout: Option<wgpu::BindGroupLayout>,
    ao_pipeline: Option<wgpu::RenderPipeline>,
    blur_pipeline: Option<wgpu::RenderPipeline>,
    ao_uniforms: Option<UniformBuffer<AoUniforms>>,
    blur_uniforms: Option<[UniformBuffer<BlurUniforms>; 2]>,
    noise_view: Option<wgpu::TextureView>,
    samplers: Option<Samplers>,
    ao_bind_group: Option<wgpu::BindGroup>,
    blur_bind_groups: [Option<wgpu::BindGroup>; 2],
    cached_generation: Option<u64>,
    enabled: bool,
}

impl SsaoPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ao_layout: None,
            blur_layout: None,
            ao_pipeline: None,
            blur_pipeline: None,
            ao_uniforms: None,
            blur_uniforms: None,
            noise_view: None,
            samplers: None,
            ao_bind_group: None,
            blur_bind_groups: [None, None],
            cached_generation: None,
            enabled: false,
        }
    }
}

impl Default for SsaoPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for SsaoPass {
    fn name(&self) -> &str {
        "SSAO Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        self.enabled = ctx.settings.ssao.enabled;
        if !self.enabled {
            return;
        }

        if self.ao_layout.is_none() {
            self.samplers = Some(Samplers::new(ctx.device));
            self.noise_view = Some(noise_texture(ctx.device, ctx.queue));
            self.ao_uniforms = Some(UniformBuffer::new(ctx.device, "AO Uniforms"));
            self.blur_uniforms = Some([
                UniformBuffer::new(ctx.device, "AO Blur H Uniforms"),
                UniformBuffer::new(ctx.device, "AO Blur V Uniforms"),
            ]);

            let ao_layout = ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("AO Layout"),
                    entries: &[
                        uniform_entry(0),
                        texture_entry(1),
                        texture_entry(2),
                        texture_entry(3),
                        sampler_entry(4),
                        sampler_entry(5),
                    ],
                });
            let blur_layout = ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("AO Blur Layout"),
                    entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
                });
            self.ao_pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "AO Pipeline",
                ctx.shaders.module(PassKind::Ao),
                &[&ao_layout],
                &[hdr_color_target()],
            ));
            self.blur_pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "AO Blur Pipeline",
                ctx.shaders.module(PassKind::AoBlur),
                &[&blur_layout],
                &[hdr_color_target()],
            ));
            self.ao_layout = Some(ao_layout);
            self.blur_layout = Some(blur_layout);
        }

        if self.cached_generation != Some(ctx.targets_generation) {
            let gbuffer = ctx.targets.framebuffer(TargetName::GBuffer);
            let raw_ao = ctx.targets.framebuffer(TargetName::AmbientOcclusion(0));
            let samplers = self.samplers.as_ref().unwrap();
            self.ao_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("AO Bind Group"),
                layout: self.ao_layout.as_ref().unwrap(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self
                            .ao_uniforms
                            .as_ref()
                            .unwrap()
                            .buffer()
                            .as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(gbuffer.color_view(0)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(gbuffer.color_view(1)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(
                            self.noise_view.as_ref().unwrap(),
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(&samplers.nearest),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::Sampler(&samplers.repeat),
                    },
                ],
            }));
            // Horizontal reads the raw plane, vertical reads the plane the
            // horizontal step wrote, and the result lands back in plane 0.
            let blurred_ao = ctx.targets.framebuffer(TargetName::AmbientOcclusion(1));
            for (side, source) in [raw_ao, blurred_ao].into_iter().enumerate() {
                self.blur_bind_groups[side] =
                    Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("AO Blur Bind Group"),
                        layout: self.blur_layout.as_ref().unwrap(),
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: self.blur_uniforms.as_ref().unwrap()[side]
                                    .buffer()
                                    .as_entire_binding(),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::TextureView(source.color_view(0)),
                            },
                            wgpu::BindGroupEntry {
                                binding: 2,
                                resource: wgpu::BindingResource::Sampler(&samplers.linear),
                            },
                        ],
                    }));
            }
            self.cached_generation = Some(ctx.targets_generation);
        }

        let sample_count = ctx.settings.ssao.sample_count();
        let kernel = generate_ao_kernel(sample_count);
        let mut uniforms = AoUniforms {
            view: ctx.scene.camera.view,
            proj: ctx.scene.camera.projection,
            params: Vec4::new(
                ctx.settings.ssao.radius,
                ctx.settings.ssao.bias,
                sample_count as f32,
                0.0,
            ),
            noise_scale: Vec4::new(
                ctx.targets.width() as f32 / AO_NOISE_DIM as f32,
                ctx.targets.height() as f32 / AO_NOISE_DIM as f32,
                0.0,
                0.0,
            ),
            kernel: [Vec4::ZERO; MAX_AO_SAMPLES as usize],
        };
        for (slot, sample) in uniforms.kernel.iter_mut().zip(kernel) {
            *slot = sample;
        }
        self.ao_uniforms.as_ref().unwrap().write(ctx.queue, &uniforms);

        let texel = Vec4::new(
            1.0 / ctx.targets.width() as f32,
            1.0 / ctx.targets.height() as f32,
            0.0,
            f32::from(u16::try_from(AO_NOISE_DIM / 2).unwrap_or(2)),
        );
        let blur_uniforms = self.blur_uniforms.as_ref().unwrap();
        blur_uniforms[0].write(ctx.queue, &BlurUniforms { params: texel });
        blur_uniforms[1].write(ctx.queue, &BlurUniforms { params: texel.with_z(1.0) });
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if !self.enabled {
            return;
        }
        let (Some(ao_pipeline), Some(blur_pipeline), Some(ao_bind)) = (
            self.ao_pipeline.as_ref(),
            self.blur_pipeline.as_ref(),
            self.ao_bind_group.as_ref(),
        ) else {
            return;
        };

        {
            let view = ctx
                .targets
                .framebuffer(TargetName::AmbientOcclusion(0))
                .color_view(0);
            let mut pass = begin_fullscreen_pass(encoder, "AO Estimate", view);
            pass.set_pipeline(ao_pipeline);
            pass.set_bind_group(0, ao_bind, &[]);
            pass.draw(0..3, 0..1);
        }
        let blur_steps = [
            ("AO Blur H", TargetName::AmbientOcclusion(1)),
            ("AO Blur V", TargetName::AmbientOcclusion(0)),
        ];
        for (side, (label, destination)) in blur_steps.into_iter().enumerate() {
            let Some(blur_bind) = self.blur_bind_groups[side].as_ref() else {
                return;
            };
            let view = ctx.targets.framebuffer(destination).color_view(0);
            let mut pass = begin_fullscreen_pass(encoder, label, view);
            pass.set_pipeline(blur_pipeline);
            pass.set_bind_group(0, blur_bind, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}
