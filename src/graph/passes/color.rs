//! Color Pass
//!
//! Forward-shades the scene into the multisampled target, resolving both
//! planes in the same pass: attachment 0 resolves into the scene color
//! buffer, attachment 1 into the over-threshold brightness buffer that
//! seeds the bloom chain.
//!
//! The frame bind group holds the primary directional and primary point
//! shadow maps plus the blurred ambient-occlusion plane; secondary casters
//! light the scene without shadowing.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::extracted::{vertex_buffer_layout, GpuLight, LightKind};
use crate::graph::node::RenderNode;
use crate::graph::shadow_math;
use crate::settings::ShadingModel;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::TargetName;
use crate::{
    DEPTH_STENCIL_TEXTURE_FORMAT, HDR_TEXTURE_FORMAT, MSAA_SAMPLE_COUNT,
};

use super::common::{CameraUniform, MaterialUniform, ModelUniform, ObjectUniformPool, Samplers};

/// Lights bound per frame; further lights are dropped by the extractor.
pub const MAX_LIGHTS: usize = 16;

/// Luminance above which a fragment feeds the bloom chain.
const BRIGHTNESS_THRESHOLD: f32 = 1.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct LightsUniform {
    count: [u32; 4],
    lights: [GpuLight; MAX_LIGHTS],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ShadowingUniform {
    light_view_proj: Mat4,
    // x near, y far, z directional map valid, w omni map valid.
    params: Vec4,
    // x occlusion on, yz screen size.
    effects: Vec4,
}

pub struct ColorPass {
    frame_layout: Option<wgpu::BindGroupLayout>,
    frame_bind_group: Option<wgpu::BindGroup>,
    camera_uniform: Option<UniformBuffer<CameraUniform>>,
    lights_uniform: Option<UniformBuffer<LightsUniform>>,
    shadowing_uniform: Option<UniformBuffer<ShadowingUniform>>,
    samplers: Option<Samplers>,
    blinn_pipeline: Option<wgpu::RenderPipeline>,
    pbr_pipeline: Option<wgpu::RenderPipeline>,
    models: Option<ObjectUniformPool<ModelUniform>>,
    materials: Option<ObjectUniformPool<MaterialUniform>>,
    cached_generation: Option<u64>,
    mesh_count: usize,
}

impl ColorPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_layout: None,
            frame_bind_group: None,
            camera_uniform: None,
            lights_uniform: None,
            shadowing_uniform: None,
            samplers: None,
            blinn_pipeline: None,
            pbr_pipeline: None,
            models: None,
            materials: None,
            cached_generation: None,
            mesh_count: 0,
        }
    }

    fn frame_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let uniform = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Color Frame Layout"),
            entries: &[
                uniform(0),
                uniform(1),
                uniform(2),
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
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 6,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 7,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    fn geometry_pipeline(
        device: &wgpu::Device,
        label: &str,
        module: &wgpu::ShaderModule,
        layouts: &[&wgpu::BindGroupLayout],
    ) -> wgpu::RenderPipeline {
        let layouts: Vec<Option<&wgpu::BindGroupLayout>> =
            layouts.iter().map(|l| Some(*l)).collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });
        let color_target = Some(wgpu::ColorTargetState {
            format: HDR_TEXTURE_FORMAT,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[vertex_buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                targets: &[color_target.clone(), color_target],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_STENCIL_TEXTURE_FORMAT,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: MSAA_SAMPLE_COUNT,
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        })
    }
}

impl Default for ColorPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for ColorPass {
    fn name(&self) -> &str {
        "Color Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        if self.frame_layout.is_none() {
            self.frame_layout = Some(Self::frame_layout(ctx.device));
            self.samplers = Some(Samplers::new(ctx.device));
            self.camera_uniform = Some(UniformBuffer::new(ctx.device, "Color Camera"));
            self.lights_uniform = Some(UniformBuffer::new(ctx.device, "Color Lights"));
            self.shadowing_uniform = Some(UniformBuffer::new(ctx.device, "Color Shadowing"));
            self.models = Some(ObjectUniformPool::new(ctx.device, "Color Model Uniform"));
            self.materials = Some(ObjectUniformPool::new(ctx.device, "Color Material Uniform"));
        }
        if self.blinn_pipeline.is_none() {
            let frame_layout = self.frame_layout.as_ref().unwrap();
            let layouts = [
                frame_layout,
                self.models.as_ref().unwrap().layout(),
                self.materials.as_ref().unwrap().layout(),
            ];
            self.blinn_pipeline = Some(Self::geometry_pipeline(
                ctx.device,
                "Blinn-Phong Pipeline",
                ctx.shaders.module(PassKind::BlinnPhong),
                &layouts,
            ));
            self.pbr_pipeline = Some(Self::geometry_pipeline(
                ctx.device,
                "PBR Pipeline",
                ctx.shaders.module(PassKind::Pbr),
                &layouts,
            ));
        }

        // Shadow map views change identity on resize and quality changes.
        if self.cached_generation != Some(ctx.targets_generation) {
            let directional = ctx
                .targets
                .framebuffer(TargetName::DirectionalShadow(0))
                .attachment(0);
            let omni = ctx.targets.framebuffer(TargetName::OmniShadow(0)).attachment(0);
            let occlusion = ctx
                .targets
                .framebuffer(TargetName::AmbientOcclusion(0))
                .color_view(0);
            let samplers = self.samplers.as_ref().unwrap();
            self.frame_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Color Frame"),
                layout: self.frame_layout.as_ref().unwrap(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self
                            .camera_uniform
                            .as_ref()
                            .unwrap()
                            .buffer()
                            .as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self
                            .lights_uniform
                            .as_ref()
                            .unwrap()
                            .buffer()
                            .as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self
                            .shadowing_uniform
                            .as_ref()
                            .unwrap()
                            .buffer()
                            .as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(directional.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(omni.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::Sampler(&samplers.comparison),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::TextureView(occlusion),
                    },
                    wgpu::BindGroupEntry {
                        binding: 7,
                        resource: wgpu::BindingResource::Sampler(&samplers.linear),
                    },
                ],
            }));
            self.cached_generation = Some(ctx.targets_generation);
        }

        self.camera_uniform.as_ref().unwrap().write(
            ctx.queue,
            &CameraUniform {
                view_proj: ctx.scene.camera.view_proj(),
                position: ctx.scene.camera.position.extend(1.0),
            },
        );

        let mut lights = LightsUniform {
            count: [0; 4],
            lights: [GpuLight::zeroed(); MAX_LIGHTS],
        };
        for (index, light) in ctx.scene.lights.iter().take(MAX_LIGHTS).enumerate() {
            lights.lights[index] = GpuLight::from(light);
            lights.count[0] = u32::try_from(index + 1).unwrap_or(0);
        }
        self.lights_uniform.as_ref().unwrap().write(ctx.queue, &lights);

        let shadows_on = ctx.settings.shadows;
        let directional_on = shadows_on
            && ctx.targets.directional_shadow_quality(0).resolution().is_some()
            && ctx.scene.primary_caster(LightKind::Directional).is_some();
        let omni_on = shadows_on
            && ctx.targets.omni_shadow_quality(0).resolution().is_some()
            && ctx.scene.primary_caster(LightKind::Point).is_some();
        let light_view_proj = ctx
            .scene
            .primary_caster(LightKind::Directional)
            .map_or(Mat4::IDENTITY, |light| {
                shadow_math::directional_view_projection(
                    light.direction,
                    glam::Vec3::ZERO,
                    super::shadow::DIRECTIONAL_EXTENT,
                    ctx.settings.near,
                    ctx.settings.far,
                )
            });
        self.shadowing_uniform.as_ref().unwrap().write(
            ctx.queue,
            &ShadowingUniform {
                light_view_proj,
                params: Vec4::new(
                    ctx.settings.near,
                    ctx.settings.far,
                    f32::from(u8::from(directional_on)),
                    f32::from(u8::from(omni_on)),
                ),
                effects: Vec4::new(
                    f32::from(u8::from(ctx.settings.ssao.enabled)),
                    ctx.targets.width() as f32,
                    ctx.targets.height() as f32,
                    0.0,
                ),
            },
        );

        let models = self.models.as_mut().unwrap();
        let materials = self.materials.as_mut().unwrap();
        models.ensure(ctx.device, ctx.scene.meshes.len());
        materials.ensure(ctx.device, ctx.scene.meshes.len());
        for (index, mesh) in ctx.scene.meshes.iter().enumerate() {
            models.write(ctx.queue, index, &ModelUniform::from_transform(mesh.transform));
            let params = match ctx.settings.shading {
                ShadingModel::BlinnPhong => Vec4::new(
                    mesh.material.shininess,
                    mesh.material.specular,
                    BRIGHTNESS_THRESHOLD,
                    0.0,
                ),
                ShadingModel::Pbr => Vec4::new(
                    mesh.material.specular,
                    mesh.material.roughness,
                    BRIGHTNESS_THRESHOLD,
                    0.0,
                ),
            };
            materials.write(
                ctx.queue,
                index,
                &MaterialUniform {
                    base_color: mesh.material.base_color,
                    params,
                },
            );
        }
        self.mesh_count = ctx.scene.meshes.len();
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let (Some(frame), Some(models), Some(materials)) = (
            self.frame_bind_group.as_ref(),
            self.models.as_ref(),
            self.materials.as_ref(),
        ) else {
            return;
        };
        let pipeline = match ctx.settings.shading {
            ShadingModel::BlinnPhong => self.blinn_pipeline.as_ref(),
            ShadingModel::Pbr => self.pbr_pipeline.as_ref(),
        };
        let Some(pipeline) = pipeline else {
            return;
        };

        let msaa = ctx.targets.framebuffer(TargetName::Multisample);
        let scene_color = ctx.targets.framebuffer(TargetName::SceneColor(0));
        let brightness = ctx.targets.framebuffer(TargetName::SceneColor(1));
        let ops = wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            store: wgpu::StoreOp::Store,
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Color"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: msaa.color_view(0),
                    depth_slice: None,
                    resolve_target: Some(scene_color.color_view(0)),
                    ops,
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: msaa.color_view(1),
                    depth_slice: None,
                    resolve_target: Some(brightness.color_view(0)),
                    ops,
                }),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: msaa.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, frame, &[]);
        for (index, mesh) in ctx.scene.meshes.iter().enumerate().take(self.mesh_count) {
            pass.set_bind_group(1, models.bind_group(index), &[]);
            pass.set_bind_group(2, materials.bind_group(index), &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}
