//! Bloom Pass
//!
//! Six-level pyramid over the brightness plane resolved by the color pass:
//!
//! 1. Down-sample the brightness plane level by level.
//! 2. Separable blur each level through its ping-pong pair, with Gaussian
//!    or tent weights per the settings.
//! 3. Walk back up: tent-up-sample the coarser result, add the blurred
//!    level at the destination resolution, then smooth the sum through the
//!    up-sample pair.
//!
//! The final full-resolution step lands in the bloom accumulation buffer
//! whose side alternates with frame parity, so the compositor always reads
//! a fully written plane.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::graph::context::{ExecuteContext, PrepareContext};
use crate::graph::node::RenderNode;
use crate::post::blur::{gaussian_weights, tent_weights};
use crate::settings::BlurKernel;
use crate::shaders::{PassKind, UniformBuffer};
use crate::targets::{TargetName, BLOOM_LEVELS};

use super::common::{
    begin_fullscreen_pass, fullscreen_pipeline, hdr_color_target, sampler_entry, texture_entry,
    uniform_entry, Samplers,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SampleUniforms {
    // xy source texel size, z coarse blend weight.
    params: Vec4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BlurUniforms {
    // xy texel size, z horizontal flag, w tap radius.
    params: Vec4,
    weights: [Vec4; 9],
}

struct Step<T: Pod> {
    uniforms: UniformBuffer<T>,
    bind_group: wgpu::BindGroup,
}

/// One-sided blur weights packed for the shader, center tap first.
fn packed_weights(kernel: BlurKernel, sigma: f32, kernel_size: u32) -> ([Vec4; 9], f32) {
    let full = match kernel {
        BlurKernel::Gaussian => gaussian_weights(sigma, kernel_size),
        BlurKernel::Tent => tent_weights(kernel_size),
    };
    let center = full.len() / 2;
    let one_sided = &full[center..];
    let mut packed = [Vec4::ZERO; 9];
    for (index, weight) in one_sided.iter().enumerate() {
        packed[index / 4][index % 4] = *weight;
    }
    #[allow(clippy::cast_precision_loss)]
    (packed, (one_sided.len() - 1) as f32)
}

pub struct BloomPass {
    single_layout: Option<wgpu::BindGroupLayout>,
    dual_layout: Option<wgpu::BindGroupLayout>,
    downsample_pipeline: Option<wgpu::RenderPipeline>,
    upsample_pipeline: Option<wgpu::RenderPipeline>,
    gaussian_pipeline: Option<wgpu::RenderPipeline>,
    tent_pipeline: Option<wgpu::RenderPipeline>,
    samplers: Option<Samplers>,
    /// Pyramid down-sample steps, finest first.
    down: Vec<Step<SampleUniforms>>,
    /// Per-level blur, (horizontal, vertical) per level.
    down_blur: Vec<(Step<BlurUniforms>, Step<BlurUniforms>)>,
    /// Up-sample combine steps, coarsest first.
    up: Vec<Step<SampleUniforms>>,
    /// Post-combine smoothing, (horizontal, vertical) per step.
    up_blur: Vec<(Step<BlurUniforms>, Step<BlurUniforms>)>,
    cached_generation: Option<u64>,
    enabled: bool,
}

impl BloomPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            single_layout: None,
            dual_layout: None,
            downsample_pipeline: None,
            upsample_pipeline: None,
            gaussian_pipeline: None,
            tent_pipeline: None,
            samplers: None,
            down: Vec::new(),
            down_blur: Vec::new(),
            up: Vec::new(),
            up_blur: Vec::new(),
            cached_generation: None,
            enabled: false,
        }
    }

    fn single_step(
        &self,
        ctx: &PrepareContext,
        label: &'static str,
        source: &wgpu::TextureView,
    ) -> Step<SampleUniforms> {
        let uniforms = UniformBuffer::<SampleUniforms>::new(ctx.device, label);
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: self.single_layout.as_ref().unwrap(),
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
                    resource: wgpu::BindingResource::Sampler(
                        &self.samplers.as_ref().unwrap().linear,
                    ),
                },
            ],
        });
        Step {
            uniforms,
            bind_group,
        }
    }

    fn blur_step(
        &self,
        ctx: &PrepareContext,
        label: &'static str,
        source: &wgpu::TextureView,
    ) -> Step<BlurUniforms> {
        let uniforms = UniformBuffer::<BlurUniforms>::new(ctx.device, label);
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: self.single_layout.as_ref().unwrap(),
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
                    resource: wgpu::BindingResource::Sampler(
                        &self.samplers.as_ref().unwrap().linear,
                    ),
                },
            ],
        });
        Step {
            uniforms,
            bind_group,
        }
    }

    fn combine_step(
        &self,
        ctx: &PrepareContext,
        label: &'static str,
        coarse: &wgpu::TextureView,
        fine: &wgpu::TextureView,
    ) -> Step<SampleUniforms> {
        let uniforms = UniformBuffer::<SampleUniforms>::new(ctx.device, label);
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: self.dual_layout.as_ref().unwrap(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(coarse),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(fine),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(
                        &self.samplers.as_ref().unwrap().linear,
                    ),
                },
            ],
        });
        Step {
            uniforms,
            bind_group,
        }
    }

    fn rebuild_steps(&mut self, ctx: &PrepareContext) {
        let fb = |name| ctx.targets.framebuffer(name);
        let texel = |name: TargetName| {
            let (w, h) = fb(name).resolution().unwrap_or((1, 1));
            #[allow(clippy::cast_precision_loss)]
            Vec4::new(1.0 / w as f32, 1.0 / h as f32, 0.0, 0.0)
        };

        self.down.clear();
        self.down_blur.clear();
        self.up.clear();
        self.up_blur.clear();

        let brightness = TargetName::SceneColor(1);
        for level in 0..BLOOM_LEVELS {
            let source = if level == 0 {
                brightness
            } else {
                TargetName::BloomDown(level - 1)
            };
            let step = self.single_step(ctx, "Bloom Downsample", fb(source).color_view(0));
            step.uniforms.write(ctx.queue, &SampleUniforms { params: texel(source) });
            self.down.push(step);

            let horizontal = self.blur_step(
                ctx,
                "Bloom Blur H",
                fb(TargetName::BloomDown(level)).color_view(0),
            );
            let vertical = self.blur_step(
                ctx,
                "Bloom Blur V",
                fb(TargetName::PingPong(2 * level)).color_view(0),
            );
            self.down_blur.push((horizontal, vertical));
        }

        for stage in 0..BLOOM_LEVELS {
            let coarse = if stage == 0 {
                TargetName::PingPong(2 * BLOOM_LEVELS - 1)
            } else {
                TargetName::UpSample(2 * (stage - 1))
            };
            let fine = if stage == BLOOM_LEVELS - 1 {
                brightness
            } else {
                TargetName::PingPong(2 * (BLOOM_LEVELS - 2 - stage) + 1)
            };
            let step = self.combine_step(
                ctx,
                "Bloom Upsample",
                fb(coarse).color_view(0),
                fb(fine).color_view(0),
            );
            step.uniforms.write(
                ctx.queue,
                &SampleUniforms {
                    params: texel(coarse).with_z(1.0),
                },
            );
            self.up.push(step);

            let horizontal = self.blur_step(
                ctx,
                "Bloom Upsample Blur H",
                fb(TargetName::UpSample(2 * stage)).color_view(0),
            );
            let vertical = self.blur_step(
                ctx,
                "Bloom Upsample Blur V",
                fb(TargetName::UpSample(2 * stage + 1)).color_view(0),
            );
            self.up_blur.push((horizontal, vertical));
        }
    }
}

impl Default for BloomPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderNode for BloomPass {
    fn name(&self) -> &str {
        "Bloom Pass"
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        self.enabled = ctx.settings.bloom.enabled;
        if !self.enabled {
            return;
        }

        if self.single_layout.is_none() {
            self.samplers = Some(Samplers::new(ctx.device));
            let single = ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Bloom Single Layout"),
                    entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
                });
            let dual = ctx
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Bloom Dual Layout"),
                    entries: &[
                        uniform_entry(0),
                        texture_entry(1),
                        texture_entry(2),
                        sampler_entry(3),
                    ],
                });
            self.downsample_pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "Bloom Downsample Pipeline",
                ctx.shaders.module(PassKind::Downsample),
                &[&single],
                &[hdr_color_target()],
            ));
            self.gaussian_pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "Gaussian Blur Pipeline",
                ctx.shaders.module(PassKind::GaussianBlur),
                &[&single],
                &[hdr_color_target()],
            ));
            self.tent_pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "Tent Blur Pipeline",
                ctx.shaders.module(PassKind::TentBlur),
                &[&single],
                &[hdr_color_target()],
            ));
            self.upsample_pipeline = Some(fullscreen_pipeline(
                ctx.device,
                "Bloom Upsample Pipeline",
                ctx.shaders.module(PassKind::Upsample),
                &[&dual],
                &[hdr_color_target()],
            ));
            self.single_layout = Some(single);
            self.dual_layout = Some(dual);
        }

        if self.cached_generation != Some(ctx.targets_generation) {
            self.rebuild_steps(ctx);
            self.cached_generation = Some(ctx.targets_generation);
        }

        // Blur weights follow the settings, re-uploaded every frame.
        let (weights, radius) = packed_weights(
            ctx.settings.bloom.kernel,
            ctx.settings.bloom.sigma,
            ctx.settings.bloom.kernel_size,
        );
        let texel_of = |name: TargetName| {
            let (w, h) = ctx
                .targets
                .framebuffer(name)
                .resolution()
                .unwrap_or((1, 1));
            #[allow(clippy::cast_precision_loss)]
            (1.0 / w as f32, 1.0 / h as f32)
        };
        for (level, (horizontal, vertical)) in self.down_blur.iter().enumerate() {
            let (tx, ty) = texel_of(TargetName::BloomDown(level));
            horizontal.uniforms.write(
                ctx.queue,
                &BlurUniforms {
                    params: Vec4::new(tx, ty, 1.0, radius),
                    weights,
                },
            );
            vertical.uniforms.write(
                ctx.queue,
                &BlurUniforms {
                    params: Vec4::new(tx, ty, 0.0, radius),
                    weights,
                },
            );
        }
        for (stage, (horizontal, vertical)) in self.up_blur.iter().enumerate() {
            let (tx, ty) = texel_of(TargetName::UpSample(2 * stage));
            horizontal.uniforms.write(
                ctx.queue,
                &BlurUniforms {
                    params: Vec4::new(tx, ty, 1.0, radius),
                    weights,
                },
            );
            vertical.uniforms.write(
                ctx.queue,
                &BlurUniforms {
                    params: Vec4::new(tx, ty, 0.0, radius),
                    weights,
                },
            );
        }
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        if !self.enabled {
            return;
        }
        let (Some(downsample), Some(upsample)) = (
            self.downsample_pipeline.as_ref(),
            self.upsample_pipeline.as_ref(),
        ) else {
            return;
        };
        let blur = match ctx.settings.bloom.kernel {
            BlurKernel::Gaussian => self.gaussian_pipeline.as_ref(),
            BlurKernel::Tent => self.tent_pipeline.as_ref(),
        };
        let Some(blur) = blur else {
            return;
        };

        let fb = |name| ctx.targets.framebuffer(name);
        let mut fullscreen =
            |encoder: &mut wgpu::CommandEncoder,
             label: &str,
             pipeline: &wgpu::RenderPipeline,
             bind_group: &wgpu::BindGroup,
             target: TargetName| {
                let view = fb(target).color_view(0);
                let mut pass = begin_fullscreen_pass(encoder, label, view);
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                pass.draw(0..3, 0..1);
            };

        for level in 0..BLOOM_LEVELS {
            fullscreen(
                encoder,
                "Bloom Downsample",
                downsample,
                &self.down[level].bind_group,
                TargetName::BloomDown(level),
            );
            fullscreen(
                encoder,
                "Bloom Blur H",
                blur,
                &self.down_blur[level].0.bind_group,
                TargetName::PingPong(2 * level),
            );
            fullscreen(
                encoder,
                "Bloom Blur V",
                blur,
                &self.down_blur[level].1.bind_group,
                TargetName::PingPong(2 * level + 1),
            );
        }

        for stage in 0..BLOOM_LEVELS {
            fullscreen(
                encoder,
                "Bloom Upsample",
                upsample,
                &self.up[stage].bind_group,
                TargetName::UpSample(2 * stage),
            );
            fullscreen(
                encoder,
                "Bloom Upsample Blur H",
                blur,
                &self.up_blur[stage].0.bind_group,
                TargetName::UpSample(2 * stage + 1),
            );
            // The vertical half of the last stage lands in the parity side
            // of the accumulation buffer.
            let target = if stage == BLOOM_LEVELS - 1 {
                TargetName::BloomAccum(usize::from(ctx.frame_index % 2 == 1))
            } else {
                TargetName::UpSample(2 * stage)
            };
            fullscreen(
                encoder,
                "Bloom Upsample Blur V",
                blur,
                &self.up_blur[stage].1.bind_group,
                target,
            );
        }
    }
}
