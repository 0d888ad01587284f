//! Render-Target Layout Plan
//!
//! Pure description of every framebuffer the pipeline uses: names, sizes,
//! and attachment shapes, with no GPU resources involved. The realized
//! [`RenderTargetSet`](super::RenderTargetSet) is built from this plan, and
//! a resize is exactly "plan again, rebuild everything".

use crate::post::bloom_level_size;
use crate::settings::ShadowQuality;

use super::attachment::{AttachmentDesc, AttachmentKind, AttachmentTarget, FilterMode};

/// Bloom pyramid depth (half-resolution chain levels).
pub const BLOOM_LEVELS: usize = 6;
/// Shadow-caster slots per light class, one framebuffer each.
pub const SHADOW_SLOTS: usize = crate::settings::MAX_SHADOW_CASTERS;
/// Side length of the square avatar portrait targets.
pub const AVATAR_RESOLUTION: u32 = 512;

/// Stable identity of every framebuffer in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetName {
    /// MSAA scene target: two color attachments plus depth-stencil.
    Multisample,
    /// Resolved scene color (0) and brightness (1).
    SceneColor(usize),
    /// Omnidirectional shadow cube, one per point-light slot.
    OmniShadow(usize),
    /// Directional shadow map, one per directional/spot slot.
    DirectionalShadow(usize),
    /// Geometry buffer: position, normal, albedo, material + depth.
    GBuffer,
    /// Ambient-occlusion raw (0) and blurred (1).
    AmbientOcclusion(usize),
    /// Bloom down-sample chain level.
    BloomDown(usize),
    /// Separable-blur ping-pong pair per bloom level (`2 * level + side`).
    PingPong(usize),
    /// Bloom up-sample pair per level (`2 * level + side`).
    UpSample(usize),
    /// Double-buffered bloom accumulation.
    BloomAccum(usize),
    /// Volumetric lighting: three half-resolution stages plus full-res composite.
    Volumetric(usize),
    /// Full-resolution motion-blur output.
    MotionBlur,
    /// UI layer with its own two color planes.
    Ui,
    /// Fixed-size player portrait targets.
    Avatar(usize),
    /// Scene composite (0) and scene+UI merge (1).
    Composite(usize),
}

/// Planned shape of one framebuffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferPlan {
    /// Identity within the set.
    pub name: TargetName,
    /// Whether 2D attachments are multisampled.
    pub multisample: bool,
    /// Whether a combined depth-stencil slot is present.
    pub has_depth_stencil: bool,
    /// Whether the framebuffer owns color storage.
    pub owns_color: bool,
    /// Attachment shapes in bind order.
    pub attachments: Vec<AttachmentDesc>,
}

/// Complete layout of the target set at one screen resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlan {
    /// Screen width the plan was derived from.
    pub width: u32,
    /// Screen height the plan was derived from.
    pub height: u32,
    /// Every framebuffer, in creation order.
    pub framebuffers: Vec<FramebufferPlan>,
}

impl TargetPlan {
    /// Looks up one framebuffer plan by name.
    #[must_use]
    pub fn framebuffer(&self, name: TargetName) -> Option<&FramebufferPlan> {
        self.framebuffers.iter().find(|f| f.name == name)
    }
}

fn color(width: u32, height: u32) -> AttachmentDesc {
    AttachmentDesc {
        kind: AttachmentKind::Texture2d,
        target: AttachmentTarget::Color,
        width,
        height,
        filter: FilterMode::Linear,
    }
}

fn nearest_color(width: u32, height: u32) -> AttachmentDesc {
    AttachmentDesc {
        filter: FilterMode::Nearest,
        ..color(width, height)
    }
}

fn depth_texture(width: u32, height: u32) -> AttachmentDesc {
    AttachmentDesc {
        kind: AttachmentKind::Texture2d,
        target: AttachmentTarget::Depth,
        width,
        height,
        filter: FilterMode::Nearest,
    }
}

fn cube_depth(resolution: u32) -> AttachmentDesc {
    AttachmentDesc {
        kind: AttachmentKind::CubeMap,
        target: AttachmentTarget::Depth,
        width: resolution,
        height: resolution,
        filter: FilterMode::Linear,
    }
}

fn depth_buffer(width: u32, height: u32) -> AttachmentDesc {
    AttachmentDesc {
        kind: AttachmentKind::RenderBuffer,
        target: AttachmentTarget::Depth,
        width,
        height,
        filter: FilterMode::Nearest,
    }
}

fn depth_stencil_buffer(width: u32, height: u32) -> AttachmentDesc {
    AttachmentDesc {
        kind: AttachmentKind::RenderBuffer,
        target: AttachmentTarget::DepthStencil,
        width,
        height,
        filter: FilterMode::Nearest,
    }
}

/// Derives the full framebuffer layout for one screen resolution and the
/// current per-slot shadow qualities.
///
/// Shadow maps are sized from [`ShadowQuality::planned_resolution`], which
/// plans a placeholder size for `Off` so quality changes never alter the
/// set's shape, only attachment sizes. Each caster slot carries its own
/// quality, so two lights can shadow at different resolutions.
#[must_use]
pub fn plan_targets(
    width: u32,
    height: u32,
    directional_quality: &[ShadowQuality; SHADOW_SLOTS],
    omni_quality: &[ShadowQuality; SHADOW_SLOTS],
) -> TargetPlan {
    let mut framebuffers = Vec::with_capacity(68);

    let plain = |name: TargetName, attachments: Vec<AttachmentDesc>| FramebufferPlan {
        name,
        multisample: false,
        has_depth_stencil: false,
        owns_color: true,
        attachments,
    };

    framebuffers.push(FramebufferPlan {
        name: TargetName::Multisample,
        multisample: true,
        has_depth_stencil: true,
        owns_color: true,
        attachments: vec![
            color(width, height),
            color(width, height),
            depth_stencil_buffer(width, height),
        ],
    });

    for i in 0..2 {
        framebuffers.push(plain(TargetName::SceneColor(i), vec![color(width, height)]));
    }

    for (i, quality) in omni_quality.iter().enumerate() {
        let res = quality.planned_resolution();
        framebuffers.push(FramebufferPlan {
            name: TargetName::OmniShadow(i),
            multisample: false,
            has_depth_stencil: false,
            owns_color: false,
            attachments: vec![cube_depth(res)],
        });
    }

    for (i, quality) in directional_quality.iter().enumerate() {
        let res = quality.planned_resolution();
        framebuffers.push(FramebufferPlan {
            name: TargetName::DirectionalShadow(i),
            multisample: false,
            has_depth_stencil: false,
            owns_color: false,
            attachments: vec![depth_texture(res, res)],
        });
    }

    // Position and material planes are sampled per-texel, never interpolated.
    framebuffers.push(plain(
        TargetName::GBuffer,
        vec![
            nearest_color(width, height),
            color(width, height),
            color(width, height),
            nearest_color(width, height),
            depth_buffer(width, height),
        ],
    ));

    for i in 0..2 {
        framebuffers.push(plain(
            TargetName::AmbientOcclusion(i),
            vec![color(width, height)],
        ));
    }

    for level in 0..BLOOM_LEVELS {
        let (w, h) = bloom_level_size(width, height, level as u32);
        framebuffers.push(plain(TargetName::BloomDown(level), vec![color(w, h)]));
    }

    for i in 0..2 * BLOOM_LEVELS {
        let (w, h) = bloom_level_size(width, height, (i / 2) as u32);
        framebuffers.push(plain(TargetName::PingPong(i), vec![color(w, h)]));
    }

    // Up-sample pairs walk the pyramid back up, coarsest first, ending at
    // full resolution.
    for i in 0..2 * BLOOM_LEVELS {
        let shift = u32::try_from(BLOOM_LEVELS - 1 - i / 2).unwrap_or(0);
        let (w, h) = ((width >> shift).max(1), (height >> shift).max(1));
        framebuffers.push(plain(TargetName::UpSample(i), vec![color(w, h)]));
    }

    for i in 0..2 {
        framebuffers.push(plain(TargetName::BloomAccum(i), vec![color(width, height)]));
    }

    let (half_w, half_h) = (width.div_ceil(2).max(1), height.div_ceil(2).max(1));
    for i in 0..3 {
        framebuffers.push(plain(
            TargetName::Volumetric(i),
            vec![color(half_w, half_h)],
        ));
    }
    framebuffers.push(plain(TargetName::Volumetric(3), vec![color(width, height)]));

    framebuffers.push(plain(TargetName::MotionBlur, vec![color(width, height)]));

    framebuffers.push(plain(
        TargetName::Ui,
        vec![color(width, height), color(width, height)],
    ));

    // Portraits are flat color blits; no depth attachment.
    for i in 0..2 {
        framebuffers.push(plain(
            TargetName::Avatar(i),
            vec![color(AVATAR_RESOLUTION, AVATAR_RESOLUTION)],
        ));
    }

    framebuffers.push(plain(TargetName::Composite(0), vec![color(width, height)]));
    framebuffers.push(plain(
        TargetName::Composite(1),
        vec![color(width, height), color(width, height)],
    ));

    TargetPlan {
        width,
        height,
        framebuffers,
    }
}
