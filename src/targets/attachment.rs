//! Framebuffer & Attachment Management
//!
//! A [`Framebuffer`] owns a set of GPU render targets bound together:
//! zero or more attachments, each a 2D texture, a cube map, or a
//! render-buffer (a render-attachment-only texture that can never be
//! sampled). All attachments within one framebuffer share one resolution.
//!
//! Lifecycle follows the full-rebuild policy: framebuffers are created at
//! startup or on resize and replaced wholesale, never partially mutated —
//! with the single exception of [`Framebuffer::update_attachment`], used
//! for dynamic shadow-quality changes on one existing attachment.

use smallvec::SmallVec;

use crate::{
    DEPTH_STENCIL_TEXTURE_FORMAT, DEPTH_TEXTURE_FORMAT, HDR_TEXTURE_FORMAT, MSAA_SAMPLE_COUNT,
};

/// What kind of GPU resource backs an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    /// A sampleable 2D texture.
    Texture2d,
    /// A 6-face cube map (omnidirectional shadow depth).
    CubeMap,
    /// A render-attachment-only texture; cheapest, never sampled.
    RenderBuffer,
}

/// Which pipeline output an attachment receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentTarget {
    /// HDR color output.
    Color,
    /// Depth-only output.
    Depth,
    /// Combined depth-stencil output.
    DepthStencil,
}

/// Sampling filter recorded per attachment and honored by the pass that
/// samples it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Bilinear filtering.
    #[default]
    Linear,
    /// Nearest-texel filtering (position/material G-buffer attachments).
    Nearest,
}

/// Shape of one attachment, independent of its GPU realization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDesc {
    /// Backing resource kind.
    pub kind: AttachmentKind,
    /// Pipeline output received.
    pub target: AttachmentTarget,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Filter used when the attachment is later sampled.
    pub filter: FilterMode,
}

impl AttachmentDesc {
    /// Texture format implied by the attachment target.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        match self.target {
            AttachmentTarget::Color => HDR_TEXTURE_FORMAT,
            AttachmentTarget::Depth => DEPTH_TEXTURE_FORMAT,
            AttachmentTarget::DepthStencil => DEPTH_STENCIL_TEXTURE_FORMAT,
        }
    }

    /// Whether this kind/target pairing is renderable at all.
    ///
    /// Cube maps are depth-only (shadow cubes); everything else is valid.
    #[must_use]
    pub fn is_supported(kind: AttachmentKind, target: AttachmentTarget) -> bool {
        !(kind == AttachmentKind::CubeMap && target != AttachmentTarget::Depth)
    }
}

/// One realized attachment: backing texture plus pre-built views.
pub struct Attachment {
    desc: AttachmentDesc,
    texture: wgpu::Texture,
    /// Full-resource view (cube view for cube maps).
    view: wgpu::TextureView,
    /// Per-face 2D views, populated for cube maps only.
    face_views: SmallVec<[wgpu::TextureView; 6]>,
}

impl Attachment {
    fn new(device: &wgpu::Device, desc: AttachmentDesc, multisample: bool) -> Self {
        let layers = if desc.kind == AttachmentKind::CubeMap { 6 } else { 1 };
        let sample_count = if multisample && desc.kind != AttachmentKind::CubeMap {
            MSAA_SAMPLE_COUNT
        } else {
            1
        };
        let usage = match desc.kind {
            AttachmentKind::RenderBuffer => wgpu::TextureUsages::RENDER_ATTACHMENT,
            _ => wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Framebuffer Attachment"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format(),
            usage,
            view_formats: &[],
        });

        let view = if desc.kind == AttachmentKind::CubeMap {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Cube Attachment View"),
                dimension: Some(wgpu::TextureViewDimension::Cube),
                ..Default::default()
            })
        } else {
            texture.create_view(&wgpu::TextureViewDescriptor::default())
        };

        let face_views = if desc.kind == AttachmentKind::CubeMap {
            (0..6)
                .map(|face| {
                    texture.create_view(&wgpu::TextureViewDescriptor {
                        label: Some("Cube Face View"),
                        dimension: Some(wgpu::TextureViewDimension::D2),
                        base_array_layer: face,
                        array_layer_count: Some(1),
                        ..Default::default()
                    })
                })
                .collect()
        } else {
            SmallVec::new()
        };

        Self {
            desc,
            texture,
            view,
            face_views,
        }
    }

    /// Attachment shape.
    #[inline]
    #[must_use]
    pub fn desc(&self) -> &AttachmentDesc {
        &self.desc
    }

    /// Full-resource view (the cube view for cube maps).
    #[inline]
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Single cube-face view.
    ///
    /// # Panics
    ///
    /// Panics when the attachment is not a cube map or `face >= 6`.
    #[inline]
    #[must_use]
    pub fn face_view(&self, face: usize) -> &wgpu::TextureView {
        &self.face_views[face]
    }

    /// Backing texture.
    #[inline]
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

/// An owned collection of attachments rendered to together.
pub struct Framebuffer {
    multisample: bool,
    has_depth_stencil: bool,
    owns_color: bool,
    attachments: Vec<Attachment>,
}

impl Framebuffer {
    /// Creates an empty framebuffer with no attachments.
    ///
    /// `multisample` makes subsequently added 2D attachments MSAA;
    /// `has_depth_stencil` and `owns_color` record the intended shape for
    /// diagnostics and plan comparison.
    #[must_use]
    pub fn new(multisample: bool, has_depth_stencil: bool, owns_color: bool) -> Self {
        Self {
            multisample,
            has_depth_stencil,
            owns_color,
            attachments: Vec::new(),
        }
    }

    /// Appends one attachment.
    ///
    /// An unsupported kind/target combination is reported and coerced to a
    /// plain 2D texture with the default filter — non-fatal, per the fixed
    /// pipeline wiring this layer runs under.
    ///
    /// # Panics
    ///
    /// Panics when the new attachment's resolution differs from the
    /// framebuffer's existing attachments (programming invariant).
    pub fn add_attachment(
        &mut self,
        device: &wgpu::Device,
        kind: AttachmentKind,
        target: AttachmentTarget,
        width: u32,
        height: u32,
        filter: FilterMode,
    ) -> usize {
        let (kind, filter) = if AttachmentDesc::is_supported(kind, target) {
            (kind, filter)
        } else {
            log::warn!(
                "unsupported attachment combination {kind:?}/{target:?}, \
                 falling back to 2D texture with default filter"
            );
            (AttachmentKind::Texture2d, FilterMode::default())
        };

        if let Some(first) = self.attachments.first() {
            assert_eq!(
                (first.desc.width, first.desc.height),
                (width, height),
                "all attachments in a framebuffer must share one resolution"
            );
        }

        let desc = AttachmentDesc {
            kind,
            target,
            width,
            height,
            filter,
        };
        self.attachments.push(Attachment::new(device, desc, self.multisample));
        self.attachments.len() - 1
    }

    /// Replaces the attachment matching `kind`/`target` with a new one at
    /// `width` × `height`, leaving every other attachment untouched.
    ///
    /// Used only for dynamic shadow-quality changes. A missing match is a
    /// wiring error and is reported without effect.
    pub fn update_attachment(
        &mut self,
        device: &wgpu::Device,
        kind: AttachmentKind,
        target: AttachmentTarget,
        width: u32,
        height: u32,
    ) {
        let multisample = self.multisample;
        match self
            .attachments
            .iter_mut()
            .find(|a| a.desc.kind == kind && a.desc.target == target)
        {
            Some(slot) => {
                let desc = AttachmentDesc {
                    width,
                    height,
                    ..slot.desc
                };
                *slot = Attachment::new(device, desc, multisample);
            }
            None => {
                log::warn!("update_attachment: no {kind:?}/{target:?} attachment to update");
            }
        }
    }

    /// Attachment by index.
    #[inline]
    #[must_use]
    pub fn attachment(&self, index: usize) -> &Attachment {
        &self.attachments[index]
    }

    /// All attachments in bind order.
    #[inline]
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// View of the `index`-th color attachment.
    #[must_use]
    pub fn color_view(&self, index: usize) -> &wgpu::TextureView {
        self.attachments
            .iter()
            .filter(|a| a.desc.target == AttachmentTarget::Color)
            .nth(index)
            .map(Attachment::view)
            .expect("framebuffer has no such color attachment")
    }

    /// View of the depth or depth-stencil attachment.
    #[must_use]
    pub fn depth_view(&self) -> &wgpu::TextureView {
        self.attachments
            .iter()
            .find(|a| a.desc.target != AttachmentTarget::Color)
            .map(Attachment::view)
            .expect("framebuffer has no depth attachment")
    }

    /// Shared resolution of all attachments, or `None` when empty.
    #[must_use]
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.attachments
            .first()
            .map(|a| (a.desc.width, a.desc.height))
    }

    /// Whether 2D attachments are multisampled.
    #[inline]
    #[must_use]
    pub fn is_multisample(&self) -> bool {
        self.multisample
    }

    /// Whether this framebuffer was declared with a depth-stencil slot.
    #[inline]
    #[must_use]
    pub fn has_depth_stencil(&self) -> bool {
        self.has_depth_stencil
    }

    /// Whether this framebuffer owns color storage.
    #[inline]
    #[must_use]
    pub fn owns_color(&self) -> bool {
        self.owns_color
    }
}
