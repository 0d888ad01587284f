//! Realized Render-Target Set
//!
//! Owns every GPU framebuffer in the pipeline, built from a
//! [`TargetPlan`](super::TargetPlan). Resize is a full rebuild from a fresh
//! plan; shadow-quality changes replace only the affected shadow
//! attachments in place.

use rustc_hash::FxHashMap;

use crate::settings::ShadowQuality;

use super::attachment::{AttachmentKind, AttachmentTarget, Framebuffer};
use super::layout::{plan_targets, TargetName, TargetPlan, SHADOW_SLOTS};

/// The full set of pipeline render targets at one screen resolution.
pub struct RenderTargetSet {
    width: u32,
    height: u32,
    directional_quality: [ShadowQuality; SHADOW_SLOTS],
    omni_quality: [ShadowQuality; SHADOW_SLOTS],
    framebuffers: FxHashMap<TargetName, Framebuffer>,
}

impl RenderTargetSet {
    /// Builds every framebuffer for the given screen resolution with the
    /// default shadow qualities.
    #[must_use]
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let mut set = Self {
            width,
            height,
            directional_quality: [ShadowQuality::default(); SHADOW_SLOTS],
            omni_quality: [ShadowQuality::default(); SHADOW_SLOTS],
            framebuffers: FxHashMap::default(),
        };
        set.rebuild(device);
        set
    }

    fn rebuild(&mut self, device: &wgpu::Device) {
        let plan = self.plan();
        log::debug!(
            "building {} render targets at {}x{}",
            plan.framebuffers.len(),
            plan.width,
            plan.height
        );

        self.framebuffers.clear();
        for fb_plan in &plan.framebuffers {
            let mut fb = Framebuffer::new(
                fb_plan.multisample,
                fb_plan.has_depth_stencil,
                fb_plan.owns_color,
            );
            for a in &fb_plan.attachments {
                fb.add_attachment(device, a.kind, a.target, a.width, a.height, a.filter);
            }
            self.framebuffers.insert(fb_plan.name, fb);
        }
    }

    /// The plan this set currently realizes.
    #[must_use]
    pub fn plan(&self) -> TargetPlan {
        plan_targets(
            self.width,
            self.height,
            &self.directional_quality,
            &self.omni_quality,
        )
    }

    /// Rebuilds the whole set for a new screen resolution.
    ///
    /// Shadow targets are rebuilt too, sized from the stored qualities, so
    /// a resize never silently reverts a quality change.
    pub fn resize_screen(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.rebuild(device);
    }

    /// Switches the directional shadow map in `slot` to `quality`.
    ///
    /// `Off` leaves the existing map untouched; the passes simply stop
    /// rendering into it. Slots past the caster limit are ignored with a
    /// warning.
    pub fn set_directional_shadow_quality(
        &mut self,
        device: &wgpu::Device,
        slot: usize,
        quality: ShadowQuality,
    ) {
        if slot >= SHADOW_SLOTS {
            log::warn!("directional shadow slot {slot} out of range, ignoring quality change");
            return;
        }
        self.directional_quality[slot] = quality;
        let Some(resolution) = quality.resolution() else {
            return;
        };
        if let Some(fb) = self.framebuffers.get_mut(&TargetName::DirectionalShadow(slot)) {
            fb.update_attachment(
                device,
                AttachmentKind::Texture2d,
                AttachmentTarget::Depth,
                resolution,
                resolution,
            );
        }
    }

    /// Switches the omnidirectional shadow cube in `slot` to `quality`.
    ///
    /// `Off` leaves the existing cube untouched. Slots past the caster
    /// limit are ignored with a warning.
    pub fn set_omni_shadow_quality(
        &mut self,
        device: &wgpu::Device,
        slot: usize,
        quality: ShadowQuality,
    ) {
        if slot >= SHADOW_SLOTS {
            log::warn!("omni shadow slot {slot} out of range, ignoring quality change");
            return;
        }
        self.omni_quality[slot] = quality;
        let Some(resolution) = quality.resolution() else {
            return;
        };
        if let Some(fb) = self.framebuffers.get_mut(&TargetName::OmniShadow(slot)) {
            fb.update_attachment(
                device,
                AttachmentKind::CubeMap,
                AttachmentTarget::Depth,
                resolution,
                resolution,
            );
        }
    }

    /// Framebuffer by name.
    ///
    /// # Panics
    ///
    /// Panics when `name` is not part of the set (programming error; the
    /// set always holds every [`TargetName`]).
    #[inline]
    #[must_use]
    pub fn framebuffer(&self, name: TargetName) -> &Framebuffer {
        self.framebuffers
            .get(&name)
            .expect("render target set is missing a planned framebuffer")
    }

    /// Current screen width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Current screen height.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Screen aspect ratio.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        {
            self.width as f32 / self.height.max(1) as f32
        }
    }

    /// Stored directional shadow quality for `slot`.
    ///
    /// Out-of-range slots read as `Off`.
    #[inline]
    #[must_use]
    pub fn directional_shadow_quality(&self, slot: usize) -> ShadowQuality {
        self.directional_quality
            .get(slot)
            .copied()
            .unwrap_or(ShadowQuality::Off)
    }

    /// Stored omnidirectional shadow quality for `slot`.
    ///
    /// Out-of-range slots read as `Off`.
    #[inline]
    #[must_use]
    pub fn omni_shadow_quality(&self, slot: usize) -> ShadowQuality {
        self.omni_quality
            .get(slot)
            .copied()
            .unwrap_or(ShadowQuality::Off)
    }
}
