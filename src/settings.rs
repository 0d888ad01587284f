//! Graphics Quality & Effect Settings
//!
//! All quality tiers and effect toggles live in one configuration structure,
//! [`GraphicsSettings`], passed by reference into the pass orchestrator so
//! that per-frame pass behavior stays a pure function of
//! (scene, settings, render targets).
//!
//! Range-checked parameters (the SSAO sample count in particular) are
//! clamped at the setter with a warning; rendering always continues with
//! the clamped value.

use crate::post::tone::ToneMapping;

/// Maximum number of SSAO kernel samples. Requests above this are clamped.
pub const MAX_AO_SAMPLES: u32 = 128;

/// Maximum number of concurrent shadow-casting lights per kind.
///
/// Each shadow caster owns a stable framebuffer slot; lights beyond this
/// count simply cast no shadows.
pub const MAX_SHADOW_CASTERS: usize = 10;

// ---------------------------------------------------------------------------
// Quality tiers
// ---------------------------------------------------------------------------

/// Shadow map resolution tier, per light and per light kind.
///
/// The numeric value of each tier is the square shadow map edge in texels.
/// [`Off`](ShadowQuality::Off) disables shadow map updates for that light:
/// quality updates become no-ops and the existing allocation is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowQuality {
    /// No shadow map updates for this light.
    Off,
    /// 256×256
    #[default]
    Tiny,
    /// 512×512
    Small,
    /// 1024×1024
    Medium,
    /// 2048×2048
    High,
}

impl ShadowQuality {
    /// Shadow map edge length in texels, or `None` when [`Off`](Self::Off).
    #[inline]
    #[must_use]
    pub fn resolution(self) -> Option<u32> {
        match self {
            Self::Off => None,
            Self::Tiny => Some(256),
            Self::Small => Some(512),
            Self::Medium => Some(1024),
            Self::High => Some(2048),
        }
    }

    /// Resolution used when planning the target set.
    ///
    /// `Off` lights keep the default [`Tiny`](Self::Tiny) allocation so the
    /// plan stays deterministic and slots never disappear mid-session.
    #[inline]
    #[must_use]
    pub fn planned_resolution(self) -> u32 {
        self.resolution().unwrap_or(256)
    }
}

/// Shading model used by the color pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingModel {
    /// Classic Blinn-Phong specular model.
    #[default]
    BlinnPhong,
    /// Metallic/roughness physically-based shading.
    Pbr,
}

/// Separable blur kernel family used by the bloom chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlurKernel {
    /// Gaussian weights parameterized by sigma.
    #[default]
    Gaussian,
    /// Linear tent weights.
    Tent,
}

// ---------------------------------------------------------------------------
// Per-effect settings
// ---------------------------------------------------------------------------

/// Bloom configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomSettings {
    /// Whether the bloom pass chain runs at all.
    pub enabled: bool,
    /// Gaussian sigma for the per-level blur.
    pub sigma: f32,
    /// Blur kernel tap count (odd; clamped at the kernel generator).
    pub kernel_size: u32,
    /// Kernel family (Gaussian or tent).
    pub kernel: BlurKernel,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sigma: 4.0,
            kernel_size: 15,
            kernel: BlurKernel::Gaussian,
        }
    }
}

/// Screen-space ambient occlusion configuration.
///
/// The sample count is kept private so every write path goes through the
/// clamping setter.
#[derive(Debug, Clone, PartialEq)]
pub struct SsaoSettings {
    /// Whether the SSAO pass (and its blur) runs.
    pub enabled: bool,
    /// Sampling radius in view-space units.
    pub radius: f32,
    /// Depth bias preventing self-occlusion.
    pub bias: f32,
    sample_count: u32,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 1.0,
            bias: 0.025,
            sample_count: 32,
        }
    }
}

impl SsaoSettings {
    /// Sets the kernel sample count, clamped to [`MAX_AO_SAMPLES`].
    pub fn set_sample_count(&mut self, samples: u32) {
        if samples > MAX_AO_SAMPLES {
            log::warn!("SSAO sample count {samples} exceeds maximum, clamped to {MAX_AO_SAMPLES}");
        }
        self.sample_count = samples.clamp(1, MAX_AO_SAMPLES);
    }

    /// Current kernel sample count.
    #[inline]
    #[must_use]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

/// Motion blur configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionBlurSettings {
    /// Whether the motion blur pass runs.
    pub enabled: bool,
    /// Smear strength; larger values stretch the accumulation further.
    pub strength: f32,
}

impl Default for MotionBlurSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            strength: 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// GraphicsSettings
// ---------------------------------------------------------------------------

/// The full quality/effect configuration consumed by the orchestrator.
///
/// One instance lives on the [`Renderer`](crate::Renderer); collaborators
/// mutate it between frames through `settings_mut()`. Pass behavior reads
/// it immutably during the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsSettings {
    /// Tone mapping operator applied to the scene stream at the final pass.
    pub scene_tone_mapping: ToneMapping,
    /// Tone mapping operator applied to the UI stream at UI compositing.
    pub ui_tone_mapping: ToneMapping,
    /// Near clip plane shared by every projection this layer builds.
    pub near: f32,
    /// Far clip plane shared by every projection this layer builds.
    pub far: f32,
    /// Shading model for the color pass.
    pub shading: ShadingModel,
    /// Global shadow toggle; disables both shadow pass kinds.
    pub shadows: bool,
    /// Bloom pass chain configuration.
    pub bloom: BloomSettings,
    /// SSAO configuration.
    pub ssao: SsaoSettings,
    /// Whether the volumetric lighting pass runs.
    pub volumetrics: bool,
    /// Motion blur configuration.
    pub motion_blur: MotionBlurSettings,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            scene_tone_mapping: ToneMapping::Aces,
            ui_tone_mapping: ToneMapping::Off,
            near: 0.1,
            far: 100.0,
            shading: ShadingModel::BlinnPhong,
            shadows: true,
            bloom: BloomSettings::default(),
            ssao: SsaoSettings::default(),
            volumetrics: true,
            motion_blur: MotionBlurSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssao_sample_count_clamped_to_max() {
        let mut ssao = SsaoSettings::default();
        ssao.set_sample_count(200);
        assert_eq!(ssao.sample_count(), MAX_AO_SAMPLES);
    }

    #[test]
    fn ssao_sample_count_in_range_kept() {
        let mut ssao = SsaoSettings::default();
        ssao.set_sample_count(50);
        assert_eq!(ssao.sample_count(), 50);
    }

    #[test]
    fn shadow_quality_off_has_no_resolution() {
        assert_eq!(ShadowQuality::Off.resolution(), None);
        assert_eq!(ShadowQuality::Off.planned_resolution(), 256);
        assert_eq!(ShadowQuality::High.resolution(), Some(2048));
    }
}
