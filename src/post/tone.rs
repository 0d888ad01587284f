//! Tone Mapping Operators
//!
//! The final pass maps HDR linear color into displayable range; the UI
//! compositing stage applies its own (usually [`Off`](ToneMapping::Off))
//! operator to the UI stream.
//!
//! [`ToneMapping::apply`] is the CPU reference for the WGSL curves in
//! `shaders/wgsl/final.wgsl`; tests pin the numeric behavior here.

use glam::Vec3;

/// Tone mapping operator selection, per output stream (scene vs UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToneMapping {
    /// Identity passthrough (linear output, for LDR streams such as UI).
    Off,
    /// Classic Reinhard operator with soft highlight roll-off.
    Reinhard,
    /// ACES filmic curve (Narkowicz fit).
    #[default]
    Aces,
}

impl ToneMapping {
    /// Applies the operator to a linear HDR color.
    ///
    /// [`Off`](Self::Off) reproduces the input exactly; the other
    /// operators map into `[0, 1]`.
    #[must_use]
    pub fn apply(self, color: Vec3) -> Vec3 {
        match self {
            Self::Off => color,
            Self::Reinhard => color / (color + Vec3::ONE),
            Self::Aces => aces(color),
        }
    }

    /// Shader-side operator index, matching the `switch` in `final.wgsl`.
    #[inline]
    #[must_use]
    pub fn shader_index(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::Reinhard => 1,
            Self::Aces => 2,
        }
    }

    /// Human-readable operator name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Reinhard => "Reinhard",
            Self::Aces => "ACES",
        }
    }
}

/// ACES filmic curve, Narkowicz rational fit.
///
/// `aces(x) = x(2.51x + 0.03) / (x(2.43x + 0.59) + 0.14)`, clamped to
/// `[0, 1]` per channel.
#[must_use]
fn aces(color: Vec3) -> Vec3 {
    const A: f32 = 2.51;
    const B: f32 = 0.03;
    const C: f32 = 2.43;
    const D: f32 = 0.59;
    const E: f32 = 0.14;
    let mapped = (color * (A * color + Vec3::splat(B)))
        / (color * (C * color + Vec3::splat(D)) + Vec3::splat(E));
    mapped.clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn off_is_identity() {
        let hdr = Vec3::new(3.7, 0.25, 1.0);
        assert_eq!(ToneMapping::Off.apply(hdr), hdr);
    }

    #[test]
    fn aces_matches_reference_curve() {
        // 1.0 * (2.51 + 0.03) / (2.43 + 0.59 + 0.14) = 2.54 / 3.16
        let out = ToneMapping::Aces.apply(Vec3::ONE);
        let expected = 2.54 / 3.16;
        assert!(
            (out.x - expected).abs() < EPSILON,
            "ACES(1.0) expected {expected}, got {}",
            out.x
        );
    }

    #[test]
    fn operators_map_into_display_range() {
        let hdr = Vec3::new(16.0, 4.0, 0.5);
        for op in [ToneMapping::Reinhard, ToneMapping::Aces] {
            let out = op.apply(hdr);
            for c in out.to_array() {
                assert!((0.0..=1.0).contains(&c), "{}: channel {c} out of range", op.name());
            }
        }
    }

    #[test]
    fn aces_preserves_black() {
        assert_eq!(ToneMapping::Aces.apply(Vec3::ZERO), Vec3::ZERO);
    }
}
