//! Shadow View-Projection Math
//!
//! Pure matrix construction for every shadow map variant. Kept free of GPU
//! types so the face conventions and projection bounds stay unit-testable.

use glam::{Mat4, Vec3};

/// 90 degree square projection shared by all six cube faces.
#[must_use]
pub fn omni_projection(near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, far)
}

/// View matrices for the six cube faces in `+X -X +Y -Y +Z -Z` layer
/// order, following the standard cube-map up-vector convention.
#[must_use]
pub fn point_light_face_views(position: Vec3) -> [Mat4; 6] {
    let faces: [(Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Y),
        (Vec3::NEG_X, Vec3::NEG_Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::NEG_Z),
        (Vec3::Z, Vec3::NEG_Y),
        (Vec3::NEG_Z, Vec3::NEG_Y),
    ];
    faces.map(|(forward, up)| Mat4::look_at_rh(position, position + forward, up))
}

/// Orthographic view-projection for a directional caster covering a
/// world-space box of `extent` half-size around `center`.
#[must_use]
pub fn directional_view_projection(
    direction: Vec3,
    center: Vec3,
    extent: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    let direction = direction.normalize_or(Vec3::NEG_Y);
    // Pull the eye back along the light so the whole box is in front of it.
    let eye = center - direction * (far * 0.5);
    let up = if direction.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(eye, center, up);
    let projection = Mat4::orthographic_rh(-extent, extent, -extent, extent, near, far);
    projection * view
}

/// Perspective view-projection for a spot caster, with the field of view
/// derived from the cone's cosine cutoff.
#[must_use]
pub fn spot_view_projection(
    position: Vec3,
    direction: Vec3,
    cos_cutoff: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    let direction = direction.normalize_or(Vec3::NEG_Y);
    let fov = 2.0 * cos_cutoff.clamp(-1.0, 1.0).acos();
    let up = if direction.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(position, position + direction, up);
    let projection = Mat4::perspective_rh(fov.clamp(0.01, std::f32::consts::PI - 0.01), 1.0, near, far);
    projection * view
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    fn project(matrix: Mat4, point: Vec3) -> Vec3 {
        let clip = matrix * point.extend(1.0);
        clip.xyz() / clip.w
    }

    #[test]
    fn omni_projection_is_square() {
        let proj = omni_projection(0.1, 100.0);
        // A point at 45 degrees off-axis lands exactly on the frustum edge.
        let edge = project(proj, Vec3::new(-10.0, 0.0, -10.0));
        assert!((edge.x.abs() - 1.0).abs() < 1e-4, "edge.x = {}", edge.x);
    }

    #[test]
    fn cube_faces_look_along_their_axes() {
        let views = point_light_face_views(Vec3::new(1.0, 2.0, 3.0));
        let axes = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for (view, axis) in views.iter().zip(axes) {
            // A point along the face axis ends up on the view -Z axis.
            let seen = (*view * (Vec3::new(1.0, 2.0, 3.0) + axis * 5.0).extend(1.0)).xyz();
            assert!(seen.x.abs() < 1e-4 && seen.y.abs() < 1e-4, "axis {axis:?} maps to {seen:?}");
            assert!((seen.z + 5.0).abs() < 1e-4, "axis {axis:?} depth {}", seen.z);
        }
    }

    #[test]
    fn directional_projection_contains_center() {
        let vp = directional_view_projection(Vec3::new(-1.0, -1.0, 0.0), Vec3::ZERO, 10.0, 0.1, 100.0);
        let ndc = project(vp, Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-3 && ndc.y.abs() < 1e-3, "center maps to {ndc:?}");
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "center depth {}", ndc.z);
    }

    #[test]
    fn vertical_directional_light_does_not_degenerate() {
        let vp = directional_view_projection(Vec3::NEG_Y, Vec3::ZERO, 10.0, 0.1, 100.0);
        assert!(vp.is_finite(), "vertical light produced a non-finite matrix");
    }

    #[test]
    fn spot_projection_cutoff_bounds_frustum() {
        let vp = spot_view_projection(Vec3::ZERO, Vec3::NEG_Z, 0.5, 0.1, 100.0);
        // Inside the cone.
        let inside = project(vp, Vec3::new(0.0, 1.0, -10.0));
        assert!(inside.x.abs() < 1.0 && inside.y.abs() < 1.0, "inside maps to {inside:?}");
        // Well outside the cone.
        let outside = project(vp, Vec3::new(0.0, 30.0, -10.0));
        assert!(outside.y.abs() > 1.0, "outside maps to {outside:?}");
    }
}
