use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// One degree in radians; the per-frame rotation increment.
pub const DEGREE: f32 = std::f32::consts::PI / 180.0;

/// Accumulated cube rotation about the X and Y axes, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub angle_x: f32,
    pub angle_y: f32,
}

impl Rotation {
    pub fn advance(&mut self, step: f32) {
        self.angle_x += step;
        self.angle_y += step;
    }
}

/// Object-to-view transform of the cube: uniform scale, then X and Y
/// rotation, then a fixed push away from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    pub scale: f32,
    pub translation: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            scale: 0.75,
            translation: Vec3::new(0.0, 0.0, -2.0),
        }
    }
}

impl ModelTransform {
    /// `T * Ry * Rx * S`: a vertex is scaled, rotated about X, rotated about Y,
    /// then translated. The order is significant.
    pub fn matrix(&self, rotation: Rotation) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_rotation_y(rotation.angle_y)
            * Mat4::from_rotation_x(rotation.angle_x)
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn corner_maps_without_rotation() {
        let m = ModelTransform::default().matrix(Rotation::default());
        let p = m.transform_point3(Vec3::splat(0.5));
        assert!(p.abs_diff_eq(Vec3::new(0.375, 0.375, -1.625), 1e-6));
    }

    #[test]
    fn rotate_x_applies_before_rotate_y() {
        let model = ModelTransform {
            scale: 1.0,
            translation: Vec3::ZERO,
        };
        let rotation = Rotation {
            angle_x: FRAC_PI_2,
            angle_y: FRAC_PI_2,
        };
        // Rx(90) takes +Y to +Z, then Ry(90) takes +Z to +X.
        let p = model.matrix(rotation).transform_point3(Vec3::Y);
        assert!(p.abs_diff_eq(Vec3::X, 1e-6), "got {p}");

        let swapped = Mat4::from_rotation_x(FRAC_PI_2) * Mat4::from_rotation_y(FRAC_PI_2);
        assert!(!swapped.transform_point3(Vec3::Y).abs_diff_eq(Vec3::X, 1e-3));
    }

    #[test]
    fn translation_is_applied_after_scale() {
        let model = ModelTransform::default();
        let origin = model.matrix(Rotation::default()).transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn advance_moves_both_axes() {
        let mut r = Rotation::default();
        r.advance(DEGREE);
        r.advance(DEGREE);
        assert!((r.angle_x - 2.0 * DEGREE).abs() < 1e-7);
        assert_eq!(r.angle_x, r.angle_y);
    }
}
