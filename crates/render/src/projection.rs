use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Fixed parameters of the per-eye perspective. Only the interocular distance
/// varies between passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoProjection {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Width over height of one eye's display.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the camera at which both eye images coincide.
    pub convergence: f32,
    /// Build a left-handed (+Z forward) matrix instead of the right-handed default.
    pub left_handed: bool,
}

impl Default for StereoProjection {
    fn default() -> Self {
        Self {
            fov_degrees: 40.0,
            aspect: 400.0 / 240.0,
            near: 0.01,
            far: 1000.0,
            convergence: 2.0,
            left_handed: false,
        }
    }
}

impl StereoProjection {
    /// Projection for one eye. `interocular` is signed: negative for the left eye.
    pub fn matrix(&self, interocular: f32) -> Mat4 {
        stereo_perspective(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
            interocular,
            self.convergence,
            self.left_handed,
        )
    }

    /// Checks every parameter the off-axis formula divides by.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ProjectionError::FieldOfView(self.fov_degrees));
        }
        if !(self.aspect.is_finite() && self.aspect > 0.0) {
            return Err(ProjectionError::Aspect(self.aspect));
        }
        if !(self.near > 0.0) {
            return Err(ProjectionError::Near(self.near));
        }
        if !(self.far > self.near && self.far.is_finite()) {
            return Err(ProjectionError::Far {
                near: self.near,
                far: self.far,
            });
        }
        if !(self.convergence > 0.0 && self.convergence.is_finite()) {
            return Err(ProjectionError::Convergence(self.convergence));
        }
        Ok(())
    }
}

/// A [`StereoProjection`] parameter the matrix cannot be built from.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("fov must be in (0, 180) degrees, got {0}")]
    FieldOfView(f32),
    #[error("aspect must be positive, got {0}")]
    Aspect(f32),
    #[error("near must be positive, got {0}")]
    Near(f32),
    #[error("far ({far}) must be finite and greater than near ({near})")]
    Far { near: f32, far: f32 },
    #[error("convergence must be positive, got {0}")]
    Convergence(f32),
}

/// Off-axis (asymmetric frustum) stereo perspective with depth in `[0, 1]`.
///
/// The eye sits at `x = interocular / 2` and the frustum is sheared so that
/// the plane at distance `convergence` maps to the same NDC for every eye.
/// With `interocular == 0` this is exactly [`Mat4::perspective_rh`] (or `_lh`).
pub fn stereo_perspective(
    fov_y_radians: f32,
    aspect: f32,
    near: f32,
    far: f32,
    interocular: f32,
    convergence: f32,
    left_handed: bool,
) -> Mat4 {
    let mut m = if left_handed {
        Mat4::perspective_lh(fov_y_radians, aspect, near, far)
    } else {
        Mat4::perspective_rh(fov_y_radians, aspect, near, far)
    };

    let half_width = (0.5 * fov_y_radians).tan() * aspect;
    let eye_x = 0.5 * interocular;
    let shear = eye_x / (convergence * half_width);

    // Row 0 only: x_clip = (x - eye_x) / half_width + shear * depth.
    m.z_axis.x = if left_handed { shear } else { -shear };
    m.w_axis.x = -eye_x / half_width;
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    fn ndc(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * Vec4::new(p.x, p.y, p.z, 1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn zero_separation_is_plain_perspective() {
        let p = StereoProjection::default();
        let expected = Mat4::perspective_rh(40f32.to_radians(), p.aspect, p.near, p.far);
        assert!(p.matrix(0.0).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn pure_function_of_inputs() {
        let p = StereoProjection::default();
        assert_eq!(p.matrix(-0.2), p.matrix(-0.2));
        assert_eq!(p.matrix(0.2), p.matrix(0.2));
    }

    #[test]
    fn eyes_coincide_at_convergence_plane() {
        let p = StereoProjection::default();
        let point = Vec3::new(0.0, 0.0, -p.convergence);
        let left = ndc(p.matrix(-0.2), point);
        let right = ndc(p.matrix(0.2), point);
        assert!(left.x.abs() < 1e-5);
        assert!(right.x.abs() < 1e-5);
        assert!((left.z - right.z).abs() < 1e-6);
    }

    #[test]
    fn sign_selects_eye() {
        let p = StereoProjection::default();
        let left = p.matrix(-0.2);
        let right = p.matrix(0.2);
        assert_ne!(left, right);
        assert_eq!(left.w_axis.x, -right.w_axis.x);
        assert_eq!(left.z_axis.x, -right.z_axis.x);
        // only the horizontal row differs
        assert_eq!(left.y_axis, right.y_axis);
        assert_eq!(left.z_axis.z, right.z_axis.z);
        assert_eq!(left.z_axis.w, right.z_axis.w);
    }

    #[test]
    fn near_geometry_has_crossed_disparity() {
        let p = StereoProjection::default();
        let point = Vec3::new(0.0, 0.0, -1.0);
        let left = ndc(p.matrix(-0.2), point);
        let right = ndc(p.matrix(0.2), point);
        assert!(left.x > 0.0);
        assert!(right.x < 0.0);
    }

    #[test]
    fn left_handed_converges_too() {
        let p = StereoProjection {
            left_handed: true,
            ..Default::default()
        };
        let point = Vec3::new(0.0, 0.0, p.convergence);
        assert!(ndc(p.matrix(0.25), point).x.abs() < 1e-5);
        let expected = Mat4::perspective_lh(40f32.to_radians(), p.aspect, p.near, p.far);
        assert!(p.matrix(0.0).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn slider_extremes_stay_finite() {
        let p = StereoProjection::default();
        for iod in [0.0, -0.0, 1.0 / 3.0, -1.0 / 3.0] {
            let m = p.matrix(iod);
            assert!(m.is_finite(), "non-finite matrix for iod={iod}");
        }
    }

    #[test]
    fn validate_rejects_degenerate_parameters() {
        let ok = StereoProjection::default();
        assert_eq!(ok.validate(), Ok(()));
        assert_eq!(
            StereoProjection { convergence: 0.0, ..ok }.validate(),
            Err(ProjectionError::Convergence(0.0))
        );
        assert_eq!(
            StereoProjection { near: 0.0, ..ok }.validate(),
            Err(ProjectionError::Near(0.0))
        );
        assert_eq!(
            StereoProjection { far: 0.001, ..ok }.validate(),
            Err(ProjectionError::Far { near: 0.01, far: 0.001 })
        );
        assert_eq!(
            StereoProjection { fov_degrees: 180.0, ..ok }.validate(),
            Err(ProjectionError::FieldOfView(180.0))
        );
        assert!(matches!(
            StereoProjection { aspect: f32::NAN, ..ok }.validate(),
            Err(ProjectionError::Aspect(a)) if a.is_nan()
        ));
    }
}
