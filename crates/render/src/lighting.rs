use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Number of samples in a specular lookup table.
pub const LUT_SIZE: usize = 256;

/// Surface response coefficients, per RGB channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular0: Vec3,
    pub specular1: Vec3,
    pub emission: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.4),
            specular0: Vec3::splat(0.8),
            specular1: Vec3::ZERO,
            emission: Vec3::ZERO,
        }
    }
}

/// A single light. `position.w == 0` makes it directional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec4,
    pub color: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec4::new(16.0, 0.5, 0.0, 0.0),
            color: Vec3::ONE,
        }
    }
}

impl Light {
    pub fn is_directional(&self) -> bool {
        self.position.w == 0.0
    }

    /// Unit vector from a surface point towards the light, in view space.
    pub fn direction_from(&self, point: Vec3) -> Vec3 {
        if self.is_directional() {
            self.position.truncate().normalize_or_zero()
        } else {
            (self.position.truncate() - point).normalize_or_zero()
        }
    }
}

/// Precomputed specular response curve, indexed by a cosine in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecularLut {
    samples: Vec<f32>,
}

impl SpecularLut {
    /// Phong falloff: `lut(x) = x^shininess`.
    pub fn phong(shininess: f32) -> Self {
        Self::from_fn(|x| x.powf(shininess))
    }

    pub fn from_fn(f: impl Fn(f32) -> f32) -> Self {
        let last = (LUT_SIZE - 1) as f32;
        let samples = (0..LUT_SIZE).map(|i| f(i as f32 / last)).collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Nearest sample for `x`, clamped to the table. An empty table has no
    /// specular response.
    pub fn sample(&self, x: f32) -> f32 {
        let Some(last) = self.samples.len().checked_sub(1) else {
            return 0.0;
        };
        let i = (x.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.samples[i.min(last)]
    }
}

/// Light, material and specular curve. Set once at init; never mutated per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingEnvironment {
    pub material: Material,
    pub light: Light,
    pub specular: SpecularLut,
}

impl Default for LightingEnvironment {
    fn default() -> Self {
        Self {
            material: Material::default(),
            light: Light::default(),
            specular: SpecularLut::phong(30.0),
        }
    }
}

impl LightingEnvironment {
    /// Fragment primary colour for a view-space normal, before texturing.
    /// Mirrors what a backend's fragment stage computes.
    pub fn shade(&self, normal: Vec3, point: Vec3) -> Vec3 {
        let l = self.light.direction_from(point);
        let n_dot_l = normal.normalize_or_zero().dot(l).max(0.0);
        let m = &self.material;
        let diffuse = m.diffuse * self.light.color * n_dot_l;
        let specular = m.specular0 * self.light.color * self.specular.sample(n_dot_l);
        (m.emission + m.ambient + diffuse + specular).clamp(Vec3::ZERO, Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phong_lut_endpoints() {
        let lut = SpecularLut::phong(30.0);
        assert_eq!(lut.samples().len(), LUT_SIZE);
        assert_eq!(lut.samples()[0], 0.0);
        assert_eq!(lut.samples()[LUT_SIZE - 1], 1.0);
        assert!(lut.sample(0.5) < 1e-6);
    }

    #[test]
    fn phong_lut_is_monotonic() {
        let lut = SpecularLut::phong(30.0);
        assert!(lut.samples().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn lut_sample_clamps() {
        let lut = SpecularLut::phong(2.0);
        assert_eq!(lut.sample(-1.0), 0.0);
        assert_eq!(lut.sample(7.0), 1.0);
    }

    #[test]
    fn deserialized_empty_lut_samples_zero() {
        let lut: SpecularLut = serde_yaml::from_str("samples: []\n").unwrap();
        assert!(lut.samples().is_empty());
        assert_eq!(lut.sample(0.0), 0.0);
        assert_eq!(lut.sample(0.5), 0.0);
        assert_eq!(lut.sample(1.0), 0.0);

        let env = LightingEnvironment {
            specular: lut,
            ..LightingEnvironment::default()
        };
        let lit = env.shade(Vec3::X, Vec3::ZERO);
        assert!(lit.is_finite());
    }

    #[test]
    fn default_light_is_directional() {
        let env = LightingEnvironment::default();
        assert!(env.light.is_directional());
        let d = env.light.direction_from(Vec3::new(5.0, 5.0, 5.0));
        assert!(d.abs_diff_eq(Vec3::new(16.0, 0.5, 0.0).normalize(), 1e-6));
    }

    #[test]
    fn facing_surface_is_brighter_than_averted() {
        let env = LightingEnvironment::default();
        let lit = env.shade(Vec3::X, Vec3::ZERO);
        let dark = env.shade(-Vec3::X, Vec3::ZERO);
        assert!(lit.x > dark.x);
        // averted faces keep only the ambient term
        assert!(dark.abs_diff_eq(Vec3::splat(0.2), 1e-6));
    }
}
