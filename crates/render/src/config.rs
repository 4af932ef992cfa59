use crate::projection::{ProjectionError, StereoProjection};
use crate::target::{ColorFormat, DepthFormat, TargetDescriptor};
use crate::transform::ModelTransform;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stereocube_common::Rgba;

/// Errors from loading or validating a [`RenderConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid projection: {0}")]
    Projection(#[from] ProjectionError),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Size of each per-eye render target, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl Default for TargetSize {
    fn default() -> Self {
        Self {
            width: 400,
            height: 240,
        }
    }
}

/// Renderer settings. Every field has a default, so a YAML file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Focal distance where both eye images coincide.
    pub convergence: f32,
    /// Slider position to interocular distance factor.
    pub separation_scale: f32,
    pub left_handed: bool,
    pub target: TargetSize,
    pub clear_color: Rgba,
    pub clear_depth: f32,
    /// Rotation added to each axis per frame.
    pub rotation_step_degrees: f32,
    pub model_scale: f32,
    pub model_translation: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 40.0,
            near: 0.01,
            far: 1000.0,
            convergence: 2.0,
            separation_scale: 1.0 / 3.0,
            left_handed: false,
            target: TargetSize::default(),
            clear_color: Rgba::SKY,
            clear_depth: 1.0,
            rotation_step_degrees: 1.0,
            model_scale: 0.75,
            model_translation: [0.0, 0.0, -2.0],
        }
    }
}

impl RenderConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), "loaded render config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.projection().validate()?;
        if self.target.width == 0 || self.target.height == 0 {
            return Err(ConfigError::Invalid {
                field: "target",
                reason: format!("{}x{} has no pixels", self.target.width, self.target.height),
            });
        }
        if !(self.separation_scale.is_finite() && self.separation_scale >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "separation_scale",
                reason: format!("must be finite and non-negative, got {}", self.separation_scale),
            });
        }
        if !(0.0..=1.0).contains(&self.clear_depth) {
            return Err(ConfigError::Invalid {
                field: "clear_depth",
                reason: format!("must be in [0, 1], got {}", self.clear_depth),
            });
        }
        if !self.rotation_step_degrees.is_finite() {
            return Err(ConfigError::Invalid {
                field: "rotation_step_degrees",
                reason: "must be finite".into(),
            });
        }
        if !(self.model_scale.is_finite() && self.model_scale != 0.0) {
            return Err(ConfigError::Invalid {
                field: "model_scale",
                reason: format!("must be finite and non-zero, got {}", self.model_scale),
            });
        }
        Ok(())
    }

    pub fn projection(&self) -> StereoProjection {
        StereoProjection {
            fov_degrees: self.fov_degrees,
            aspect: self.target.width as f32 / self.target.height.max(1) as f32,
            near: self.near,
            far: self.far,
            convergence: self.convergence,
            left_handed: self.left_handed,
        }
    }

    pub fn model_transform(&self) -> ModelTransform {
        ModelTransform {
            scale: self.model_scale,
            translation: Vec3::from_array(self.model_translation),
        }
    }

    pub fn target_descriptor(&self) -> TargetDescriptor {
        TargetDescriptor {
            width: self.target.width,
            height: self.target.height,
            color: ColorFormat::Rgba8,
            depth: DepthFormat::Depth24Stencil8,
        }
    }

    pub fn rotation_step(&self) -> f32 {
        self.rotation_step_degrees.to_radians()
    }

    /// Interocular distance for a raw slider reading.
    pub fn interocular(&self, separation: f32) -> f32 {
        separation * self.separation_scale
    }
}
