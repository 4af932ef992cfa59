use crate::lighting::LightingEnvironment;
use crate::target::{TargetDescriptor, TargetHandle};
use glam::Mat4;
use stereocube_assets::{MeshStore, Texture};
use stereocube_common::{DisplayOutput, Rgba};

/// Name of the projection matrix uniform in the vertex program.
pub const PROJECTION_UNIFORM: &str = "projection";
/// Name of the model-view matrix uniform in the vertex program.
pub const MODEL_VIEW_UNIFORM: &str = "modelView";

/// Errors raised by a device backend. All of them are fatal at init.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("cannot allocate {width}x{height} render target: {reason}")]
    TargetAllocation {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("{0} is already bound to an output")]
    OutputAlreadyBound(TargetHandle),
    #[error("output {0:?} already has a target")]
    OutputInUse(DisplayOutput),
    #[error("unknown render target {0}")]
    UnknownTarget(TargetHandle),
    #[error("shader program has no uniform named `{0}`")]
    UniformNotFound(&'static str),
    #[error("shader error: {0}")]
    Shader(String),
    #[error("texture upload error: {0}")]
    Texture(String),
    #[error("device error: {0}")]
    Device(String),
}

/// Opaque handle to a uniform slot of the bound shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(u32);

impl UniformLocation {
    pub fn new(slot: u32) -> Self {
        Self(slot)
    }

    pub fn slot(self) -> u32 {
        self.0
    }
}

/// Capability of a compiled shader program: look up uniforms by name.
pub trait UniformBindable {
    fn uniform_location(&self, name: &str) -> Option<UniformLocation>;
}

/// Uniform handles the frame loop writes every pass. Resolved once at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderBinding {
    pub projection: UniformLocation,
    pub model_view: UniformLocation,
}

impl ShaderBinding {
    pub fn resolve(program: &(impl UniformBindable + ?Sized)) -> Result<Self, BackendError> {
        let lookup = |name: &'static str| {
            program
                .uniform_location(name)
                .ok_or(BackendError::UniformNotFound(name))
        };
        Ok(Self {
            projection: lookup(PROJECTION_UNIFORM)?,
            model_view: lookup(MODEL_VIEW_UNIFORM)?,
        })
    }
}

/// Fixed-function style device interface the frame orchestrator drives.
///
/// A backend carries exactly one bound shader program, which it exposes
/// through [`UniformBindable`]. Init-time calls are fallible; per-frame calls
/// are assumed to succeed.
pub trait GpuBackend: UniformBindable {
    /// Allocate one colour+depth surface.
    fn create_target(&mut self, desc: &TargetDescriptor) -> Result<TargetHandle, BackendError>;

    /// Attach a target to a physical output. Rebinding is not supported.
    fn bind_output(&mut self, target: TargetHandle, output: DisplayOutput) -> Result<(), BackendError>;

    /// Upload the static vertex data.
    fn upload_mesh(&mut self, mesh: &MeshStore) -> Result<(), BackendError>;

    /// Upload a texture and bind it to a texture unit.
    fn bind_texture(&mut self, unit: u32, texture: &Texture) -> Result<(), BackendError>;

    fn set_lighting(&mut self, lighting: &LightingEnvironment) -> Result<(), BackendError>;

    /// Start a frame. Blocks until the device has consumed the previous frame.
    fn frame_begin(&mut self);

    fn clear(&mut self, target: TargetHandle, color: Rgba, depth: f32);

    /// Direct subsequent draws into `target`.
    fn frame_draw_on(&mut self, target: TargetHandle);

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    /// Draw `count` vertices of the uploaded mesh as a triangle list.
    fn draw_arrays(&mut self, first: u32, count: u32);

    /// Submit the frame and transfer every bound target to its output.
    fn frame_end(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Program(&'static [&'static str]);

    impl UniformBindable for Program {
        fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
            self.0
                .iter()
                .position(|n| *n == name)
                .map(|i| UniformLocation::new(i as u32))
        }
    }

    #[test]
    fn resolves_both_uniforms() {
        let binding = ShaderBinding::resolve(&Program(&["modelView", "projection"])).unwrap();
        assert_eq!(binding.projection.slot(), 1);
        assert_eq!(binding.model_view.slot(), 0);
    }

    #[test]
    fn missing_uniform_is_fatal() {
        let err = ShaderBinding::resolve(&Program(&["projection"])).unwrap_err();
        assert!(matches!(err, BackendError::UniformNotFound("modelView")));
    }
}
