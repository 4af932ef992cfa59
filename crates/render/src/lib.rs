//! Stereo renderer core: per-eye projection, frame lifecycle, backend seam.
//!
//! # Invariants
//! - Exactly one frame begin/end pair per loop iteration.
//! - The right-eye pass never runs without a left-eye pass in the same frame.
//! - Rotation state advances once per frame, during the primary pass only.
//! - Uniform locations are resolved once at init and reused every pass.
//!
//! The [`GpuBackend`] trait is the only contact point with a device. The
//! [`RecordingBackend`] implements it by logging commands, which is how the
//! frame logic is tested without a GPU.

mod app_loop;
mod backend;
mod config;
mod lighting;
mod orchestrator;
mod projection;
mod recording;
mod scene;
mod target;
mod transform;

pub use app_loop::{LoopControl, LoopSummary, run_loop};
pub use backend::{
    BackendError, GpuBackend, MODEL_VIEW_UNIFORM, PROJECTION_UNIFORM, ShaderBinding,
    UniformBindable, UniformLocation,
};
pub use config::{ConfigError, RenderConfig, TargetSize};
pub use lighting::{LUT_SIZE, Light, LightingEnvironment, Material, SpecularLut};
pub use orchestrator::{
    FrameOrchestrator, FramePhase, FrameReport, PassKind, PassRecord, RenderError, RendererState,
};
pub use projection::{ProjectionError, StereoProjection, stereo_perspective};
pub use recording::{Command, RecordingBackend};
pub use scene::{SCENE_TEXTURE_UNIT, SceneAssets};
pub use target::{ColorFormat, DepthFormat, OutputTable, StereoTargets, TargetDescriptor, TargetHandle};
pub use transform::{DEGREE, ModelTransform, Rotation};

pub fn crate_info() -> &'static str {
    "stereocube-render v0.1.0"
}
