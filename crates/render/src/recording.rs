use crate::backend::{BackendError, GpuBackend, UniformBindable, UniformLocation};
use crate::backend::{MODEL_VIEW_UNIFORM, PROJECTION_UNIFORM};
use crate::lighting::LightingEnvironment;
use crate::target::{OutputTable, TargetDescriptor, TargetHandle};
use glam::Mat4;
use std::fmt::Write as _;
use stereocube_assets::{MeshStore, Texture};
use stereocube_common::{DisplayOutput, Rgba};

/// A backend call, as observed by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTarget {
        handle: TargetHandle,
        desc: TargetDescriptor,
    },
    BindOutput {
        target: TargetHandle,
        output: DisplayOutput,
    },
    UploadMesh {
        vertices: u32,
    },
    BindTexture {
        unit: u32,
        width: u32,
        height: u32,
    },
    SetLighting,
    FrameBegin,
    Clear {
        target: TargetHandle,
        color: Rgba,
        depth: f32,
    },
    DrawOn(TargetHandle),
    SetUniform {
        location: UniformLocation,
        value: Mat4,
    },
    DrawArrays {
        first: u32,
        count: u32,
    },
    FrameEnd,
}

/// Device-free backend that records every call.
///
/// Used for tests and for the headless CLI. Target allocation can be capped
/// to exercise the fatal init path.
#[derive(Debug)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    uniforms: Vec<String>,
    targets: Vec<TargetDescriptor>,
    target_limit: Option<usize>,
    outputs: OutputTable,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// A backend whose program exposes `projection` and `modelView`.
    pub fn new() -> Self {
        Self::with_uniforms([PROJECTION_UNIFORM, MODEL_VIEW_UNIFORM])
    }

    /// A backend whose program exposes exactly these uniform names, in slot order.
    pub fn with_uniforms<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            commands: Vec::new(),
            uniforms: names.into_iter().map(Into::into).collect(),
            targets: Vec::new(),
            target_limit: None,
            outputs: OutputTable::new(),
        }
    }

    /// Fail `create_target` once `limit` targets exist.
    pub fn with_target_limit(mut self, limit: usize) -> Self {
        self.target_limit = Some(limit);
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn outputs(&self) -> &OutputTable {
        &self.outputs
    }

    /// Human-readable command log, one line per call.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for cmd in &self.commands {
            let _ = match cmd {
                Command::CreateTarget { handle, desc } => writeln!(
                    out,
                    "create {handle} {}x{} {:?}/{:?}",
                    desc.width, desc.height, desc.color, desc.depth
                ),
                Command::BindOutput { target, output } => writeln!(
                    out,
                    "bind   {target} -> {:?}/{}",
                    output.screen, output.eye
                ),
                Command::UploadMesh { vertices } => writeln!(out, "mesh   {vertices} vertices"),
                Command::BindTexture {
                    unit,
                    width,
                    height,
                } => writeln!(out, "tex    unit {unit} {width}x{height}"),
                Command::SetLighting => writeln!(out, "light"),
                Command::FrameBegin => writeln!(out, "frame begin"),
                Command::Clear {
                    target,
                    color,
                    depth,
                } => writeln!(out, "  clear {target} #{:08X} depth={depth}", color.0),
                Command::DrawOn(target) => writeln!(out, "  draw-on {target}"),
                Command::SetUniform { location, value } => writeln!(
                    out,
                    "    uniform[{}] x-row=({:.4}, {:.4}, {:.4}, {:.4})",
                    location.slot(),
                    value.x_axis.x,
                    value.y_axis.x,
                    value.z_axis.x,
                    value.w_axis.x
                ),
                Command::DrawArrays { first, count } => {
                    writeln!(out, "    draw {first}..{}", first + count)
                }
                Command::FrameEnd => writeln!(out, "frame end"),
            };
        }
        out
    }
}

impl UniformBindable for RecordingBackend {
    fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .position(|n| n == name)
            .map(|i| UniformLocation::new(i as u32))
    }
}

impl GpuBackend for RecordingBackend {
    fn create_target(&mut self, desc: &TargetDescriptor) -> Result<TargetHandle, BackendError> {
        if self.target_limit.is_some_and(|limit| self.targets.len() >= limit) {
            return Err(BackendError::TargetAllocation {
                width: desc.width,
                height: desc.height,
                reason: "out of target memory".into(),
            });
        }
        let handle = TargetHandle::new(self.targets.len() as u32);
        self.targets.push(*desc);
        self.commands.push(Command::CreateTarget {
            handle,
            desc: *desc,
        });
        Ok(handle)
    }

    fn bind_output(&mut self, target: TargetHandle, output: DisplayOutput) -> Result<(), BackendError> {
        if target.index() >= self.targets.len() {
            return Err(BackendError::UnknownTarget(target));
        }
        self.outputs.bind(target, output)?;
        self.commands.push(Command::BindOutput { target, output });
        Ok(())
    }

    fn upload_mesh(&mut self, mesh: &MeshStore) -> Result<(), BackendError> {
        self.commands.push(Command::UploadMesh {
            vertices: mesh.vertex_count(),
        });
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: &Texture) -> Result<(), BackendError> {
        self.commands.push(Command::BindTexture {
            unit,
            width: texture.width(),
            height: texture.height(),
        });
        Ok(())
    }

    fn set_lighting(&mut self, _lighting: &LightingEnvironment) -> Result<(), BackendError> {
        self.commands.push(Command::SetLighting);
        Ok(())
    }

    fn frame_begin(&mut self) {
        self.commands.push(Command::FrameBegin);
    }

    fn clear(&mut self, target: TargetHandle, color: Rgba, depth: f32) {
        self.commands.push(Command::Clear {
            target,
            color,
            depth,
        });
    }

    fn frame_draw_on(&mut self, target: TargetHandle) {
        self.commands.push(Command::DrawOn(target));
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        self.commands.push(Command::SetUniform {
            location,
            value: *value,
        });
    }

    fn draw_arrays(&mut self, first: u32, count: u32) {
        self.commands.push(Command::DrawArrays { first, count });
    }

    fn frame_end(&mut self) {
        self.commands.push(Command::FrameEnd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::orchestrator::{FrameOrchestrator, RenderError};
    use crate::scene::SceneAssets;

    fn assets() -> SceneAssets {
        SceneAssets::cube(Texture::checkerboard(16, 4, [255, 255, 255, 255], [0, 0, 0, 255]))
    }

    #[test]
    fn init_sequence_is_recorded_in_order() {
        let orch = FrameOrchestrator::new(RecordingBackend::new(), RenderConfig::default(), &assets())
            .unwrap();
        let cmds = orch.backend().commands();
        assert!(matches!(cmds[0], Command::CreateTarget { .. }));
        assert!(matches!(cmds[1], Command::CreateTarget { .. }));
        assert!(matches!(cmds[2], Command::Clear { .. }));
        assert!(matches!(cmds[3], Command::Clear { .. }));
        assert!(matches!(
            cmds[4],
            Command::BindOutput {
                output: DisplayOutput::TOP_LEFT,
                ..
            }
        ));
        assert!(matches!(
            cmds[5],
            Command::BindOutput {
                output: DisplayOutput::TOP_RIGHT,
                ..
            }
        ));
        assert_eq!(cmds[6], Command::UploadMesh { vertices: 36 });
        assert_eq!(
            cmds[7],
            Command::BindTexture {
                unit: 0,
                width: 16,
                height: 16
            }
        );
        assert_eq!(cmds[8], Command::SetLighting);
        assert_eq!(orch.backend().outputs().len(), 2);
    }

    #[test]
    fn target_exhaustion_is_fatal() {
        let backend = RecordingBackend::new().with_target_limit(1);
        let result = FrameOrchestrator::new(backend, RenderConfig::default(), &assets());
        assert!(matches!(
            result,
            Err(RenderError::Backend(BackendError::TargetAllocation { width: 400, .. }))
        ));
    }

    #[test]
    fn program_without_model_view_is_fatal() {
        let backend = RecordingBackend::with_uniforms(["projection"]);
        let result = FrameOrchestrator::new(backend, RenderConfig::default(), &assets());
        assert!(matches!(
            result,
            Err(RenderError::Backend(BackendError::UniformNotFound("modelView")))
        ));
    }

    #[test]
    fn unknown_target_cannot_bind() {
        let mut backend = RecordingBackend::new();
        let err = backend
            .bind_output(TargetHandle::new(9), DisplayOutput::TOP_LEFT)
            .unwrap_err();
        assert!(matches!(err, BackendError::UnknownTarget(_)));
    }

    #[test]
    fn describe_lists_frame_bracket() {
        let mut orch = FrameOrchestrator::new(RecordingBackend::new(), RenderConfig::default(), &assets())
            .unwrap();
        orch.backend_mut().take_commands();
        orch.render_frame(0.6).unwrap();
        let text = orch.backend().describe();
        assert!(text.starts_with("frame begin\n"));
        assert!(text.ends_with("frame end\n"));
        assert_eq!(text.matches("draw-on").count(), 2);
        assert!(text.contains("#68B0D8FF"));
    }
}
