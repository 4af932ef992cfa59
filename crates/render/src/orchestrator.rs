use crate::backend::{BackendError, GpuBackend, ShaderBinding};
use crate::config::{ConfigError, RenderConfig};
use crate::projection::StereoProjection;
use crate::scene::{SceneAssets, init_scene};
use crate::target::StereoTargets;
use crate::transform::{ModelTransform, Rotation};
use glam::Mat4;
use serde::Serialize;
use std::fmt;
use stereocube_common::Eye;

/// Errors from driving the frame state machine.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid frame transition: {from} -> {to}")]
    InvalidTransition { from: FramePhase, to: FramePhase },
}

/// Where the orchestrator is within one frame bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FramePhase {
    /// No frame in flight.
    Idle,
    /// Frame begun and targets cleared; no pass yet.
    FrameOpen,
    LeftPass,
    RightPass,
    /// Submitted. Transient: the orchestrator returns to `Idle` immediately.
    FrameClosed,
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FramePhase::Idle => "idle",
            FramePhase::FrameOpen => "frame-open",
            FramePhase::LeftPass => "left-pass",
            FramePhase::RightPass => "right-pass",
            FramePhase::FrameClosed => "frame-closed",
        };
        f.write_str(name)
    }
}

/// Whether a pass owns the frame's state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassKind {
    /// First pass of the frame: computes the frame's model-view and advances rotation.
    Primary,
    /// Additional eye: reuses the frame's model-view and mutates nothing.
    Secondary,
}

/// One draw issued during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassRecord {
    pub eye: Eye,
    pub kind: PassKind,
    /// Signed interocular distance the projection was built with.
    pub interocular: f32,
}

/// Summary of one submitted frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// Zero-based index of the frame.
    pub frame: u64,
    /// Raw slider reading.
    pub separation: f32,
    /// Unsigned interocular distance derived from the slider.
    pub interocular: f32,
    pub passes: Vec<PassRecord>,
    /// Rotation after the frame.
    pub rotation: Rotation,
}

impl FrameReport {
    pub fn is_stereo(&self) -> bool {
        self.passes.len() == 2
    }
}

/// Mutable renderer state, owned by the orchestrator. Nothing else touches it.
#[derive(Debug, Clone)]
pub struct RendererState {
    pub rotation: Rotation,
    pub targets: StereoTargets,
    pub uniforms: ShaderBinding,
    phase: FramePhase,
    frame_model_view: Mat4,
    frames_submitted: u64,
    passes: Vec<PassRecord>,
}

impl RendererState {
    fn new(targets: StereoTargets, uniforms: ShaderBinding) -> Self {
        Self {
            rotation: Rotation::default(),
            targets,
            uniforms,
            phase: FramePhase::Idle,
            frame_model_view: Mat4::IDENTITY,
            frames_submitted: 0,
            passes: Vec::with_capacity(2),
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }
}

/// Drives the stereo frame loop over a [`GpuBackend`].
///
/// Each frame is `begin → left pass → (right pass) → end`. The right pass only
/// runs when the interocular distance is positive; otherwise the frame is mono.
pub struct FrameOrchestrator<B: GpuBackend> {
    backend: B,
    config: RenderConfig,
    projection: StereoProjection,
    model: ModelTransform,
    vertex_count: u32,
    state: RendererState,
}

impl<B: GpuBackend> FrameOrchestrator<B> {
    /// Validate the config, then set up targets, uniforms, mesh, texture and lighting.
    pub fn new(mut backend: B, config: RenderConfig, assets: &SceneAssets) -> Result<Self, RenderError> {
        config.validate()?;
        let handles = init_scene(&mut backend, &config, assets)?;
        Ok(Self {
            backend,
            projection: config.projection(),
            model: config.model_transform(),
            config,
            vertex_count: handles.vertex_count,
            state: RendererState::new(handles.targets, handles.uniforms),
        })
    }

    pub fn state(&self) -> &RendererState {
        &self.state
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Render one full frame for a raw slider reading.
    pub fn render_frame(&mut self, separation: f32) -> Result<FrameReport, RenderError> {
        let interocular = self.config.interocular(separation);

        self.begin_frame()?;
        self.left_pass(interocular)?;
        if interocular > 0.0 {
            self.right_pass(interocular)?;
        }
        let passes = self.end_frame()?;

        let report = FrameReport {
            frame: self.state.frames_submitted - 1,
            separation,
            interocular,
            passes,
            rotation: self.state.rotation,
        };
        tracing::debug!(
            frame = report.frame,
            interocular,
            stereo = report.is_stereo(),
            "frame submitted"
        );
        Ok(report)
    }

    /// Open a frame: wait for the device, then clear both eye targets.
    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.transition(&[FramePhase::Idle], FramePhase::FrameOpen)?;
        self.backend.frame_begin();
        for (_, target) in self.state.targets.iter() {
            self.backend
                .clear(target, self.config.clear_color, self.config.clear_depth);
        }
        self.state.passes.clear();
        Ok(())
    }

    /// Primary pass into the left target with `-interocular`.
    pub fn left_pass(&mut self, interocular: f32) -> Result<(), RenderError> {
        self.transition(&[FramePhase::FrameOpen], FramePhase::LeftPass)?;
        self.draw_pass(Eye::Left, interocular, PassKind::Primary);
        Ok(())
    }

    /// Secondary pass into the right target with `+interocular`.
    pub fn right_pass(&mut self, interocular: f32) -> Result<(), RenderError> {
        self.transition(&[FramePhase::LeftPass], FramePhase::RightPass)?;
        self.draw_pass(Eye::Right, interocular, PassKind::Secondary);
        Ok(())
    }

    /// Submit the frame. Returns the passes it contained.
    pub fn end_frame(&mut self) -> Result<Vec<PassRecord>, RenderError> {
        self.transition(
            &[FramePhase::LeftPass, FramePhase::RightPass],
            FramePhase::FrameClosed,
        )?;
        self.backend.frame_end();
        self.state.frames_submitted += 1;
        self.state.phase = FramePhase::Idle;
        Ok(std::mem::take(&mut self.state.passes))
    }

    fn transition(&mut self, allowed: &[FramePhase], to: FramePhase) -> Result<(), RenderError> {
        let from = self.state.phase;
        if !allowed.contains(&from) {
            return Err(RenderError::InvalidTransition { from, to });
        }
        self.state.phase = to;
        Ok(())
    }

    fn draw_pass(&mut self, eye: Eye, interocular: f32, kind: PassKind) {
        let interocular = eye.separation_sign() * interocular;
        let projection = self.projection.matrix(interocular);
        let model_view = match kind {
            PassKind::Primary => {
                let mv = self.model.matrix(self.state.rotation);
                self.state.frame_model_view = mv;
                self.state.rotation.advance(self.config.rotation_step());
                mv
            }
            PassKind::Secondary => self.state.frame_model_view,
        };

        let target = self.state.targets.get(eye);
        let uniforms = self.state.uniforms;
        self.backend.frame_draw_on(target);
        self.backend.set_uniform_mat4(uniforms.projection, &projection);
        self.backend.set_uniform_mat4(uniforms.model_view, &model_view);
        self.backend.draw_arrays(0, self.vertex_count);

        tracing::trace!(%eye, ?kind, interocular, "eye pass drawn");
        self.state.passes.push(PassRecord {
            eye,
            kind,
            interocular,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Command, RecordingBackend};
    use crate::transform::DEGREE;
    use stereocube_assets::Texture;

    fn orchestrator() -> FrameOrchestrator<RecordingBackend> {
        let assets = SceneAssets::cube(Texture::checkerboard(8, 2, [255; 4], [0; 4]));
        FrameOrchestrator::new(RecordingBackend::new(), RenderConfig::default(), &assets).unwrap()
    }

    fn frame_commands(orch: &mut FrameOrchestrator<RecordingBackend>) -> Vec<Command> {
        orch.backend_mut().take_commands()
    }

    #[test]
    fn stereo_frame_runs_left_then_right() {
        let mut orch = orchestrator();
        orch.backend_mut().take_commands();

        let report = orch.render_frame(0.6).unwrap();
        assert!((report.interocular - 0.2).abs() < 1e-6);
        assert_eq!(report.passes.len(), 2);
        assert_eq!(report.passes[0].eye, Eye::Left);
        assert_eq!(report.passes[0].interocular, -report.interocular);
        assert_eq!(report.passes[1].eye, Eye::Right);
        assert_eq!(report.passes[1].interocular, report.interocular);

        let cmds = frame_commands(&mut orch);
        let begins = cmds.iter().filter(|c| matches!(c, Command::FrameBegin)).count();
        let ends = cmds.iter().filter(|c| matches!(c, Command::FrameEnd)).count();
        let draws = cmds.iter().filter(|c| matches!(c, Command::DrawArrays { .. })).count();
        assert_eq!((begins, ends, draws), (1, 1, 2));
        assert!((report.rotation.angle_x - DEGREE).abs() < 1e-7);
    }

    #[test]
    fn zero_separation_renders_mono() {
        let mut orch = orchestrator();
        orch.backend_mut().take_commands();

        let report = orch.render_frame(0.0).unwrap();
        assert_eq!(report.passes.len(), 1);
        assert_eq!(report.passes[0].eye, Eye::Left);
        assert!(!report.is_stereo());

        let cmds = frame_commands(&mut orch);
        let left = orch.state().targets.left;
        let right = orch.state().targets.right;
        assert!(cmds.contains(&Command::DrawOn(left)));
        assert!(!cmds.contains(&Command::DrawOn(right)));
        assert_eq!(cmds.iter().filter(|c| matches!(c, Command::FrameEnd)).count(), 1);
        assert!((report.rotation.angle_y - DEGREE).abs() < 1e-7);
    }

    #[test]
    fn rotation_advances_once_per_frame() {
        let mut orch = orchestrator();
        for s in [0.0, 0.6, 1.0, 0.0, 0.3] {
            orch.render_frame(s).unwrap();
        }
        let r = orch.state().rotation;
        assert!((r.angle_x - 5.0 * DEGREE).abs() < 1e-6);
        assert!((r.angle_y - 5.0 * DEGREE).abs() < 1e-6);
        assert_eq!(orch.state().frames_submitted(), 5);
    }

    #[test]
    fn both_eyes_share_the_frame_model_view() {
        let mut orch = orchestrator();
        orch.render_frame(0.0).unwrap();
        orch.backend_mut().take_commands();
        orch.render_frame(0.9).unwrap();

        let mv_slot = orch.state().uniforms.model_view;
        let model_views: Vec<Mat4> = orch
            .backend()
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform { location, value } if *location == mv_slot => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(model_views.len(), 2);
        assert_eq!(model_views[0], model_views[1]);
        // drawn with the pre-advance angle of this frame
        let expected = ModelTransform::default().matrix(Rotation {
            angle_x: DEGREE,
            angle_y: DEGREE,
        });
        assert!(model_views[0].abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn projections_use_opposite_signs() {
        let mut orch = orchestrator();
        orch.backend_mut().take_commands();
        orch.render_frame(0.6).unwrap();

        let proj_slot = orch.state().uniforms.projection;
        let projections: Vec<Mat4> = orch
            .backend()
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform { location, value } if *location == proj_slot => Some(*value),
                _ => None,
            })
            .collect();
        let p = StereoProjection::default();
        let iod = RenderConfig::default().interocular(0.6);
        assert_eq!(projections, vec![p.matrix(-iod), p.matrix(iod)]);
    }

    #[test]
    fn every_frame_clears_both_targets_first() {
        let mut orch = orchestrator();
        orch.backend_mut().take_commands();
        orch.render_frame(0.0).unwrap();

        let cmds = frame_commands(&mut orch);
        assert_eq!(cmds[0], Command::FrameBegin);
        let targets = orch.state().targets;
        assert!(matches!(cmds[1], Command::Clear { target, .. } if target == targets.left));
        assert!(matches!(cmds[2], Command::Clear { target, .. } if target == targets.right));
        assert_eq!(cmds[3], Command::DrawOn(targets.left));
    }

    #[test]
    fn right_pass_requires_left_pass() {
        let mut orch = orchestrator();
        orch.begin_frame().unwrap();
        let err = orch.right_pass(0.2).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidTransition {
                from: FramePhase::FrameOpen,
                to: FramePhase::RightPass
            }
        ));
    }

    #[test]
    fn only_one_frame_open_at_a_time() {
        let mut orch = orchestrator();
        orch.begin_frame().unwrap();
        assert!(matches!(
            orch.begin_frame(),
            Err(RenderError::InvalidTransition { from: FramePhase::FrameOpen, .. })
        ));
    }

    #[test]
    fn end_requires_a_pass() {
        let mut orch = orchestrator();
        assert!(orch.end_frame().is_err());
        orch.begin_frame().unwrap();
        assert!(orch.end_frame().is_err());
        orch.left_pass(0.0).unwrap();
        assert_eq!(orch.end_frame().unwrap().len(), 1);
        assert_eq!(orch.state().phase(), FramePhase::Idle);
    }

    #[test]
    fn manual_bracket_matches_render_frame() {
        let mut manual = orchestrator();
        manual.backend_mut().take_commands();
        manual.begin_frame().unwrap();
        manual.left_pass(0.2).unwrap();
        manual.right_pass(0.2).unwrap();
        manual.end_frame().unwrap();

        let mut driven = orchestrator();
        driven.backend_mut().take_commands();
        driven.render_frame(0.6).unwrap();

        assert_eq!(manual.backend().commands().len(), driven.backend().commands().len());
        assert_eq!(manual.state().rotation, driven.state().rotation);
    }

    #[test]
    fn slider_extremes_produce_finite_uniforms() {
        let mut orch = orchestrator();
        orch.render_frame(0.0).unwrap();
        orch.render_frame(1.0).unwrap();
        assert!(orch.backend().commands().iter().all(|c| match c {
            Command::SetUniform { value, .. } => value.is_finite(),
            _ => true,
        }));
    }

    #[test]
    fn negative_separation_falls_back_to_mono() {
        let mut orch = orchestrator();
        let report = orch.render_frame(-0.5).unwrap();
        assert_eq!(report.passes.len(), 1);
    }

    #[test]
    fn invalid_config_fails_init() {
        let assets = SceneAssets::cube(Texture::checkerboard(4, 2, [0; 4], [255; 4]));
        let config = RenderConfig {
            convergence: 0.0,
            ..Default::default()
        };
        let result = FrameOrchestrator::new(RecordingBackend::new(), config, &assets);
        assert!(matches!(result, Err(RenderError::Config(_))));
    }
}
