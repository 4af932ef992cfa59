use crate::backend::GpuBackend;
use crate::orchestrator::{FrameOrchestrator, FrameReport, RenderError};
use serde::Serialize;
use stereocube_input::{InputSnapshot, InputSource};

/// Outcome of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopControl {
    Rendered(FrameReport),
    /// Exit was pressed; no frame was begun.
    Exit,
}

/// Totals for a finished run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopSummary {
    pub frames: u64,
    pub stereo_frames: u64,
    pub mono_frames: u64,
}

impl LoopSummary {
    fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        if report.is_stereo() {
            self.stereo_frames += 1;
        } else {
            self.mono_frames += 1;
        }
    }
}

impl<B: GpuBackend> FrameOrchestrator<B> {
    /// One loop iteration: honour exit first, otherwise render a whole frame.
    pub fn step(&mut self, input: &InputSnapshot) -> Result<LoopControl, RenderError> {
        if input.exit_pressed {
            tracing::info!("exit requested");
            return Ok(LoopControl::Exit);
        }
        self.render_frame(input.separation).map(LoopControl::Rendered)
    }
}

/// Poll input and render until exit is pressed.
pub fn run_loop<B, I>(
    orchestrator: &mut FrameOrchestrator<B>,
    input: &mut I,
    mut on_frame: impl FnMut(&FrameReport),
) -> Result<LoopSummary, RenderError>
where
    B: GpuBackend,
    I: InputSource + ?Sized,
{
    let mut summary = LoopSummary::default();
    loop {
        let snapshot = input.scan();
        match orchestrator.step(&snapshot)? {
            LoopControl::Rendered(report) => {
                summary.record(&report);
                on_frame(&report);
            }
            LoopControl::Exit => break,
        }
    }
    tracing::info!(
        frames = summary.frames,
        stereo = summary.stereo_frames,
        mono = summary.mono_frames,
        "render loop finished"
    );
    Ok(summary)
}
