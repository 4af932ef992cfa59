use crate::action::Action;
use crate::state::{EdgeDetector, InputSnapshot, SliderState};
use std::collections::VecDeque;

/// Anything that can be polled once per loop iteration.
pub trait InputSource {
    /// Poll the devices. Called exactly once per iteration, before frame work.
    fn scan(&mut self) -> InputSnapshot;
}

/// Live input driven by platform actions (keyboard, gamepad).
///
/// Presses that arrive between two scans are latched so a quick tap is never lost.
#[derive(Debug, Default)]
pub struct ActionInput {
    slider: SliderState,
    start: EdgeDetector,
    start_latched: bool,
}

impl ActionInput {
    pub fn new(initial_separation: f32) -> Self {
        Self {
            slider: SliderState::new(initial_separation),
            ..Default::default()
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::AdjustSlider(delta) => {
                self.slider.adjust(delta);
                tracing::debug!(slider = self.slider.value(), "depth slider moved");
            }
            Action::SetSlider(value) => {
                self.slider.set(value);
                tracing::debug!(slider = self.slider.value(), "depth slider set");
            }
            Action::StartButton { held } => {
                if self.start.update(held) {
                    self.start_latched = true;
                }
            }
            Action::Noop => {}
        }
    }

    pub fn slider(&self) -> f32 {
        self.slider.value()
    }
}

impl InputSource for ActionInput {
    fn scan(&mut self) -> InputSnapshot {
        InputSnapshot {
            separation: self.slider.value(),
            exit_pressed: std::mem::take(&mut self.start_latched),
        }
    }
}

/// Replays a fixed slider sequence, then presses START.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    frames: VecDeque<f32>,
}

impl ScriptedInput {
    pub fn new(separations: impl IntoIterator<Item = f32>) -> Self {
        Self {
            frames: separations.into_iter().collect(),
        }
    }

    /// Hold the slider at one position for `frames` iterations.
    pub fn constant(separation: f32, frames: usize) -> Self {
        Self::new(std::iter::repeat_n(separation, frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn scan(&mut self) -> InputSnapshot {
        match self.frames.pop_front() {
            Some(separation) => InputSnapshot::new(separation),
            None => InputSnapshot::exit(),
        }
    }
}
