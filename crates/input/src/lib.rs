//! Input: the 3D depth slider and the edge-triggered exit button.
//!
//! # Invariants
//! - Input is polled exactly once per loop iteration, before any frame work.
//! - The slider is clamped to `0.0..=1.0`; the exit button reports presses, not holds.

pub mod action;
pub mod source;
pub mod state;

pub use action::Action;
pub use source::{ActionInput, InputSource, ScriptedInput};
pub use state::{EdgeDetector, InputSnapshot, SliderState};

pub fn crate_info() -> &'static str {
    "stereocube-input v0.1.0"
}
