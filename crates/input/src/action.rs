/// A device-independent input action.
///
/// Platform layers (keyboard, gamepad, scripted replays) translate raw events
/// into actions; the input state only ever consumes actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Nudge the depth slider by a signed delta.
    AdjustSlider(f32),
    /// Move the depth slider to an absolute position.
    SetSlider(f32),
    /// The START button changed state.
    StartButton { held: bool },
    /// Unbound input.
    Noop,
}

impl Action {
    /// Keyboard step for one slider notch.
    pub const SLIDER_STEP: f32 = 0.1;

    pub fn slider_up() -> Self {
        Action::AdjustSlider(Self::SLIDER_STEP)
    }

    pub fn slider_down() -> Self {
        Action::AdjustSlider(-Self::SLIDER_STEP)
    }
}
