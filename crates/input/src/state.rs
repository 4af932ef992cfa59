use serde::Serialize;

/// One poll of the input devices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputSnapshot {
    /// Depth slider position, `0.0` (3D off) to `1.0` (full depth).
    pub separation: f32,
    /// START went down since the previous poll.
    pub exit_pressed: bool,
}

impl InputSnapshot {
    pub fn new(separation: f32) -> Self {
        Self {
            separation,
            exit_pressed: false,
        }
    }

    pub fn exit() -> Self {
        Self {
            separation: 0.0,
            exit_pressed: true,
        }
    }
}

/// The 3D depth slider, clamped to `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SliderState {
    value: f32,
}

impl SliderState {
    pub fn new(value: f32) -> Self {
        let mut s = Self::default();
        s.set(value);
        s
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set(&mut self, value: f32) {
        self.value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
    }

    pub fn adjust(&mut self, delta: f32) {
        self.set(self.value + delta);
    }
}

/// Turns a held/released level into a single "pressed this frame" pulse.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    held: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current level; returns `true` only on a released-to-held transition.
    pub fn update(&mut self, held: bool) -> bool {
        let rising = held && !self.held;
        self.held = held;
        rising
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_clamps_to_unit_range() {
        let mut s = SliderState::new(0.5);
        s.adjust(0.8);
        assert_eq!(s.value(), 1.0);
        s.adjust(-3.0);
        assert_eq!(s.value(), 0.0);
        s.set(f32::NAN);
        assert_eq!(s.value(), 0.0);
    }

    #[test]
    fn edge_fires_once_per_press() {
        let mut e = EdgeDetector::new();
        assert!(e.update(true));
        assert!(!e.update(true));
        assert!(!e.update(true));
        assert!(!e.update(false));
        assert!(e.update(true));
    }

    #[test]
    fn exit_snapshot() {
        let s = InputSnapshot::exit();
        assert!(s.exit_pressed);
        assert!(!InputSnapshot::new(0.3).exit_pressed);
    }
}
