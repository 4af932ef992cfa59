use serde::{Deserialize, Serialize};
use std::fmt;

/// One eye of a stereoscopic display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Sign applied to the interocular distance for this eye's projection.
    pub fn separation_sign(self) -> f32 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical screen of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    /// The stereoscopic screen; it carries a left and a right output.
    Top,
    /// The mono touch screen.
    Bottom,
}

/// A physical output a render target is transferred to at frame end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayOutput {
    pub screen: Screen,
    pub eye: Eye,
}

impl DisplayOutput {
    pub const TOP_LEFT: Self = Self {
        screen: Screen::Top,
        eye: Eye::Left,
    };
    pub const TOP_RIGHT: Self = Self {
        screen: Screen::Top,
        eye: Eye::Right,
    };

    /// Output of the top screen for the given eye.
    pub fn top(eye: Eye) -> Self {
        Self {
            screen: Screen::Top,
            eye,
        }
    }
}

/// Packed 8-bit RGBA colour, stored as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgba(pub u32);

impl Rgba {
    /// Sky blue used as the scene background.
    pub const SKY: Rgba = Rgba(0x68B0D8FF);

    pub fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn a(self) -> u8 {
        self.0 as u8
    }

    /// Normalized `[r, g, b, a]` in `0.0..=1.0`.
    pub fn to_f32_array(self) -> [f32; 4] {
        [
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
            self.a() as f32 / 255.0,
        ]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::SKY
    }
}
