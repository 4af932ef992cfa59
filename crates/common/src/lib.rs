//! Shared vocabulary for the stereocube workspace.

mod types;

pub use types::{DisplayOutput, Eye, Rgba, Screen};
