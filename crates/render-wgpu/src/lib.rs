//! wgpu backend for the stereo renderer.
//!
//! Each eye target is an offscreen colour+depth pair. At frame end the
//! top-left and top-right outputs are composited into the left and right
//! halves of the window surface.
//!
//! # Invariants
//! - Clears are deferred to the next pass on the target, or flushed at frame end.
//! - Uniform writes are staged and uploaded right before each draw.
//! - Window resizes never resize the eye targets.
//! - Eye targets and the scene texture are `Rgba8Unorm`. Values reach the
//!   surface byte for byte, whatever its colour space.

mod gpu;
mod shaders;
mod target;

pub use gpu::WgpuBackend;
pub use shaders::SCENE_UNIFORMS;
