//! Mesh & material store: the static cube geometry and its single texture.
//!
//! # Invariants
//! - Vertex data is defined at build time and never mutated after upload.
//! - The texture is decoded once at init; a decode failure is fatal to the caller.

mod mesh;
mod texture;

pub use mesh::{CUBE_VERTICES, MeshStore, Vertex};
pub use texture::{FilterMode, Texture, TextureFilter};

/// Errors from asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("texture decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture blob is empty")]
    EmptyBlob,
    #[error("texture has zero size ({width}x{height})")]
    ZeroSize { width: u32, height: u32 },
    #[error("texture data length {actual} does not match {width}x{height} RGBA8")]
    LengthMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },
}

pub fn crate_info() -> &'static str {
    "stereocube-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }
}
