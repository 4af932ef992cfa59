use crate::AssetError;
use std::path::Path;

/// Sampler filter applied by the GPU when the texture is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Magnification/minification filter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureFilter {
    pub mag: FilterMode,
    pub min: FilterMode,
}

impl Default for TextureFilter {
    fn default() -> Self {
        Self {
            mag: FilterMode::Linear,
            min: FilterMode::Nearest,
        }
    }
}

/// Decoded RGBA8 texture, ready for upload to a texture unit.
#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    filter: TextureFilter,
}

impl Texture {
    /// Build a texture from raw RGBA8 pixels (row-major, top-left origin).
    pub fn from_rgba8(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::ZeroSize { width, height });
        }
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(AssetError::LengthMismatch {
                width,
                height,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
            filter: TextureFilter::default(),
        })
    }

    /// Decode an opaque image blob (PNG or JPEG) into RGBA8.
    pub fn decode(blob: &[u8]) -> Result<Self, AssetError> {
        if blob.is_empty() {
            return Err(AssetError::EmptyBlob);
        }
        let img = image::load_from_memory(blob)?.to_rgba8();
        let (width, height) = img.dimensions();
        tracing::debug!(width, height, "decoded texture blob");
        Self::from_rgba8(width, height, img.into_raw())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let blob = std::fs::read(path.as_ref())?;
        Self::decode(&blob)
    }

    /// Two-colour checkerboard, used when no texture blob is supplied.
    pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut rgba = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                rgba.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
            filter: TextureFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: TextureFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn filter(&self) -> TextureFilter {
        self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decode_png_blob() {
        let tex = Texture::decode(&png_bytes(4, 2)).unwrap();
        assert_eq!((tex.width(), tex.height()), (4, 2));
        assert_eq!(tex.rgba().len(), 4 * 2 * 4);
        assert_eq!(&tex.rgba()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn default_filter_is_linear_mag_nearest_min() {
        let tex = Texture::checkerboard(8, 2, [0; 4], [255; 4]);
        assert_eq!(tex.filter().mag, FilterMode::Linear);
        assert_eq!(tex.filter().min, FilterMode::Nearest);
    }

    #[test]
    fn garbage_blob_fails_to_decode() {
        let err = Texture::decode(b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn empty_blob_is_rejected() {
        assert!(matches!(Texture::decode(&[]), Err(AssetError::EmptyBlob)));
    }

    #[test]
    fn raw_length_is_checked() {
        let err = Texture::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, AssetError::LengthMismatch { actual: 15, .. }));
        assert!(matches!(
            Texture::from_rgba8(0, 2, vec![]),
            Err(AssetError::ZeroSize { .. })
        ));
    }

    #[test]
    fn checkerboard_alternates() {
        let tex = Texture::checkerboard(4, 2, [1, 1, 1, 1], [2, 2, 2, 2]);
        let px = |x: usize, y: usize| tex.rgba()[(y * 4 + x) * 4];
        assert_eq!(px(0, 0), 1);
        assert_eq!(px(2, 0), 2);
        assert_eq!(px(0, 2), 2);
        assert_eq!(px(3, 3), 1);
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), png_bytes(3, 3)).unwrap();
        let tex = Texture::from_file(tmp.path()).unwrap();
        assert_eq!(tex.width(), 3);
    }
}
