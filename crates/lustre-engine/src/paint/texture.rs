use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Process-unique texture identity.
///
/// GPU backends key their uploaded copies by this id; the CPU pixels are never
/// mutated after creation, so an id always names the same image.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Error returned by [`Texture::load`].
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to read image {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {} has zero area", path.display())]
    Empty { path: PathBuf },
}

/// CPU-side RGBA8 image in premultiplied alpha.
#[derive(Debug, PartialEq)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Shared, reference-counted texture.
///
/// Draw commands hold clones of this handle, so a texture outlives every
/// command that still refers to it regardless of cache eviction.
pub type TextureHandle = Rc<Texture>;

impl Texture {
    /// Wraps premultiplied RGBA8 pixels. Returns `None` for zero-area or
    /// mis-sized input.
    pub fn from_rgba_premul(width: u32, height: u32, pixels: Vec<u8>) -> Option<TextureHandle> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Rc::new(Self { id: TextureId::next(), width, height, pixels }))
    }

    /// Builds a white texture whose alpha is the given coverage mask.
    ///
    /// Text is tinted by the draw color at replay, so glyph bitmaps carry
    /// coverage only.
    pub fn from_coverage(width: u32, height: u32, coverage: &[u8]) -> Option<TextureHandle> {
        if coverage.len() != width as usize * height as usize {
            return None;
        }
        let pixels = coverage.iter().flat_map(|&c| [c, c, c, c]).collect();
        Self::from_rgba_premul(width, height, pixels)
    }

    /// Decodes an image file and premultiplies it.
    pub fn load(path: &Path) -> Result<TextureHandle, ImageLoadError> {
        let bytes = std::fs::read(path).map_err(|source| ImageLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut pixels = rgba.into_raw();
        for px in pixels.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * a + 127) / 255) as u8;
            }
        }

        Self::from_rgba_premul(width, height, pixels).ok_or_else(|| ImageLoadError::Empty {
            path: path.to_path_buf(),
        })
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Texture::from_coverage(1, 1, &[255]).unwrap();
        let b = Texture::from_coverage(1, 1, &[255]).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn coverage_expands_to_premultiplied_white() {
        let t = Texture::from_coverage(2, 1, &[0, 128]).unwrap();
        assert_eq!(t.pixels(), &[0, 0, 0, 0, 128, 128, 128, 128]);
    }

    #[test]
    fn zero_area_is_rejected() {
        assert!(Texture::from_coverage(0, 4, &[]).is_none());
        assert!(Texture::from_rgba_premul(2, 2, vec![0; 3]).is_none());
    }

    #[test]
    fn loads_and_premultiplies_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.png");
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 128]));
        img.save(&path).unwrap();

        let t = Texture::load(&path).unwrap();
        assert_eq!((t.width(), t.height()), (3, 2));
        assert_eq!(&t.pixels()[..4], &[128, 0, 0, 128]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Texture::load(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, ImageLoadError::Io { .. }));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(matches!(Texture::load(&path).unwrap_err(), ImageLoadError::Decode { .. }));
    }
}
