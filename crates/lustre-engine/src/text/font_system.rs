use std::cell::Cell;
use std::collections::HashMap;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use thiserror::Error;

use super::raster::{CoverageBitmap, FontFace, TextExtent, TextRasterizer};

/// Largest bitmap edge `rasterize` will allocate.
const MAX_BITMAP_EDGE: u32 = 16_384;

/// Error returned by [`FontSystem::load_face`].
#[derive(Debug, Clone, Error)]
#[error("font load error: {0}")]
pub struct FontLoadError(pub String);

/// Owns the fonts behind each [`FontFace`] and rasterizes with fontdue.
///
/// A face without its own font falls back to any loaded font; with no fonts
/// at all, text measures as zero width and draws nothing.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
    faces: HashMap<FontFace, usize>,
    warned_missing: Cell<bool>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            faces: HashMap::new(),
            warned_missing: Cell::new(false),
        }
    }

    /// Parses a TrueType or OpenType font from raw bytes and binds it to `face`.
    pub fn load_face(&mut self, face: FontFace, bytes: &[u8]) -> Result<(), FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        self.faces.insert(face, self.fonts.len());
        self.fonts.push(font);
        Ok(())
    }

    #[inline]
    pub fn has_face(&self, face: FontFace) -> bool {
        self.faces.contains_key(&face)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    fn font(&self, face: FontFace) -> Option<&fontdue::Font> {
        let font = self
            .faces
            .get(&face)
            .and_then(|&i| self.fonts.get(i))
            .or_else(|| self.fonts.first());
        if font.is_none() && !self.warned_missing.replace(true) {
            log::warn!("FontSystem: no fonts loaded; text renders with zero size");
        }
        font
    }

    fn layout(font: &fontdue::Font, px: f32, text: &str) -> Layout<()> {
        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, px, 0));
        layout
    }

    fn line_height_of(font: &fontdue::Font, px: f32) -> f32 {
        font.horizontal_line_metrics(px)
            .map(|m| m.new_line_size)
            .unwrap_or(px)
            .ceil()
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRasterizer for FontSystem {
    fn line_height(&self, face: FontFace, px: f32) -> f32 {
        self.font(face).map_or(0.0, |f| Self::line_height_of(f, px))
    }

    fn measure(&self, face: FontFace, px: f32, text: &str) -> TextExtent {
        let Some(font) = self.font(face) else {
            return TextExtent::default();
        };
        let lines = text.split('\n').count() as f32;
        let height = lines * Self::line_height_of(font, px);

        let layout = Self::layout(font, px, text);

        // Pen position after each glyph rather than its bitmap edge, so
        // trailing spaces and italic overhangs count the way layout sees them.
        let width = layout
            .glyphs()
            .iter()
            .map(|g| {
                let m = font.metrics_indexed(g.key.glyph_index, px);
                (g.x - m.xmin as f32 + m.advance_width).max(0.0)
            })
            .fold(0.0f32, f32::max);

        TextExtent { width, height }
    }

    fn rasterize(&self, face: FontFace, px: f32, text: &str) -> Option<CoverageBitmap> {
        let font = self.font(face)?;
        let extent = self.measure(face, px, text);
        let width = extent.width.ceil() as u32;
        let height = extent.height.ceil() as u32;
        if width == 0 || height == 0 {
            return None;
        }
        if width > MAX_BITMAP_EDGE || height > MAX_BITMAP_EDGE {
            log::warn!("FontSystem: {width}x{height} text bitmap exceeds {MAX_BITMAP_EDGE} px; skipped");
            return None;
        }

        let mut coverage = vec![0u8; width as usize * height as usize];
        let layout = Self::layout(font, px, text);

        for g in layout.glyphs() {
            if !g.char_data.rasterize() || g.width == 0 || g.height == 0 {
                continue;
            }
            let (metrics, bitmap) = font.rasterize_config(g.key);
            let gx = g.x.round() as i64;
            let gy = g.y.round() as i64;

            for row in 0..metrics.height {
                let y = gy + row as i64;
                if y < 0 || y >= height as i64 {
                    continue;
                }
                for col in 0..metrics.width {
                    let x = gx + col as i64;
                    if x < 0 || x >= width as i64 {
                        continue;
                    }
                    let dst = &mut coverage[y as usize * width as usize + x as usize];
                    *dst = (*dst).max(bitmap[row * metrics.width + col]);
                }
            }
        }

        Some(CoverageBitmap { width, height, coverage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage_font_bytes() {
        let mut fs = FontSystem::new();
        assert!(fs.load_face(FontFace::Var, b"not a font").is_err());
        assert!(!fs.has_face(FontFace::Var));
    }

    #[test]
    fn no_fonts_means_zero_size_text() {
        let fs = FontSystem::new();
        assert_eq!(fs.measure(FontFace::Fixed, 16.0, "hello"), TextExtent::default());
        assert!(fs.rasterize(FontFace::Fixed, 16.0, "hello").is_none());
        assert_eq!(fs.line_height(FontFace::VarBold, 16.0), 0.0);
    }
}
