use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::paint::style::{leading_color, strip_escapes_str};
use crate::paint::{Color, Texture, TextureHandle};

use super::raster::{FontFace, TextExtent, TextRasterizer};

/// Glyph-texture cache settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextCacheConfig {
    /// Starting cost ceiling (entries). Raised at runtime, never lowered.
    pub initial_ceiling: usize,
    /// Largest texture edge, in pixels, a string may rasterize to. Larger
    /// strings are cached as having nothing to draw.
    pub max_texture_size: u32,
}

impl Default for TextCacheConfig {
    fn default() -> Self {
        Self {
            initial_ceiling: 64,
            max_texture_size: wgpu::Limits::default().max_texture_dimension_2d,
        }
    }
}

/// Cache key: font, integer pixel size and escape-free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextKey {
    pub face: FontFace,
    pub px: u32,
    pub text: String,
}

/// Instrumentation counters.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub ceiling_raises: u64,
}

/// Result of [`TextCache::rasterize`].
///
/// `texture: None` means there is nothing to draw (empty text, or no font);
/// it is not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedText {
    pub texture: Option<TextureHandle>,
    pub width: f32,
    pub height: f32,
    /// Color selected by a leading style escape.
    pub color: Option<Color>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    texture: Option<TextureHandle>,
    extent: TextExtent,
}

/// Memoizes rasterized strings as shared textures.
///
/// Eviction is least-recently-used with one unit of cost per entry. The cost
/// ceiling follows the high-water mark of distinct strings drawn in a single
/// frame: whenever the current frame touches more distinct keys than the
/// ceiling allows, the ceiling is raised to that count. It never shrinks, so
/// a frame that draws many unique labels cannot thrash the cache on the next
/// one.
///
/// Evicting an entry only drops the cache's own reference; commands holding
/// the texture keep it alive until they are cleared.
pub struct TextCache {
    rasterizer: Box<dyn TextRasterizer>,
    entries: LruCache<TextKey, CacheEntry>,
    ceiling: NonZeroUsize,
    max_texture_size: u32,
    frame_keys: HashSet<TextKey>,
    stats: CacheStats,
}

impl TextCache {
    pub fn new(rasterizer: Box<dyn TextRasterizer>, config: TextCacheConfig) -> Self {
        let ceiling = NonZeroUsize::new(config.initial_ceiling).unwrap_or(NonZeroUsize::MIN);
        Self {
            rasterizer,
            entries: LruCache::new(ceiling),
            ceiling,
            max_texture_size: config.max_texture_size,
            frame_keys: HashSet::new(),
            stats: CacheStats::default(),
        }
    }

    /// Starts a new distinct-string window.
    pub fn begin_frame(&mut self) {
        self.frame_keys.clear();
    }

    #[inline]
    pub fn ceiling(&self) -> usize {
        self.ceiling.get()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn line_height(&self, face: FontFace, px: f32) -> f32 {
        self.rasterizer.line_height(face, px)
    }

    /// Returns the texture for `raw` (escapes allowed), rasterizing on miss.
    pub fn rasterize(&mut self, face: FontFace, px: f32, raw: &str) -> RenderedText {
        let color = leading_color(raw.as_bytes());
        let text = strip_escapes_str(raw);
        if text.is_empty() {
            return RenderedText { color, ..RenderedText::default() };
        }

        let key = TextKey { face, px: pixel_size(px), text: text.into_owned() };
        self.touch(&key);

        let entry = match self.entries.get(&key) {
            Some(entry) => {
                self.stats.hits += 1;
                entry.clone()
            }
            None => {
                self.stats.misses += 1;
                let entry = self.render(&key);
                if self.entries.push(key, entry.clone()).is_some() {
                    self.stats.evictions += 1;
                }
                entry
            }
        };

        RenderedText {
            texture: entry.texture,
            width: entry.extent.width,
            height: entry.extent.height,
            color,
        }
    }

    /// Measures `raw` without rasterizing. Cached extents are reused but
    /// their recency is left untouched.
    pub fn measure(&self, face: FontFace, px: f32, raw: &str) -> TextExtent {
        let text = strip_escapes_str(raw);
        if text.is_empty() {
            return TextExtent::default();
        }
        let key = TextKey { face, px: pixel_size(px), text: text.into_owned() };
        match self.entries.peek(&key) {
            Some(entry) => entry.extent,
            None => self.rasterizer.measure(face, key.px as f32, &key.text),
        }
    }

    /// 1-based byte index into the escape-free text of the character under
    /// `(x, y)`, relative to the text's top-left corner. Points past the end
    /// of a line map to the position after its last character.
    pub fn cursor_index(&self, face: FontFace, px: f32, raw: &str, x: f32, y: f32) -> usize {
        let text = strip_escapes_str(raw);
        let px = pixel_size(px) as f32;
        let line_height = self.rasterizer.line_height(face, px).max(1.0);
        let lines: Vec<&str> = text.split('\n').collect();
        let line_no = ((y / line_height).floor().max(0.0) as usize).min(lines.len() - 1);

        let line_start: usize = lines[..line_no].iter().map(|l| l.len() + 1).sum();
        let line = lines[line_no];

        let mut prev_width = 0.0;
        for (offset, ch) in line.char_indices() {
            let end = offset + ch.len_utf8();
            let width = self.rasterizer.measure(face, px, &line[..end]).width;
            if x < (prev_width + width) / 2.0 {
                return line_start + offset + 1;
            }
            prev_width = width;
        }
        line_start + line.len() + 1
    }

    fn touch(&mut self, key: &TextKey) {
        if self.frame_keys.contains(key) {
            return;
        }
        self.frame_keys.insert(key.clone());

        if self.frame_keys.len() > self.ceiling.get() {
            if let Some(raised) = NonZeroUsize::new(self.frame_keys.len()) {
                log::debug!(
                    "TextCache: raising ceiling {} -> {} distinct strings",
                    self.ceiling,
                    raised
                );
                self.ceiling = raised;
                self.entries.resize(raised);
                self.stats.ceiling_raises += 1;
            }
        }
    }

    fn render(&self, key: &TextKey) -> CacheEntry {
        let px = key.px as f32;
        let extent = self.rasterizer.measure(key.face, px, &key.text);
        let limit = self.max_texture_size as f32;
        if extent.width.ceil() > limit || extent.height.ceil() > limit {
            log::warn!(
                "TextCache: {:.0}x{:.0} text at {}px exceeds the {} px texture limit; not drawn",
                extent.width,
                extent.height,
                key.px,
                self.max_texture_size
            );
            return CacheEntry { texture: None, extent: TextExtent::default() };
        }
        let texture = self
            .rasterizer
            .rasterize(key.face, px, &key.text)
            .and_then(|bmp| Texture::from_coverage(bmp.width, bmp.height, &bmp.coverage));
        CacheEntry { texture, extent }
    }
}

#[inline]
fn pixel_size(px: f32) -> u32 {
    if px.is_finite() { px.round().max(0.0) as u32 } else { 0 }
}
