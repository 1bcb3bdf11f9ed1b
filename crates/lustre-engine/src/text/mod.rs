//! Text measurement, rasterization and the glyph-texture cache.
//!
//! Responsibilities:
//! - `FontSystem`: fontdue-backed fonts bound to script font faces
//! - `TextRasterizer`: the seam between the cache and any font backend
//! - `TextCache`: memoized string textures with a growing LRU ceiling

mod cache;
mod font_system;
mod raster;

pub use cache::{CacheStats, RenderedText, TextCache, TextCacheConfig, TextKey};
pub use font_system::{FontLoadError, FontSystem};
pub use raster::{CoverageBitmap, FontFace, TextExtent, TextRasterizer};
