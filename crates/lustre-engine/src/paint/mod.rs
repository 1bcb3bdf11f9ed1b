//! Paint model shared between the script bindings and the graphics backends.
//!
//! Scope:
//! - color representation (linear premultiplied alpha)
//! - inline style escapes carried by script strings
//! - CPU-side textures (decoded images, rasterized text)

pub mod color;
pub mod style;
pub mod texture;

pub use color::Color;
pub use texture::{ImageLoadError, Texture, TextureHandle, TextureId};
