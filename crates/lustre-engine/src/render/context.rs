use crate::coords::{Rect, Vec2};
use crate::paint::{Color, TextureHandle};

/// Immediate-mode 2D context that draw commands execute against.
///
/// Coordinates are logical pixels relative to the current viewport; the
/// implementation applies the viewport offset and clips to it. Drawing with
/// no bound texture samples opaque white, so untextured quads take the draw
/// color.
pub trait GraphicsContext {
    /// Sets the viewport rectangle in absolute logical pixels.
    fn set_viewport(&mut self, rect: Rect);

    fn set_color(&mut self, color: Color);

    fn color(&self) -> Color;

    fn bind_texture(&mut self, texture: Option<&TextureHandle>);

    /// Draws a 4-vertex fan (`0-1-2`, `0-2-3`).
    fn draw_fan(&mut self, positions: &[Vec2; 4], texcoords: &[Vec2; 4]);
}
