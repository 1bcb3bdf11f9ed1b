use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Vec2, Viewport};
use crate::paint::{Color, TextureHandle};

use super::GraphicsContext;

/// Vertex layout shared with `shaders/quad.wgsl` (32 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BatchVertex {
    /// Absolute logical pixels.
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    /// Premultiplied.
    pub color: [f32; 4],
}

impl BatchVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BatchVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Run of consecutive vertices sharing a texture and a clip rectangle.
#[derive(Debug, Clone)]
pub struct DrawCall {
    /// `None` draws with the white fallback texture.
    pub texture: Option<TextureHandle>,
    /// Absolute logical pixels, already clipped to the screen.
    pub clip: Rect,
    pub vertices: Range<u32>,
}

/// CPU-side [`GraphicsContext`] producing triangles for the GPU renderer.
///
/// Call [`begin`](Self::begin) once per frame before replaying commands.
#[derive(Debug, Default)]
pub struct QuadBatch {
    vertices: Vec<BatchVertex>,
    calls: Vec<DrawCall>,
    screen: Viewport,
    viewport: Rect,
    color: Color,
    texture: Option<TextureHandle>,
}

impl QuadBatch {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded geometry and resets viewport, color and texture.
    pub fn begin(&mut self, screen: Viewport) {
        self.vertices.clear();
        self.calls.clear();
        self.screen = screen;
        self.viewport = Rect::full(screen);
        self.color = Color::white();
        self.texture = None;
    }

    #[inline]
    pub fn screen(&self) -> Viewport {
        self.screen
    }

    #[inline]
    pub fn vertices(&self) -> &[BatchVertex] {
        &self.vertices
    }

    #[inline]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    fn same_texture(a: Option<&TextureHandle>, b: Option<&TextureHandle>) -> bool {
        a.map(|t| t.id()) == b.map(|t| t.id())
    }
}

impl GraphicsContext for QuadBatch {
    fn set_viewport(&mut self, rect: Rect) {
        self.viewport = rect;
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn color(&self) -> Color {
        self.color
    }

    fn bind_texture(&mut self, texture: Option<&TextureHandle>) {
        self.texture = texture.cloned();
    }

    fn draw_fan(&mut self, positions: &[Vec2; 4], texcoords: &[Vec2; 4]) {
        let clip = self.viewport.clipped_to(Rect::full(self.screen));
        if clip.is_empty() {
            return;
        }

        let color = self.color.to_array();
        let start = self.vertices.len() as u32;
        for i in [0usize, 1, 2, 0, 2, 3] {
            self.vertices.push(BatchVertex {
                pos: self.viewport.to_absolute(positions[i]).to_array(),
                uv: texcoords[i].to_array(),
                color,
            });
        }
        let end = self.vertices.len() as u32;

        match self.calls.last_mut() {
            Some(last)
                if last.clip == clip
                    && last.vertices.end == start
                    && Self::same_texture(last.texture.as_ref(), self.texture.as_ref()) =>
            {
                last.vertices.end = end;
            }
            _ => self.calls.push(DrawCall {
                texture: self.texture.clone(),
                clip,
                vertices: start..end,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Texture;
    use crate::scene::shapes::quad::FULL_UV;

    fn square(x: f32) -> [Vec2; 4] {
        [Vec2::new(x, 0.0), Vec2::new(x + 1.0, 0.0), Vec2::new(x + 1.0, 1.0), Vec2::new(x, 1.0)]
    }

    #[test]
    fn fans_become_two_triangles() {
        let mut b = QuadBatch::new();
        b.begin(Viewport::new(100.0, 100.0));
        b.draw_fan(&square(0.0), &FULL_UV);
        assert_eq!(b.vertices().len(), 6);
        let corners: Vec<[f32; 2]> = b.vertices().iter().map(|v| v.pos).collect();
        assert_eq!(corners[3], corners[0]);
        assert_eq!(corners[4], corners[2]);
    }

    #[test]
    fn groups_by_texture_and_viewport() {
        let tex = Texture::from_coverage(1, 1, &[255]).unwrap();
        let mut b = QuadBatch::new();
        b.begin(Viewport::new(100.0, 100.0));

        b.draw_fan(&square(0.0), &FULL_UV);
        b.draw_fan(&square(2.0), &FULL_UV);
        b.bind_texture(Some(&tex));
        b.draw_fan(&square(4.0), &FULL_UV);
        b.set_viewport(Rect::new(10.0, 10.0, 20.0, 20.0));
        b.draw_fan(&square(0.0), &FULL_UV);

        let calls = b.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].vertices, 0..12);
        assert!(calls[0].texture.is_none());
        assert_eq!(calls[1].texture.as_ref().map(|t| t.id()), Some(tex.id()));
        assert_eq!(calls[2].clip, Rect::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn viewport_offsets_positions() {
        let mut b = QuadBatch::new();
        b.begin(Viewport::new(100.0, 100.0));
        b.set_viewport(Rect::new(10.0, 20.0, 50.0, 50.0));
        b.draw_fan(&square(1.0), &FULL_UV);
        assert_eq!(b.vertices()[0].pos, [11.0, 20.0]);
    }

    #[test]
    fn offscreen_viewport_draws_nothing() {
        let mut b = QuadBatch::new();
        b.begin(Viewport::new(100.0, 100.0));
        b.set_viewport(Rect::new(200.0, 0.0, 10.0, 10.0));
        b.draw_fan(&square(0.0), &FULL_UV);
        assert!(b.vertices().is_empty());
    }

    #[test]
    fn vertices_carry_current_color() {
        let mut b = QuadBatch::new();
        b.begin(Viewport::new(10.0, 10.0));
        b.set_color(Color::from_straight(1.0, 0.0, 0.0, 0.5));
        b.draw_fan(&square(0.0), &FULL_UV);
        assert_eq!(b.vertices()[0].color, [0.5, 0.0, 0.0, 0.5]);
    }
}
