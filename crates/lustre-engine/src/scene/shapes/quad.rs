use crate::coords::Vec2;
use crate::error::DrawError;
use crate::paint::TextureHandle;
use crate::render::GraphicsContext;
use crate::scene::{DrawCmd, DrawQueue};

/// Texture coordinates covering the whole texture, in fan order.
pub const FULL_UV: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Textured quad payload.
///
/// `texture: None` draws with the backend's white fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadCmd {
    pub texture: Option<TextureHandle>,
    /// Corners in viewport-relative logical pixels, fan order.
    pub positions: [Vec2; 4],
    pub texcoords: [Vec2; 4],
}

impl QuadCmd {
    #[inline]
    pub fn new(texture: Option<TextureHandle>, positions: [Vec2; 4], texcoords: [Vec2; 4]) -> Self {
        Self { texture, positions, texcoords }
    }

    /// Axis-aligned rectangle; `uv` is `(s1, t1, s2, t2)`.
    pub fn image(
        texture: Option<TextureHandle>,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        uv: Option<[f32; 4]>,
    ) -> Self {
        let positions = [
            Vec2::new(x, y),
            Vec2::new(x + w, y),
            Vec2::new(x + w, y + h),
            Vec2::new(x, y + h),
        ];
        let texcoords = match uv {
            Some([s1, t1, s2, t2]) => [
                Vec2::new(s1, t1),
                Vec2::new(s2, t1),
                Vec2::new(s2, t2),
                Vec2::new(s1, t2),
            ],
            None => FULL_UV,
        };
        Self::new(texture, positions, texcoords)
    }

    pub(crate) fn execute(&self, ctx: &mut dyn GraphicsContext) {
        ctx.bind_texture(self.texture.as_ref());
        ctx.draw_fan(&self.positions, &self.texcoords);
    }
}

impl DrawQueue {
    /// Records an axis-aligned image draw.
    #[inline]
    pub fn push_image(
        &mut self,
        texture: Option<TextureHandle>,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        uv: Option<[f32; 4]>,
    ) -> Result<(), DrawError> {
        self.append(DrawCmd::Quad(QuadCmd::image(texture, x, y, w, h, uv)))
    }

    /// Records an arbitrary quad.
    #[inline]
    pub fn push_quad(
        &mut self,
        texture: Option<TextureHandle>,
        positions: [Vec2; 4],
        texcoords: Option<[Vec2; 4]>,
    ) -> Result<(), DrawError> {
        self.append(DrawCmd::Quad(QuadCmd::new(texture, positions, texcoords.unwrap_or(FULL_UV))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_sub_rect_maps_corners() {
        let q = QuadCmd::image(None, 10.0, 20.0, 4.0, 2.0, Some([0.25, 0.5, 0.75, 1.0]));
        assert_eq!(q.positions[2], Vec2::new(14.0, 22.0));
        assert_eq!(q.texcoords, [
            Vec2::new(0.25, 0.5),
            Vec2::new(0.75, 0.5),
            Vec2::new(0.75, 1.0),
            Vec2::new(0.25, 1.0),
        ]);
    }
}
