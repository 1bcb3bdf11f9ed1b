use crate::coords::Vec2;
use crate::error::DrawError;
use crate::paint::Color;
use crate::render::GraphicsContext;
use crate::scene::{DrawCmd, DrawQueue};
use crate::text::RenderedText;

use super::quad::{QuadCmd, FULL_UV};

/// Horizontal anchoring of a text draw.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TextAlign {
    /// `x` is the left edge.
    #[default]
    Left,
    /// Centered on the screen, shifted by `x`.
    Center,
    /// Right edge `x` pixels from the right side of the screen.
    Right,
    /// `x` is the horizontal center.
    CenterX,
    /// `x` is the right edge.
    RightX,
}

impl TextAlign {
    /// Parses the script-facing alignment name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "LEFT" => Some(Self::Left),
            "CENTER" => Some(Self::Center),
            "RIGHT" => Some(Self::Right),
            "CENTER_X" => Some(Self::CenterX),
            "RIGHT_X" => Some(Self::RightX),
            _ => None,
        }
    }

    /// Left edge for a string of `width` anchored at `x`.
    pub fn left_edge(self, x: f32, width: f32, screen_width: f32) -> f32 {
        match self {
            Self::Left => x,
            Self::Center => ((screen_width - width) / 2.0 + x).floor(),
            Self::Right => (screen_width - width - x).floor(),
            Self::CenterX => (x - width / 2.0).floor(),
            Self::RightX => (x - width).floor(),
        }
    }
}

/// Text draw payload: a quad over a cache-resident texture plus an optional
/// color override from a leading style escape.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCmd {
    pub quad: QuadCmd,
    /// Replaces the current draw color for this quad only.
    pub color: Option<Color>,
}

impl TextCmd {
    /// Places `text` with its top-left corner at `origin`.
    ///
    /// Returns `None` for zero-area text.
    pub fn new(text: &RenderedText, origin: Vec2) -> Option<Self> {
        let texture = text.texture.clone()?;
        let w = texture.width() as f32;
        let h = texture.height() as f32;
        let positions = [
            origin,
            Vec2::new(origin.x + w, origin.y),
            Vec2::new(origin.x + w, origin.y + h),
            Vec2::new(origin.x, origin.y + h),
        ];
        Some(Self {
            quad: QuadCmd::new(Some(texture), positions, FULL_UV),
            color: text.color,
        })
    }

    pub(crate) fn execute(&self, ctx: &mut dyn GraphicsContext) {
        match self.color {
            Some(color) => {
                let saved = ctx.color();
                ctx.set_color(color);
                self.quad.execute(ctx);
                ctx.set_color(saved);
            }
            None => self.quad.execute(ctx),
        }
    }
}

impl DrawQueue {
    /// Records a text draw. Zero-area text records nothing but still requires
    /// an open frame.
    pub fn push_text(&mut self, text: &RenderedText, origin: Vec2) -> Result<(), DrawError> {
        self.ensure_recording()?;
        match TextCmd::new(text, origin) {
            Some(cmd) => self.append(DrawCmd::Text(cmd)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Texture;
    use crate::testing::{RecordedOp, RecordingContext};

    fn rendered(w: u32, h: u32, color: Option<Color>) -> RenderedText {
        RenderedText {
            texture: Texture::from_coverage(w, h, &vec![255; (w * h) as usize]),
            width: w as f32,
            height: h as f32,
            color,
        }
    }

    #[test]
    fn alignment_formulas() {
        let sw = 800.0;
        assert_eq!(TextAlign::Left.left_edge(10.5, 100.0, sw), 10.5);
        assert_eq!(TextAlign::Center.left_edge(10.0, 100.0, sw), 360.0);
        assert_eq!(TextAlign::Right.left_edge(10.0, 100.0, sw), 690.0);
        assert_eq!(TextAlign::CenterX.left_edge(100.0, 31.0, sw), 84.0);
        assert_eq!(TextAlign::RightX.left_edge(100.0, 30.5, sw), 69.0);
    }

    #[test]
    fn parses_names() {
        assert_eq!(TextAlign::from_name("CENTER_X"), Some(TextAlign::CenterX));
        assert_eq!(TextAlign::from_name("center"), None);
    }

    #[test]
    fn leading_color_applies_to_quad_only() {
        let red = Color::from_rgb([1.0, 0.0, 0.0]);
        let cmd = TextCmd::new(&rendered(4, 2, Some(red)), Vec2::new(1.0, 1.0)).unwrap();

        let mut ctx = RecordingContext::default();
        ctx.set_color(Color::black());
        cmd.execute(&mut ctx);

        assert_eq!(ctx.fan_colors(), vec![red]);
        assert_eq!(ctx.color(), Color::black());
    }

    #[test]
    fn empty_text_records_nothing() {
        let mut q = DrawQueue::new();
        let empty = RenderedText::default();
        assert_eq!(q.push_text(&empty, Vec2::zero()), Err(DrawError::OutsideFrame));

        q.begin_frame();
        q.push_text(&empty, Vec2::zero()).unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn quad_matches_texture_size() {
        let cmd = TextCmd::new(&rendered(7, 3, None), Vec2::new(2.0, 5.0)).unwrap();
        assert_eq!(cmd.quad.positions[2], Vec2::new(9.0, 8.0));
        let mut ctx = RecordingContext::default();
        cmd.execute(&mut ctx);
        assert!(matches!(ctx.ops.last(), Some(RecordedOp::Fan { .. })));
    }
}
