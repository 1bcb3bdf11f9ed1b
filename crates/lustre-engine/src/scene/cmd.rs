use crate::coords::Rect;
use crate::paint::Color;
use crate::render::GraphicsContext;
use crate::scene::shapes::quad::QuadCmd;
use crate::scene::shapes::text::TextCmd;

/// Replayable draw command captured at issue time.
///
/// Extending the command set:
/// - add a payload module under `scene::shapes::*`
/// - add a new variant here and its arm in [`DrawCmd::execute`]
/// - implement push helpers inside that payload module
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Viewport rectangle in absolute logical pixels.
    SetViewport(Rect),
    SetColor(Color),
    Quad(QuadCmd),
    Text(TextCmd),
}

impl DrawCmd {
    pub fn execute(&self, ctx: &mut dyn GraphicsContext) {
        match self {
            DrawCmd::SetViewport(rect) => ctx.set_viewport(*rect),
            DrawCmd::SetColor(color) => ctx.set_color(*color),
            DrawCmd::Quad(quad) => quad.execute(ctx),
            DrawCmd::Text(text) => text.execute(ctx),
        }
    }

    /// Whether the command emits geometry (and therefore depends on the
    /// current draw color).
    #[inline]
    pub fn draws(&self) -> bool {
        matches!(self, DrawCmd::Quad(_) | DrawCmd::Text(_))
    }
}
