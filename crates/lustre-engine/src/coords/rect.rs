use super::{Vec2, Viewport};

/// Axis-aligned rectangle in logical pixels (top-left origin).
///
/// Used for script viewports: draw coordinates are offset by `origin` and
/// clipped to the rectangle.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// The whole screen.
    #[inline]
    pub const fn full(screen: Viewport) -> Self {
        Self::new(0.0, 0.0, screen.width, screen.height)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Maps a point relative to this rectangle to absolute coordinates.
    #[inline]
    pub fn to_absolute(self, p: Vec2) -> Vec2 {
        self.origin + p
    }

    /// Intersection, or a zero-size rectangle at the overlap corner when the
    /// two do not overlap.
    #[inline]
    pub fn clipped_to(self, other: Rect) -> Rect {
        let x0 = self.origin.x.max(other.origin.x);
        let y0 = self.origin.y.max(other.origin.y);
        let x1 = self.max().x.min(other.max().x);
        let y1 = self.max().y.min(other.max().y);
        Rect::new(x0, y0, (x1 - x0).max(0.0), (y1 - y0).max(0.0))
    }
}
