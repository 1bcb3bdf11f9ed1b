//! Coordinate and geometry types shared by the draw queue and the backends.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! Script coordinates are relative to the current viewport rectangle; the
//! batch converts them to absolute logical pixels, and shaders convert those
//! to NDC using a viewport uniform.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
