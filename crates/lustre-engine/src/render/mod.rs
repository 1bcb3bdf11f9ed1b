//! Graphics boundary and backends.
//!
//! Draw commands execute against the [`GraphicsContext`] trait. The CPU
//! [`QuadBatch`] implements it by accumulating triangles grouped by texture
//! and viewport; [`QuadRenderer`] uploads a finished batch through wgpu.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shader converts to NDC using a viewport uniform.

mod batch;
mod common;
mod context;
mod ctx;
mod quad;

pub use batch::{BatchVertex, DrawCall, QuadBatch};
pub use context::GraphicsContext;
pub use ctx::{RenderCtx, RenderTarget};
pub use quad::QuadRenderer;
