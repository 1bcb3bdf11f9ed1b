//! Lustre engine crate.
//!
//! Runs a Lua main script once per frame against a deferred, layer-ordered
//! draw queue, and offloads background scripts to isolated worker threads.
//!
//! Layers, bottom-up:
//! - `paint`, `coords`: colors, style escapes, textures and geometry
//! - `scene`: the draw command model and the layer compositor
//! - `text`: fonts and the glyph-texture cache
//! - `render`, `device`: the graphics boundary and its wgpu backend
//! - `worker`: the isolated-interpreter task bridge
//! - `script`: the frame driver and every script-facing binding
//! - `window`, `core`, `input`, `time`: the winit runtime hosting it all

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod error;
pub mod render;
pub mod paint;
pub mod scene;
pub mod script;
pub mod text;
pub mod worker;

#[cfg(test)]
mod testing;

pub use error::{DrawError, FrameError};
pub use script::{DriverConfig, FrameDriver, FramePhase};
