//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single application window, and wires
//! them to the GPU layer and the input subsystem.

mod runtime;
mod translate;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
