//! Core engine-facing contracts.
//!
//! This module defines the interface between the window runtime and the
//! host application, and the per-frame context the host renders through.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
