//! Window surface and GPU device.
//!
//! [`Gpu`] opens the device for one window, keeps its surface configured
//! across resizes and hands out one [`GpuFrame`] per redraw.

mod gpu;
mod options;

pub use gpu::{Gpu, GpuError, GpuFrame};
pub use options::GpuOptions;
