//! Scene (draw stream) types.
//!
//! Responsibilities:
//! - store renderer-agnostic draw commands captured during a script frame
//! - bucket them by (layer, sub-layer) and replay in deterministic order
//! - keep payload-specific helpers isolated per file under `scene::shapes`

mod cmd;
mod key;
mod queue;
mod state;

pub mod shapes;

pub use cmd::DrawCmd;
pub use key::LayerKey;
pub use queue::DrawQueue;
pub use shapes::quad::QuadCmd;
pub use shapes::text::{TextAlign, TextCmd};
pub use state::DrawState;
