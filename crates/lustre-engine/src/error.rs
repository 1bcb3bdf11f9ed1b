//! Error types shared across the draw queue and the frame driver.
//!
//! Errors local to one subsystem live next to it (`FontLoadError` in `text`,
//! `ImageLoadError` in `paint`, `MarshalError` in `worker`).

use thiserror::Error;

/// Failure of a script-facing drawing call.
///
/// Script bindings prefix the message with the call name, producing e.g.
/// `DrawImage() called outside of OnFrame`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrawError {
    /// Drawing call issued while no frame is being recorded.
    #[error("called outside of OnFrame")]
    OutsideFrame,

    /// Wrong argument count or type.
    #[error("{0}")]
    Usage(String),
}

/// Failure surfaced by the frame driver to the host.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The launch script failed to load or run.
    #[error("failed to run {name}")]
    Launch {
        name: String,
        #[source]
        source: mlua::Error,
    },

    /// A main-object callback (`OnFrame`, `OnKeyDown`, ...) raised an error.
    #[error("{callback} failed: {source}")]
    Callback {
        callback: String,
        #[source]
        source: mlua::Error,
    },

    /// Interpreter setup failed (binding registration, registry access).
    #[error("script host error")]
    Host(#[from] mlua::Error),
}
