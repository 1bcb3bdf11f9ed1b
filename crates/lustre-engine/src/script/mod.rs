//! Main-interpreter scripting layer.
//!
//! Responsibilities:
//! - `FrameDriver`: owns the interpreter and runs the frame state machine
//! - `bindings`: the drawing, text, input and worker globals
//! - `console`: host functions also offered to worker tasks
//! - `events`: platform input to script key names and callbacks
//! - `image_handle`: the `NewImageHandle()` userdata

mod args;
mod bindings;
pub(crate) mod console;
mod driver;
mod events;
mod image_handle;

pub use bindings::TASK_FINISHED_CALLBACK;
pub use console::{ConsoleEnv, HostFunction};
pub use driver::{DriverConfig, FrameDriver, FramePhase};
pub use events::{InputTranslator, ScriptEvent, button_name, key_name};
pub use image_handle::ImageHandle;
