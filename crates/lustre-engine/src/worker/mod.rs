//! Worker bridge: scripts offloaded to threads with isolated interpreters.
//!
//! Responsibilities:
//! - `ScriptValue`: the value set allowed across the isolation boundary
//! - `task`: the worker thread body (fresh interpreter, abort hook)
//! - `WorkerBridge`: launch, status, abort and in-order collection

mod bridge;
mod task;
mod value;

pub use bridge::{Completion, LaunchSpec, WorkerBridge};
pub use task::{TaskId, TaskOutcome};
pub use value::{MarshalError, Marshaled, ScriptValue, marshal_values};
