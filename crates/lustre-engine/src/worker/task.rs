//! Worker thread body.
//!
//! A task owns a fresh interpreter for its whole life. Nothing but
//! `ScriptValue`s enters or leaves it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mlua::{HookTriggers, Lua, MultiValue, VmState};

use crate::script::console::{self, ConsoleEnv, HostFunction};

use super::value::{Marshaled, ScriptValue, marshal_values};

/// Task identifier, unique for the lifetime of a bridge.
pub type TaskId = u64;

/// Instructions between two checks of the abort flag.
const ABORT_CHECK_INTERVAL: u32 = 1000;

/// Everything a worker thread needs, moved into it at spawn.
pub(crate) struct TaskSpec {
    pub id: TaskId,
    pub source: Vec<u8>,
    pub exposed: Vec<HostFunction>,
    pub args: Vec<ScriptValue>,
    pub env: ConsoleEnv,
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The script returned; `results.error` is set when a result had an
    /// unsupported type.
    Returned(Marshaled),
    /// The script failed to compile or raised an error.
    Failed(String),
    /// The abort flag was observed before the script finished.
    Aborted,
}

/// Runs `spec` to completion on the current thread.
pub(crate) fn run(spec: TaskSpec, abort: Arc<AtomicBool>) -> TaskOutcome {
    let lua = Lua::new();
    let id = spec.id;

    let outcome = match call(&lua, spec, &abort) {
        Ok(values) => TaskOutcome::Returned(marshal_values(values)),
        Err(_) if abort.load(Ordering::Relaxed) => TaskOutcome::Aborted,
        Err(e) => TaskOutcome::Failed(e.to_string()),
    };
    log::debug!(target: crate::logging::WORKER_TARGET, "task {id} finished: {}", describe(&outcome));
    outcome
}

fn call(lua: &Lua, spec: TaskSpec, abort: &Arc<AtomicBool>) -> mlua::Result<MultiValue> {
    for f in &spec.exposed {
        console::install(lua, *f, &spec.env)?;
    }

    let flag = Arc::clone(abort);
    lua.set_hook(
        HookTriggers::new().every_nth_instruction(ABORT_CHECK_INTERVAL),
        move |_, _| {
            if flag.load(Ordering::Relaxed) {
                Err(mlua::Error::RuntimeError("task aborted".into()))
            } else {
                Ok(VmState::Continue)
            }
        },
    );

    let chunk = lua
        .load(spec.source.as_slice())
        .set_name(format!("=task{}", spec.id))
        .into_function()?;

    let args = spec
        .args
        .into_iter()
        .map(|v| v.into_lua(lua))
        .collect::<mlua::Result<MultiValue>>()?;

    chunk.call::<MultiValue>(args)
}

fn describe(outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::Returned(m) => format!("{} result(s)", m.values.len()),
        TaskOutcome::Failed(e) => format!("error: {e}"),
        TaskOutcome::Aborted => "aborted".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Instant;

    fn spec(source: &str, args: Vec<ScriptValue>) -> TaskSpec {
        TaskSpec {
            id: 7,
            source: source.as_bytes().to_vec(),
            exposed: vec![HostFunction::StripEscapes],
            args,
            env: ConsoleEnv {
                start: Instant::now(),
                script_dir: PathBuf::from("."),
                user_dir: PathBuf::from("."),
                log_target: crate::logging::WORKER_TARGET,
            },
        }
    }

    #[test]
    fn returns_marshaled_results() {
        let s = spec("local a, b = ... return a + b, StripEscapes('^2ok')", vec![
            ScriptValue::Integer(2),
            ScriptValue::Number(0.5),
        ]);
        let out = run(s, Arc::new(AtomicBool::new(false)));
        match out {
            TaskOutcome::Returned(m) => {
                assert_eq!(m.values, vec![ScriptValue::Number(2.5), ScriptValue::from("ok")]);
                assert_eq!(m.error, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn script_errors_become_failures() {
        let out = run(spec("error('boom')", vec![]), Arc::new(AtomicBool::new(false)));
        match out {
            TaskOutcome::Failed(msg) => assert!(msg.contains("boom"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
        let out = run(spec("return (", vec![]), Arc::new(AtomicBool::new(false)));
        assert!(matches!(out, TaskOutcome::Failed(_)));
    }

    #[test]
    fn unexposed_functions_are_missing() {
        let out = run(spec("return GetTime == nil, DrawImage == nil", vec![]), Arc::new(AtomicBool::new(false)));
        match out {
            TaskOutcome::Returned(m) => {
                assert_eq!(m.values, vec![ScriptValue::Boolean(true), ScriptValue::Boolean(true)])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn preset_abort_flag_stops_a_loop() {
        let out = run(spec("while true do end", vec![]), Arc::new(AtomicBool::new(true)));
        assert_eq!(out, TaskOutcome::Aborted);
    }
}
